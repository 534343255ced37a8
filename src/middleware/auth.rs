use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{error::Result, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Who made the request. Copied onto the response so the request logger can
/// read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthContext {
    Bot,
    Operator { user_id: i32 },
}

impl AuthContext {
    pub fn user_id(&self) -> Option<i32> {
        match self {
            AuthContext::Operator { user_id } => Some(*user_id),
            AuthContext::Bot => None,
        }
    }
}

/// The authenticated operator, available to handlers as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = state.auth_service.authenticate_bearer(header)?;

    let context = AuthContext::Operator {
        user_id: claims.user_id,
    };
    req.extensions_mut().insert(CurrentUser { id: claims.user_id });

    let mut response = next.run(req).await;
    response.extensions_mut().insert(context);
    Ok(response)
}

pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    state.auth_service.verify_api_key(provided)?;

    let mut response = next.run(req).await;
    response.extensions_mut().insert(AuthContext::Bot);
    Ok(response)
}
