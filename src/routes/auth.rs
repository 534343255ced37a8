use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse},
    error::Result,
    utils::validation::ApiJson,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session token issued", body = Json<LoginResponse>),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.login(&payload).await?;
    Ok(Json(response))
}
