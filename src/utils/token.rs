use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_TTL_SECS;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user_id: i32, secret: &str) -> Result<String> {
    issue_token_at(user_id, secret, Utc::now())
}

pub fn issue_token_at(user_id: i32, secret: &str, issued_at: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        user_id,
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
}

/// Checks signature and expiry (no leeway) and returns the embedded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        Error::Unauthorized("invalid_token".to_string())
    })
}
