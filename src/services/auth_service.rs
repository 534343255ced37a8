use subtle::ConstantTimeEq;

use crate::config::{Config, TOKEN_TTL_SECS};
use crate::dto::auth_dto::{LoginPayload, LoginResponse};
use crate::error::{Error, Result};
use crate::services::user_service::UserService;
use crate::utils::crypto::{burn_verification, verify_password};
use crate::utils::token::{issue_token, verify_token, Claims};

/// Operator login and the two request authentication schemes.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    jwt_secret: Option<String>,
    api_key: Option<String>,
}

impl AuthService {
    pub fn new(users: UserService, config: &Config) -> Self {
        Self {
            users,
            jwt_secret: config.jwt_secret.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn jwt_secret(&self) -> Result<&str> {
        self.jwt_secret
            .as_deref()
            .ok_or_else(|| Error::ServerConfiguration("JWT_SECRET is not set".to_string()))
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn login(&self, payload: &LoginPayload) -> Result<LoginResponse> {
        let secret = self.jwt_secret()?;

        let Some(user) = self.users.find_by_username(&payload.username).await? else {
            burn_verification(&payload.password);
            tracing::info!("login rejected");
            return Err(Error::InvalidCredentials);
        };

        let valid = verify_password(&payload.password, &user.password_hash).map_err(|e| {
            Error::Internal(format!("stored hash for user {} is unreadable: {}", user.id, e))
        })?;
        if !valid {
            tracing::info!("login rejected");
            return Err(Error::InvalidCredentials);
        }

        let token = issue_token(user.id, secret)?;
        tracing::info!(user_id = user.id, "operator logged in");
        Ok(LoginResponse {
            token,
            expires_in: TOKEN_TTL_SECS,
        })
    }

    /// Validates an `Authorization` header value of the form `Bearer <token>`.
    pub fn authenticate_bearer(&self, authorization: Option<&str>) -> Result<Claims> {
        let secret = self.jwt_secret()?;
        let header = authorization
            .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))?;
        verify_token(token, secret)
    }

    pub fn verify_api_key(&self, provided: Option<&str>) -> Result<()> {
        let expected = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ServerConfiguration("API_KEY is not set".to_string()))?;
        let Some(provided) = provided else {
            return Err(Error::Unauthorized("Unauthorized: Invalid API Key".to_string()));
        };
        if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
            Ok(())
        } else {
            Err(Error::Unauthorized("Unauthorized: Invalid API Key".to_string()))
        }
    }
}
