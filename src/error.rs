use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server configuration error: {0}")]
    ServerConfiguration(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::ValidationErrors(_)
            | Error::Json(_)
            | Error::InvalidReference(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::Config(_)
            | Error::ServerConfiguration(_)
            | Error::Database(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Server-side failures never leak detail.
    fn public_message(&self) -> String {
        match self {
            Error::Validation(msg)
            | Error::InvalidReference(msg)
            | Error::Unauthorized(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg) => msg.clone(),
            Error::ValidationErrors(err) => err.to_string(),
            Error::Json(err) => format!("Malformed JSON: {}", err),
            Error::InvalidCredentials => "Invalid credentials".to_string(),
            Error::RateLimited => "rate_limit_exceeded".to_string(),
            Error::Config(_) | Error::ServerConfiguration(_) => {
                "Server is not configured correctly".to_string()
            }
            Error::Database(_) | Error::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = Json(json!({ "status": "error", "message": self.public_message() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                let constraint = db_err.constraint().unwrap_or("a related field");
                Error::InvalidReference(format!(
                    "The id provided for '{}' is not valid or does not exist",
                    constraint
                ))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("a unique field");
                Error::Conflict(format!("A record already exists for '{}'", constraint))
            }
            other => Error::Database(other),
        }
    }
}
