//! HTTP error handling and response types.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::engine::EngineError;
use crate::users::UserError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    Engine(EngineError),
    User(UserError),
    Auth(AuthError),
    /// Route-level miss (bad id in path, unknown endpoint)
    NotFound(String),
    /// Body could not be read as JSON
    BadRequest(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, String) {
        match self {
            AppError::Engine(e) => {
                let status = match e {
                    EngineError::RoomNotFound(_) | EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                    EngineError::RoomNameTaken(_) => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.reason().to_ascii_uppercase())
            }
            AppError::User(e) => match e {
                UserError::AlreadyExists(_) => (StatusCode::CONFLICT, "USER_EXISTS".into()),
                UserError::NotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND".into()),
                UserError::PasswordTooShort(_) => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT".into()),
                UserError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD".into()),
                UserError::LimitExceeded(_) => (StatusCode::BAD_REQUEST, "LIMIT_EXCEEDED".into()),
                UserError::RegistrationClosed => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED".into()),
                UserError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR".into()),
            },
            AppError::Auth(e) => match e {
                AuthError::TokenGeneration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR".into())
                }
                AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED".into()),
                _ => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED".into()),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND".into()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST".into()),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Engine(e) => e.fmt(f),
            AppError::User(e) => e.fmt(f),
            AppError::Auth(e) => e.fmt(f),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => f.write_str(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            tracing::error!(%status, "request failed: {self}");
        } else {
            tracing::debug!(%status, code = %code, "request rejected: {self}");
        }
        (status, Json(ApiError::new(code, self.to_string()))).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        AppError::User(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
