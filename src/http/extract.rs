use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::{bearer_token, AuthError};
use crate::users::UserInfo;

use super::error::AppError;
use super::state::AppState;

/// The caller, proven by a valid bearer token. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        Ok(AuthUser(state.authenticate(token)?))
    }
}

/// Bearer token from the `Authorization` header, if one was sent.
pub fn request_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
}
