use std::sync::Arc;

use ulid::Ulid;

use crate::auth::{AuthError, Authenticator};
use crate::engine::Engine;
use crate::users::{UserInfo, UserStore};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub users: Arc<UserStore>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, users: Arc<UserStore>, auth: Arc<Authenticator>) -> Self {
        Self { engine, users, auth }
    }

    /// Resolve a bearer token to a user that still exists.
    pub fn authenticate(&self, token: &str) -> Result<UserInfo, AuthError> {
        let claims = self.auth.verify(token)?;
        Ulid::from_string(&claims.sub)
            .ok()
            .and_then(|id| self.users.get(&id))
            .ok_or_else(|| AuthError::InvalidToken("user no longer exists".into()))
    }
}
