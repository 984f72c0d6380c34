//! The auth boundary: who is signed in, and how sessions start and end.
//!
//! Handlers never look at session tokens themselves. The session middleware in
//! [`super::auth`] resolves the `session` cookie through the [`SessionProvider`]
//! held in the app state and attaches the [`User`] to the request, where the
//! extractors below pick it up.

use axum::http::request::Parts;

use crate::db::token::{LoginToken, SessionToken};
use crate::prelude::*;

/// Source of truth for sessions, injected into [`crate::app::AppState`].
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// The user a session token belongs to, if the session is still valid.
    async fn current_user(&self, token: &str) -> Result<Option<User>>;

    /// Exchange a single-use login token for a new session token.
    async fn sign_in(&self, login_token: &str) -> Result<Option<String>>;

    /// End a session.
    async fn sign_out(&self, token: &str) -> Result<()>;
}

/// Sessions stored in the app database.
pub struct DbSessionProvider {
    db: Db,
}

impl DbSessionProvider {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl SessionProvider for DbSessionProvider {
    async fn current_user(&self, token: &str) -> Result<Option<User>> {
        User::lookup_by_session_token(&self.db, token).await
    }

    async fn sign_in(&self, login_token: &str) -> Result<Option<String>> {
        let Some(user_id) = LoginToken::redeem(&self.db, login_token).await? else {
            return Ok(None);
        };
        let token = SessionToken::create(&self.db, user_id).await?;
        tracing::info!(%user_id, "signed in");
        Ok(Some(token))
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        SessionToken::delete(&self.db, token).await
    }
}

/// Enable extracting an `Option<User>` in a handler.
impl<S: Send + Sync> axum::extract::OptionalFromRequestParts<S> for User {
    type Rejection = Infallible;
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<User>().cloned())
    }
}
