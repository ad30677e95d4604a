// Per-role bearer tokens held in the session

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::auth::models::Role;
use crate::auth::token::BearerToken;
use crate::error::ApiError;
use crate::session::{SessionError, SessionHandle, SessionId, SessionStore};
use crate::views::AuthState;
use crate::AppState;

/// The browser session's token store
///
/// Each role has its own key, so writing or clearing one role never touches the other.
#[derive(Clone)]
pub struct TokenStore {
    session: SessionHandle,
    store: Arc<dyn SessionStore>,
}

impl TokenStore {
    pub fn new(id: SessionId, store: Arc<dyn SessionStore>) -> Self {
        Self {
            session: SessionHandle::new(id),
            store,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Move the session's tokens to a fresh id
    ///
    /// Runs after every successful login, so an id fixed by someone else before
    /// authentication never holds a token.
    pub async fn rotate(&self) -> Result<SessionId, SessionError> {
        let fresh = SessionId::generate();
        self.store.rotate(&self.session_id(), &fresh).await?;
        self.session.replace(fresh);
        debug!("Rotated session id");
        Ok(fresh)
    }

    /// Token currently held for a role
    pub async fn token(&self, role: Role) -> Result<Option<BearerToken>, SessionError> {
        let value = self.store.get(&self.session_id(), role.session_key()).await?;
        Ok(value.and_then(BearerToken::from_stored))
    }

    /// Store a role's token, replacing any previous one for that role
    pub async fn store(&self, role: Role, token: &BearerToken) -> Result<(), SessionError> {
        debug!("Storing {} token in session", role);
        self.store
            .insert(&self.session_id(), role.session_key(), token.expose())
            .await
    }

    /// Forget a role's token
    pub async fn clear(&self, role: Role) -> Result<(), SessionError> {
        debug!("Clearing {} token from session", role);
        self.store.remove(&self.session_id(), role.session_key()).await
    }

    /// Which roles are logged in
    pub async fn auth_state(&self) -> Result<AuthState, SessionError> {
        Ok(AuthState {
            user: self.token(Role::User).await?.is_some(),
            entrepreneur: self.token(Role::Entrepreneur).await?.is_some(),
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TokenStore {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(SessionError::Missing)?;

        Ok(TokenStore {
            session,
            store: state.sessions.clone(),
        })
    }
}
