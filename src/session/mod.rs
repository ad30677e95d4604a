// Server-side sessions addressed by a browser cookie
// Provides the session stores, the cookie layer and the per-role token store

pub mod layer;
pub mod store;
pub mod tokens;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

pub use layer::ensure_session;
pub use store::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use tokens::TokenStore;

/// Session storage errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("session layer is not installed on this route")]
    Missing,
}

/// Identifier carried in the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cookie value; anything that is not a UUID starts a new session
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The request's session id, shared between the cookie layer and the handlers
///
/// A successful login swaps in a fresh id; the layer then re-issues the cookie.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    current: Arc<Mutex<SessionId>>,
}

impl SessionHandle {
    pub fn new(id: SessionId) -> Self {
        Self {
            current: Arc::new(Mutex::new(id)),
        }
    }

    pub fn id(&self) -> SessionId {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, id: SessionId) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }
}
