// Session storage backends

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::debug;

use crate::session::{SessionError, SessionId};

const DEFAULT_TTL: Duration = Duration::from_secs(7200);

/// Key/value storage scoped per session
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError>;

    async fn insert(&self, id: &SessionId, key: &str, value: &str) -> Result<(), SessionError>;

    async fn remove(&self, id: &SessionId, key: &str) -> Result<(), SessionError>;

    /// Move everything held under `from` to `to`; `from` holds nothing afterwards
    async fn rotate(&self, from: &SessionId, to: &SessionId) -> Result<(), SessionError>;
}

/// In-process store, lost on restart
///
/// Sessions idle for longer than the ttl are dropped when read, and swept
/// whenever a value is written.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, MemorySession>>>,
    ttl: Duration,
}

#[derive(Debug)]
struct MemorySession {
    data: HashMap<String, String>,
    last_access: Instant,
}

impl MemorySession {
    fn new(now: Instant) -> Self {
        Self {
            data: HashMap::new(),
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_access) >= ttl
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| !session.is_expired(now, self.ttl))
            .count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if sessions.get(id).is_some_and(|session| session.is_expired(now, self.ttl)) {
            debug!("Session expired after {:?} idle", self.ttl);
            sessions.remove(id);
            return Ok(None);
        }

        Ok(sessions.get_mut(id).and_then(|session| {
            session.last_access = now;
            session.data.get(key).cloned()
        }))
    }

    async fn insert(&self, id: &SessionId, key: &str, value: &str) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));

        let session = sessions.entry(*id).or_insert_with(|| MemorySession::new(now));
        session.last_access = now;
        session.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, id: &SessionId, key: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.data.remove(key);
            if session.data.is_empty() {
                sessions.remove(id);
            }
        }
        Ok(())
    }

    async fn rotate(&self, from: &SessionId, to: &SessionId) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(mut session) = sessions.remove(from) {
            if !session.is_expired(now, self.ttl) {
                session.last_access = now;
                sessions.insert(*to, session);
            }
        }
        Ok(())
    }
}

/// Redis-backed store: one hash per session with a sliding expiry
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        debug!("Connected to redis session store");
        Ok(Self { connection, ttl })
    }

    fn key(id: &SessionId) -> String {
        format!("storefront:session:{}", id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let mut connection = self.connection.clone();
        let (value,): (Option<String>,) = redis::pipe()
            .cmd("HGET")
            .arg(Self::key(id))
            .arg(key)
            .cmd("EXPIRE")
            .arg(Self::key(id))
            .arg(self.ttl.as_secs())
            .ignore()
            .query_async(&mut connection)
            .await?;
        Ok(value)
    }

    async fn insert(&self, id: &SessionId, key: &str, value: &str) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();
        redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(Self::key(id))
            .arg(key)
            .arg(value)
            .ignore()
            .cmd("EXPIRE")
            .arg(Self::key(id))
            .arg(self.ttl.as_secs())
            .ignore()
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &SessionId, key: &str) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();
        redis::cmd("HDEL")
            .arg(Self::key(id))
            .arg(key)
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }

    async fn rotate(&self, from: &SessionId, to: &SessionId) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(Self::key(from))
            .query_async(&mut connection)
            .await?;

        // RENAME fails on a missing key; an empty session has nothing to move
        if !exists {
            return Ok(());
        }

        redis::pipe()
            .atomic()
            .cmd("RENAME")
            .arg(Self::key(from))
            .arg(Self::key(to))
            .ignore()
            .cmd("EXPIRE")
            .arg(Self::key(to))
            .arg(self.ttl.as_secs())
            .ignore()
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }
}
