//! Session table and expiry sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::ServerError;
use crate::hal::Hal;
use crate::protocol::handshake::ClientCapabilities;
use crate::session::{Session, SessionState, SessionStats};

pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    max_sessions: usize,
    default_timeout: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize, default_timeout_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            default_timeout: Duration::from_secs(default_timeout_secs),
        }
    }

    /// Creates a session with a supplied id (validated as UUIDv4) or
    /// generates a fresh one when `id` is `None`.
    pub async fn create(&self, hal: &dyn Hal, id: Option<&str>) -> Result<Arc<Session>, ServerError> {
        let session_id = match id {
            Some(raw) => {
                let parsed = Uuid::parse_str(raw)
                    .map_err(|_| ServerError::InvalidSessionId(raw.to_string()))?;
                if parsed.get_version_num() != 4 {
                    return Err(ServerError::InvalidSessionId(raw.to_string()));
                }
                parsed
            }
            None => Uuid::new_v4(),
        };

        let now = hal.now();
        let expires_at = now + self.default_timeout;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(ServerError::SessionExists(session_id.to_string()));
        }
        if sessions.len() >= self.max_sessions {
            return Err(ServerError::SessionTableFull(self.max_sessions));
        }

        let session = Arc::new(Session {
            session_id,
            state: std::sync::RwLock::new(SessionState::Created),
            created_time: now,
            last_activity: std::sync::RwLock::new(now),
            expires_at: std::sync::RwLock::new(expires_at),
            client_name: std::sync::RwLock::new(None),
            client_version: std::sync::RwLock::new(None),
            protocol_version: std::sync::RwLock::new(None),
            negotiated_capabilities: std::sync::RwLock::new(ClientCapabilities::default()),
            stats: SessionStats::default(),
        });
        sessions.insert(session_id, session.clone());
        Ok(session)
    }

    /// Cloning the returned `Arc` *is* taking an additional reference;
    /// there is no separate unref call.
    pub async fn find(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Partitions the table into expired and kept sessions under one write
    /// guard, replaces it with the kept set, then drops the guard before
    /// logging — expired sessions are only dropped (and thus only lose
    /// their last strong reference) once the lock is released.
    pub async fn sweep_expired(&self, hal: &dyn Hal) -> usize {
        let now = hal.now();
        let expired = {
            let mut sessions = self.sessions.write().await;
            let (kept, expired): (HashMap<_, _>, HashMap<_, _>) =
                std::mem::take(&mut *sessions)
                    .into_iter()
                    .partition(|(_, session)| !session.is_expired(now));
            *sessions = kept;
            expired
        };
        let count = expired.len();
        for (id, _session) in expired {
            info!(session_id = %id, "session expired and removed");
        }
        count
    }

    /// Spawns the periodic sweeper via the supplied `Hal`, returning
    /// nothing — the task runs for the lifetime of the server.
    pub fn spawn_sweeper(manager: Arc<SessionManager>, hal: Arc<dyn Hal>, interval_secs: u64) {
        let hal_for_spawn = hal.clone();
        let fut = Box::pin(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                manager.sweep_expired(hal_for_spawn.as_ref()).await;
            }
        });
        hal.spawn(fut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SystemHal;

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let manager = SessionManager::new(10, 3600);
        let hal = SystemHal::default();
        let session = manager.create(&hal, None).await.unwrap();
        let found = manager.find(session.session_id).await.unwrap();
        assert_eq!(Arc::strong_count(&found), 3);
    }

    #[tokio::test]
    async fn duplicate_explicit_id_is_rejected() {
        let manager = SessionManager::new(10, 3600);
        let hal = SystemHal::default();
        let session = manager.create(&hal, None).await.unwrap();
        let id = session.session_id.to_string();
        let err = manager.create(&hal, Some(&id)).await.unwrap_err();
        assert!(matches!(err, ServerError::SessionExists(_)));
    }

    #[tokio::test]
    async fn table_full_is_rejected() {
        let manager = SessionManager::new(1, 3600);
        let hal = SystemHal::default();
        manager.create(&hal, None).await.unwrap();
        let err = manager.create(&hal, None).await.unwrap_err();
        assert!(matches!(err, ServerError::SessionTableFull(1)));
    }

    #[tokio::test]
    async fn invalid_session_id_is_rejected() {
        let manager = SessionManager::new(10, 3600);
        let hal = SystemHal::default();
        let err = manager.create(&hal, Some("not-a-uuid")).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidSessionId(_)));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_sessions() {
        let manager = SessionManager::new(10, 0);
        let hal = SystemHal::default();
        manager.create(&hal, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = manager.sweep_expired(&hal).await;
        assert_eq!(removed, 1);
        assert_eq!(manager.len().await, 0);
    }
}
