//! Session lifecycle and statistics.

pub mod manager;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde_json::Value;
use uuid::Uuid;

use crate::protocol::handshake::ClientCapabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initializing,
    Active,
    Inactive,
    Expired,
    Terminated,
}

#[derive(Debug, Default)]
pub struct SessionStats {
    pub requests_handled: AtomicU64,
    pub notifications_handled: AtomicU64,
}

/// Held behind `Arc`; cloning it is the only reference-counting operation
/// needed — there is no separate release step.
#[derive(Debug)]
pub struct Session {
    pub session_id: Uuid,
    pub state: std::sync::RwLock<SessionState>,
    pub created_time: SystemTime,
    pub last_activity: std::sync::RwLock<SystemTime>,
    pub expires_at: std::sync::RwLock<SystemTime>,
    pub client_name: std::sync::RwLock<Option<String>>,
    pub client_version: std::sync::RwLock<Option<String>>,
    pub protocol_version: std::sync::RwLock<Option<String>>,
    pub negotiated_capabilities: std::sync::RwLock<ClientCapabilities>,
    pub stats: SessionStats,
}

impl Session {
    pub fn touch(&self, now: SystemTime, new_expiry: SystemTime) {
        *self.last_activity.write().unwrap() = now;
        *self.expires_at.write().unwrap() = new_expiry;
    }

    pub fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap() = state;
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap()
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > *self.expires_at.read().unwrap()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "sessionId": self.session_id.to_string(),
            "state": format!("{:?}", self.state()),
        })
    }
}
