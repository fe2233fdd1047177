//! Dispatch engine: ties the codec, handshake FSM, tool registry, resource
//! registry, and session manager together behind one `handle_message` entry
//! point.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ProtocolError, ResourceError};
use crate::hal::{Hal, SystemHal};
use crate::protocol::handshake::{HandshakeEvent, HandshakeMachine, HandshakeState};
use crate::protocol::jsonrpc::{self, Message};
use crate::resources::ResourceRegistry;
use crate::session::manager::SessionManager;
use crate::session::SessionState;
use crate::tools::ToolRegistry;

/// Per-connection bookkeeping. One stdio transport owns exactly one
/// `ConnectionHandle`; an HTTP transport creates one per in-flight request.
pub struct ConnectionHandle {
    pub connection_id: String,
    pub handshake: HandshakeMachine,
    pub session_id: std::sync::RwLock<Option<String>>,
    pub bytes_in: AtomicU64,
    pub bytes_out: AtomicU64,
    pub messages_in: AtomicU64,
    pub messages_out: AtomicU64,
    pub is_active: AtomicBool,
}

impl ConnectionHandle {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            handshake: HandshakeMachine::new(),
            session_id: std::sync::RwLock::new(None),
            bytes_in: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            messages_in: AtomicU64::new(0),
            messages_out: AtomicU64::new(0),
            is_active: AtomicBool::new(true),
        }
    }
}

pub struct ProtocolEngine {
    config: ServerConfig,
    pub tools: ToolRegistry,
    pub resources: ResourceRegistry,
    pub sessions: Arc<SessionManager>,
    hal: Arc<dyn Hal>,
}

impl ProtocolEngine {
    pub fn new(config: ServerConfig) -> Self {
        let tools = ToolRegistry::new(config.max_tools);
        let sessions = Arc::new(SessionManager::new(config.max_sessions, config.session_timeout_secs));
        Self {
            config,
            tools,
            resources: ResourceRegistry::new(),
            sessions,
            hal: Arc::new(SystemHal),
        }
    }

    /// Looks up the session named by `conn`'s `Mcp-Session-Id` (set by the
    /// transport from the request header) and refreshes its activity clock.
    /// A header naming an unknown or malformed id is treated as no session,
    /// not an error — the request still runs, just without affinity.
    async fn touch_session(&self, conn: &ConnectionHandle) {
        if !self.config.enable_sessions {
            return;
        }
        let Some(id) = conn.session_id.read().unwrap().clone() else {
            return;
        };
        let Ok(uuid) = Uuid::parse_str(&id) else {
            return;
        };
        if let Some(session) = self.sessions.find(uuid).await {
            let now = self.hal.now();
            session.touch(now, now + Duration::from_secs(self.config.session_timeout_secs));
            session.stats.requests_handled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Creates a session for a fresh `initialize` call and records client
    /// identity onto it. A connection that already carries a session id
    /// (reusing an existing HTTP session to re-initialize) is left alone.
    async fn open_session(
        &self,
        conn: &ConnectionHandle,
        client_name: Option<String>,
        client_version: Option<String>,
        protocol_version: String,
    ) {
        let has_session = conn.session_id.read().unwrap().is_some();
        if has_session {
            return;
        }

        match self.sessions.create(self.hal.as_ref(), None).await {
            Ok(session) => {
                *session.client_name.write().unwrap() = client_name;
                *session.client_version.write().unwrap() = client_version;
                *session.protocol_version.write().unwrap() = Some(protocol_version);
                session.set_state(SessionState::Active);
                *conn.session_id.write().unwrap() = Some(session.session_id.to_string());
            }
            Err(err) => warn!(%err, "failed to create session on initialize"),
        }
    }

    /// Parses, dispatches, and (for requests) returns the serialized
    /// response to send back; returns `None` for notifications and
    /// responses/error-responses, which never produce a reply.
    pub async fn handle_message(&self, text: &str, conn: &ConnectionHandle) -> Option<String> {
        conn.messages_in.fetch_add(1, Ordering::Relaxed);
        conn.bytes_in.fetch_add(text.len() as u64, Ordering::Relaxed);

        let message = match jsonrpc::parse(text, self.config.max_message_size) {
            Ok(message) => message,
            Err(err) => return Some(self.finish(conn, Message::parse_error_response(&err))),
        };

        match message {
            Message::Request(req) => {
                if req.method == "initialize" {
                    conn.handshake.transition(HandshakeEvent::InitializeRequest);
                } else {
                    conn.handshake.transition(HandshakeEvent::AnyMessage);
                    self.touch_session(conn).await;
                }

                let outcome = self.dispatch(&req.method, req.params, conn).await;
                let response = match outcome {
                    Ok(result) => Message::response(req.id, result),
                    Err(err) => Message::error_response(req.id, &err),
                };

                if req.method == "initialize" && matches!(response, Message::Response(_)) {
                    conn.handshake.transition(HandshakeEvent::InitializeResponseSent);
                }
                Some(self.finish(conn, response))
            }
            Message::Notification(note) => {
                if note.method == "notifications/initialized" {
                    conn.handshake.transition(HandshakeEvent::InitializedNotification);
                }
                None
            }
            Message::Response(_) | Message::ErrorResponse(_) => {
                debug!(connection_id = %conn.connection_id, "discarding unsolicited response");
                None
            }
        }
    }

    fn finish(&self, conn: &ConnectionHandle, message: Message) -> String {
        let text = jsonrpc::serialize(&message);
        conn.messages_out.fetch_add(1, Ordering::Relaxed);
        conn.bytes_out.fetch_add(text.len() as u64, Ordering::Relaxed);
        text
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
        conn: &ConnectionHandle,
    ) -> Result<Value, ProtocolError> {
        match method {
            "initialize" => self.handle_initialize(params, conn).await,
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.tools.list().await),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(self.resources.list().await),
            "resources/read" => self.handle_resources_read(params).await,
            "resources/templates/list" => Ok(self.resources.list_templates().await),
            other => Err(ProtocolError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>, conn: &ConnectionHandle) -> Result<Value, ProtocolError> {
        let params = params.unwrap_or(Value::Null);
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("2025-06-18")
            .to_string();
        let client_name = params
            .pointer("/clientInfo/name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let client_version = params
            .pointer("/clientInfo/version")
            .and_then(Value::as_str)
            .map(str::to_string);

        if self.config.enable_sessions {
            self.open_session(conn, client_name, client_version, protocol_version.clone())
                .await;
        }

        let mut capabilities = serde_json::Map::new();
        if self.tools.len().await > 0 {
            capabilities.insert("tools".into(), serde_json::json!({ "listChanged": true }));
        }
        if self.resources.has_any().await {
            capabilities.insert("resources".into(), serde_json::json!({ "listChanged": true }));
        }
        capabilities.insert("logging".into(), serde_json::json!({}));

        let mut result = serde_json::json!({
            "protocolVersion": protocol_version,
            "serverInfo": { "name": self.config.name, "version": self.config.version },
            "capabilities": Value::Object(capabilities),
        });
        let instructions = self.config.instructions.clone().unwrap_or_else(|| {
            "Resource templates accept exactly one {param} placeholder, at the end \
             of the URI."
                .to_string()
        });
        result["instructions"] = Value::String(instructions);
        Ok(result)
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, ProtocolError> {
        let params = params.ok_or_else(|| ProtocolError::InvalidParams {
            details: "tools/call requires params".to_string(),
        })?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams {
                details: "tools/call requires params.name".to_string(),
            })?;
        let arguments = params.get("arguments").cloned();
        Ok(self.tools.call(name, arguments).await)
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, ProtocolError> {
        let params = params.ok_or_else(|| ProtocolError::InvalidParams {
            details: "resources/read requires params".to_string(),
        })?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams {
                details: "resources/read requires params.uri".to_string(),
            })?;
        self.resources.read(uri).await.map_err(|err| {
            if matches!(err, ResourceError::NotFound(_) | ResourceError::TemplateMismatch(_)) {
                warn!(uri, "resource lookup missed");
            }
            err.into()
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamDesc, PrimitiveType, ToolBuilder, ToolValue};

    #[tokio::test]
    async fn initialize_then_list_then_call_add() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        engine
            .tools
            .register(
                ToolBuilder::new("add", "adds two numbers")
                    .params(vec![
                        ParamDesc::single("a", PrimitiveType::Number, "first", true),
                        ParamDesc::single("b", PrimitiveType::Number, "second", true),
                    ])
                    .execute(|acc| async move { Ok(ToolValue::Number(acc.number("a") + acc.number("b"))) }),
                false,
            )
            .await
            .unwrap();

        let conn = ConnectionHandle::new("conn-0");
        let init = engine
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
                &conn,
            )
            .await
            .unwrap();
        assert!(init.contains("\"capabilities\""));
        assert_eq!(conn.handshake.state(), HandshakeState::Initialized);

        let notified = engine
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, &conn)
            .await;
        assert!(notified.is_none());
        assert_eq!(conn.handshake.state(), HandshakeState::Ready);

        let call = engine
            .handle_message(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":3,"b":4}}}"#,
                &conn,
            )
            .await
            .unwrap();
        assert!(call.contains("\"text\":\"7\""));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        let conn = ConnectionHandle::new("conn-0");
        let reply = engine
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"nope"}"#, &conn)
            .await
            .unwrap();
        assert!(reply.contains("-32601"));
    }

    #[tokio::test]
    async fn garbage_is_parse_error_with_null_id() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        let conn = ConnectionHandle::new("conn-0");
        let reply = engine.handle_message("not json", &conn).await.unwrap();
        assert!(reply.contains("-32700"));
        assert!(reply.contains("\"id\":null"));
    }

    #[tokio::test]
    async fn ping_replies_with_empty_object() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        let conn = ConnectionHandle::new("conn-0");
        let reply = engine
            .handle_message(r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#, &conn)
            .await
            .unwrap();
        assert!(reply.contains("\"result\":{}"));
    }

    #[tokio::test]
    async fn initialize_opens_a_session_and_records_client_info() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        let conn = ConnectionHandle::new("conn-0");
        engine
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"acme","version":"1.2"}}}"#,
                &conn,
            )
            .await
            .unwrap();

        let id = conn.session_id.read().unwrap().clone().expect("session id recorded");
        let uuid = Uuid::parse_str(&id).unwrap();
        let session = engine.sessions.find(uuid).await.expect("session created");
        assert_eq!(session.client_name.read().unwrap().as_deref(), Some("acme"));
        assert_eq!(session.client_version.read().unwrap().as_deref(), Some("1.2"));
        assert_eq!(session.protocol_version.read().unwrap().as_deref(), Some("2025-06-18"));
    }

    #[tokio::test]
    async fn session_disabled_skips_session_creation() {
        let config = ServerConfig::new("test", "0.1.0").with_sessions_enabled(false);
        let engine = ProtocolEngine::new(config);
        let conn = ConnectionHandle::new("conn-0");
        engine
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{}}}"#,
                &conn,
            )
            .await
            .unwrap();

        assert!(conn.session_id.read().unwrap().is_none());
        assert_eq!(engine.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn existing_session_header_is_reused_across_requests() {
        let engine = ProtocolEngine::new(ServerConfig::new("test", "0.1.0"));
        let init_conn = ConnectionHandle::new("conn-0");
        engine
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{}}}"#,
                &init_conn,
            )
            .await
            .unwrap();
        let id = init_conn.session_id.read().unwrap().clone().unwrap();

        // A second connection carrying the header (as the HTTP transport
        // would set it from `Mcp-Session-Id`) should resolve to the same
        // session and bump its request count.
        let follow_up = ConnectionHandle::new("conn-1");
        *follow_up.session_id.write().unwrap() = Some(id.clone());
        engine
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#, &follow_up)
            .await
            .unwrap();

        let uuid = Uuid::parse_str(&id).unwrap();
        let session = engine.sessions.find(uuid).await.unwrap();
        assert_eq!(session.stats.requests_handled.load(Ordering::Relaxed), 1);
    }
}
