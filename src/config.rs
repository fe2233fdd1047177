//! Host-facing configuration.
//!
//! `ServerConfig` is a plain struct with fluent builder setters. The example
//! host in `src/main.rs` fills one in from the `SERVER_NAME`,
//! `SERVER_VERSION`, `MCP_TRANSPORT_MODE`, `HOST`, and `PORT` environment
//! variables.

/// Which transport `McpServer::run` should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    Http,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,

    pub host: String,
    pub port: u16,
    pub path: String,

    pub max_tools: usize,
    pub max_sessions: usize,
    pub session_timeout_secs: u64,
    pub cleanup_interval_secs: u64,
    pub enable_sessions: bool,
    pub auto_cleanup: bool,

    pub max_message_size: usize,
    pub debug: bool,
}

impl ServerConfig {
    /// Required fields only; everything else takes a sensible default.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instructions: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            path: "/mcp".to_string(),
            max_tools: 100,
            max_sessions: 10,
            session_timeout_secs: 3600,
            cleanup_interval_secs: 60,
            enable_sessions: true,
            auto_cleanup: true,
            max_message_size: 10 * 1024 * 1024,
            debug: false,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_http(mut self, host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        self.host = host.into();
        self.port = port;
        self.path = path.into();
        self
    }

    pub fn with_max_tools(mut self, max_tools: usize) -> Self {
        self.max_tools = max_tools;
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn with_session_timeout_secs(mut self, secs: u64) -> Self {
        self.session_timeout_secs = secs;
        self
    }

    pub fn with_cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.cleanup_interval_secs = secs;
        self
    }

    pub fn with_sessions_enabled(mut self, enabled: bool) -> Self {
        self.enable_sessions = enabled;
        self
    }

    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
