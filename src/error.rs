//! Unified error taxonomy for the runtime.
//!
//! Every subsystem gets its own `thiserror`-derived enum rather than a single
//! catch-all, mirroring how the JSON-RPC / MCP / transport error families are
//! kept distinct in the pack's protocol crates. `ProtocolError` is the only
//! variant that ever crosses the wire as a JSON-RPC `error` object; the
//! others stay inside the process and are surfaced via content blocks
//! (`ToolError`), mapped to `ProtocolError::Internal` (`ResourceError`), or
//! read back through `McpServer::last_error()` (`ServerError`).

use serde_json::Value;
use thiserror::Error;

/// Standard JSON-RPC 2.0 error codes, plus the ones MCP doesn't special-case.
pub mod code {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Protocol-level (JSON-RPC) error. The only error type that is ever
/// serialized into a response's `error` field.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("Parse error")]
    ParseError,
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },
    #[error("Invalid params: {details}")]
    InvalidParams { details: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProtocolError {
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::ParseError => code::PARSE_ERROR,
            ProtocolError::InvalidRequest => code::INVALID_REQUEST,
            ProtocolError::MethodNotFound { .. } => code::METHOD_NOT_FOUND,
            ProtocolError::InvalidParams { .. } => code::INVALID_PARAMS,
            ProtocolError::Internal { .. } => code::INTERNAL_ERROR,
        }
    }

    /// Extra structured `data` to attach to the error object, if any.
    pub fn data(&self) -> Option<Value> {
        match self {
            ProtocolError::MethodNotFound { method } => {
                Some(serde_json::json!({ "method": method }))
            }
            ProtocolError::InvalidParams { details } => {
                Some(serde_json::json!({ "details": details }))
            }
            _ => None,
        }
    }
}

/// Application-level error produced by a tool handler. Never surfaces as a
/// JSON-RPC `error` object — always rendered into an `isError: true` content
/// block by the tool registry.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Execution(String),
    #[error("execution exceeded {0}ms")]
    Timeout(u64),
    #[error("{0}")]
    Memory(String),
    #[error("{0}")]
    Permission(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// The lowercase snake-case kind name used in `"Error (<kind>): ..."`
    /// content text.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation_error",
            ToolError::Execution(_) => "execution_error",
            ToolError::Timeout(_) => "timeout_error",
            ToolError::Memory(_) => "memory_error",
            ToolError::Permission(_) => "permission_error",
            ToolError::NotFound(_) => "not_found_error",
            ToolError::Internal(_) => "internal_error",
        }
    }
}

/// Resource registry error. Always mapped to `ProtocolError::Internal` by
/// the engine: a missing resource or template mismatch becomes an internal
/// error at the protocol level, with no partial content leaked.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("no template matches: {0}")]
    TemplateMismatch(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("resource exceeds the 1 MiB limit: {0}")]
    TooLarge(String),
    #[error("unsafe path: {0}")]
    UnsafePath(String),
    #[error("unsupported resource kind: {0}")]
    Unsupported(String),
}

impl From<ResourceError> for ProtocolError {
    fn from(err: ResourceError) -> Self {
        ProtocolError::Internal {
            message: err.to_string(),
        }
    }
}

/// Host-facade level error: configuration, registration, session limits,
/// bind-time I/O. Returned directly from fallible `McpServer` methods and
/// also retained as the `last_error()` string for hosts that poll for
/// errors rather than propagate a `Result`.
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    #[error("invalid tool name: {0}")]
    InvalidToolName(String),
    #[error("tool already registered: {0}")]
    ToolExists(String),
    #[error("tool registry is full (max_tools = {0})")]
    ToolRegistryFull(usize),
    #[error("resource already registered: {0}")]
    ResourceExists(String),
    #[error("unsupported URI template: {0}")]
    UnsupportedTemplate(String),
    #[error("session already exists: {0}")]
    SessionExists(String),
    #[error("session table is full (max_sessions = {0})")]
    SessionTableFull(usize),
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(err.to_string())
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
