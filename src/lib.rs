//! Embeddable server runtime for the Model Context Protocol (MCP).
//!
//! A host binary depends on this crate, builds a [`ServerConfig`], registers
//! tools/resources through the [`McpServer`] facade, and calls `run()` with
//! a chosen transport.

pub mod config;
pub mod error;
pub mod hal;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;

pub use config::{ServerConfig, TransportKind};
pub use error::{ProtocolError, ResourceError, ServerError, ServerResult, ToolError};
pub use server::McpServer;
pub use tools::{ParamDesc, PrimitiveType, ToolBuilder, ToolValue};
