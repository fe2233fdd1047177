//! Demonstration tools for the example host binary, built on the registry,
//! schema, and accessor types instead of ad hoc `serde_json::Value`
//! plumbing.

pub mod add;
pub mod echo;

use mcp_server::{McpServer, ServerError};

pub async fn register_all(server: &McpServer) -> Result<(), ServerError> {
    server.add_tool(echo::builder()).await?;
    server.add_tool(add::builder()).await?;
    Ok(())
}
