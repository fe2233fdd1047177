//! Echoes a message back, optionally prefixed.

use mcp_server::{ParamDesc, PrimitiveType, ToolBuilder, ToolValue};

pub fn builder() -> ToolBuilder {
    ToolBuilder::new("echo", "Echo a message back to the client.")
        .params(vec![
            ParamDesc::single("message", PrimitiveType::String, "The message to echo", true),
            ParamDesc::single("prefix", PrimitiveType::String, "Optional prefix to prepend", false),
        ])
        .execute(|acc| async move {
            let message = acc.string("message");
            let prefix = acc.string("prefix");
            Ok(ToolValue::Text(format!("{prefix}{message}")))
        })
}
