//! Adds two numbers — a worked example of numeric parameter handling.

use mcp_server::{ParamDesc, PrimitiveType, ToolBuilder, ToolValue};

pub fn builder() -> ToolBuilder {
    ToolBuilder::new("add", "Add two numbers together.")
        .params(vec![
            ParamDesc::single("a", PrimitiveType::Number, "first addend", true),
            ParamDesc::single("b", PrimitiveType::Number, "second addend", true),
        ])
        .execute(|acc| async move { Ok(ToolValue::Number(acc.number("a") + acc.number("b"))) })
}
