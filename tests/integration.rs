//! End-to-end scenarios driving `ProtocolEngine` directly, no subprocess
//! spawning — the six concrete cases this crate is expected to satisfy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcp_server::protocol::engine::{ConnectionHandle, ProtocolEngine};
use mcp_server::resources::{check_safe_path, ResourceContent};
use mcp_server::{ParamDesc, PrimitiveType, ServerConfig, ToolBuilder, ToolValue};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

async fn engine_with_add() -> ProtocolEngine {
    let engine = ProtocolEngine::new(ServerConfig::new("test-host", "0.1.0"));
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
    engine
}

#[tokio::test]
async fn scenario_1_handshake_then_list_tools() {
    let engine = engine_with_add().await;
    let conn = ConnectionHandle::new("conn-0");

    let init = engine
        .handle_message(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
            &conn,
        )
        .await
        .expect("initialize produces a response");
    assert!(init.contains("\"tools\""));

    engine
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, &conn)
        .await;

    let list = engine
        .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, &conn)
        .await
        .expect("tools/list produces a response");
    assert!(list.contains("\"name\":\"add\""));
}

#[tokio::test]
async fn scenario_2_add_tool_invocation() {
    let engine = engine_with_add().await;
    let conn = ConnectionHandle::new("conn-0");

    let reply = engine
        .handle_message(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"add","arguments":{"a":3,"b":4}}}"#,
            &conn,
        )
        .await
        .unwrap();
    assert!(reply.contains("\"text\":\"7\""));
    assert!(reply.contains("\"isError\":false"));
}

#[tokio::test]
async fn scenario_3_unknown_tool_call_is_not_method_not_found() {
    let engine = engine_with_add().await;
    let conn = ConnectionHandle::new("conn-0");

    let reply = engine
        .handle_message(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
            &conn,
        )
        .await
        .unwrap();
    assert!(reply.contains("\"isError\":true"));
    assert!(!reply.contains("-32601"));
}

#[tokio::test]
async fn scenario_4_parse_error_on_garbage() {
    let engine = engine_with_add().await;
    let conn = ConnectionHandle::new("conn-0");

    let reply = engine.handle_message("not json", &conn).await.unwrap();
    assert!(reply.contains("-32700"));
    assert!(reply.contains("\"id\":null"));
}

#[tokio::test]
async fn scenario_5_method_not_found() {
    let engine = engine_with_add().await;
    let conn = ConnectionHandle::new("conn-0");

    let reply = engine
        .handle_message(r#"{"jsonrpc":"2.0","id":5,"method":"totally/unknown"}"#, &conn)
        .await
        .unwrap();
    assert!(reply.contains("-32601"));
    assert!(reply.contains("totally/unknown"));
}

#[tokio::test]
async fn scenario_6_resource_read_via_file_template_and_traversal_rejection() {
    std::fs::create_dir_all(fixtures_dir().join("examples")).unwrap();
    std::fs::write(fixtures_dir().join("examples/x.txt"), "hi").unwrap();

    let engine = ProtocolEngine::new(ServerConfig::new("test-host", "0.1.0"));
    let base = fixtures_dir();
    engine
        .resources
        .add_template(
            "fixture:///./{path}",
            "fixture",
            None,
            Some("text/plain"),
            Arc::new(move |captured: &str| {
                check_safe_path(captured)?;
                let full = base.join(captured);
                std::fs::read_to_string(&full)
                    .map(ResourceContent::Text)
                    .map_err(|e| mcp_server::ResourceError::Io(e.to_string()))
            }),
        )
        .await
        .unwrap();

    let conn = ConnectionHandle::new("conn-0");
    let ok = engine
        .handle_message(
            r#"{"jsonrpc":"2.0","id":6,"method":"resources/read","params":{"uri":"fixture:///./examples/x.txt"}}"#,
            &conn,
        )
        .await
        .unwrap();
    assert!(ok.contains("\"text\":\"hi\""));

    let traversal = engine
        .handle_message(
            r#"{"jsonrpc":"2.0","id":7,"method":"resources/read","params":{"uri":"fixture:///./../etc/passwd"}}"#,
            &conn,
        )
        .await
        .unwrap();
    assert!(traversal.contains("\"error\""));
    assert!(!traversal.contains("root:"));
}
