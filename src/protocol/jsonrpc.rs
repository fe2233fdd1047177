//! JSON-RPC 2.0 codec.
//!
//! Parses a line of text into a `Message`, classifying it by the presence
//! set `{method, id, result, error}`, and serializes a `Message` back to a
//! `String`. `serde_json::Value`'s derived `PartialEq` already gives
//! request/response `id` correlation the right semantics (string equals
//! string, number equals number, null equals null, never across types), so
//! no custom comparator is needed here.

use crate::error::ProtocolError;
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Value,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Value,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub id: Value,
    pub error: ErrorObject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl From<&ProtocolError> for ErrorObject {
    fn from(err: &ProtocolError) -> Self {
        ErrorObject {
            code: err.code(),
            message: err.to_string(),
            data: err.data(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    Response(Response),
    ErrorResponse(ErrorResponse),
}

impl Message {
    /// Build the `ErrorResponse` the engine sends for a top-level parse
    /// failure, where `id` is always `null`.
    pub fn parse_error_response(err: &ProtocolError) -> Message {
        Message::ErrorResponse(ErrorResponse {
            id: Value::Null,
            error: err.into(),
        })
    }

    pub fn error_response(id: Value, err: &ProtocolError) -> Message {
        Message::ErrorResponse(ErrorResponse {
            id,
            error: err.into(),
        })
    }

    pub fn response(id: Value, result: Value) -> Message {
        Message::Response(Response { id, result })
    }
}

/// Bounds `text.len()` before touching `serde_json`, so an oversized message
/// never materializes a parse tree.
pub fn parse(text: &str, max_message_size: usize) -> Result<Message, ProtocolError> {
    if text.len() > max_message_size {
        return Err(ProtocolError::ParseError);
    }

    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::ParseError)?;
    let obj = value.as_object().ok_or(ProtocolError::InvalidRequest)?;

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(ProtocolError::InvalidRequest);
    }

    classify(obj)
}

fn classify(obj: &Map<String, Value>) -> Result<Message, ProtocolError> {
    let has_method = obj.contains_key("method");
    let has_id = obj.contains_key("id");
    let has_result = obj.contains_key("result");
    let has_error = obj.contains_key("error");

    match (has_method, has_id, has_result, has_error) {
        (true, true, false, false) => {
            let method = obj
                .get("method")
                .and_then(Value::as_str)
                .ok_or(ProtocolError::InvalidRequest)?
                .to_string();
            Ok(Message::Request(Request {
                id: obj.get("id").cloned().unwrap_or(Value::Null),
                method,
                params: obj.get("params").cloned(),
            }))
        }
        (true, false, false, false) => {
            let method = obj
                .get("method")
                .and_then(Value::as_str)
                .ok_or(ProtocolError::InvalidRequest)?
                .to_string();
            Ok(Message::Notification(Notification {
                method,
                params: obj.get("params").cloned(),
            }))
        }
        (false, true, true, false) => Ok(Message::Response(Response {
            id: obj.get("id").cloned().unwrap_or(Value::Null),
            result: obj.get("result").cloned().unwrap_or(Value::Null),
        })),
        (false, true, false, true) => {
            let error_value = obj.get("error").ok_or(ProtocolError::InvalidRequest)?;
            let error_obj = error_value.as_object().ok_or(ProtocolError::InvalidRequest)?;
            let code = error_obj
                .get("code")
                .and_then(Value::as_i64)
                .ok_or(ProtocolError::InvalidRequest)? as i32;
            let message = error_obj
                .get("message")
                .and_then(Value::as_str)
                .ok_or(ProtocolError::InvalidRequest)?
                .to_string();
            Ok(Message::ErrorResponse(ErrorResponse {
                id: obj.get("id").cloned().unwrap_or(Value::Null),
                error: ErrorObject {
                    code,
                    message,
                    data: error_obj.get("data").cloned(),
                },
            }))
        }
        _ => Err(ProtocolError::InvalidRequest),
    }
}

pub fn serialize(message: &Message) -> String {
    let value = match message {
        Message::Request(req) => {
            let mut map = Map::new();
            map.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            map.insert("id".into(), req.id.clone());
            map.insert("method".into(), Value::String(req.method.clone()));
            if let Some(params) = &req.params {
                map.insert("params".into(), params.clone());
            }
            Value::Object(map)
        }
        Message::Notification(note) => {
            let mut map = Map::new();
            map.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            map.insert("method".into(), Value::String(note.method.clone()));
            if let Some(params) = &note.params {
                map.insert("params".into(), params.clone());
            }
            Value::Object(map)
        }
        Message::Response(resp) => {
            let mut map = Map::new();
            map.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            map.insert("id".into(), resp.id.clone());
            map.insert("result".into(), resp.result.clone());
            Value::Object(map)
        }
        Message::ErrorResponse(err_resp) => {
            let mut error_map = Map::new();
            error_map.insert("code".into(), Value::from(err_resp.error.code));
            error_map.insert(
                "message".into(),
                Value::String(err_resp.error.message.clone()),
            );
            if let Some(data) = &err_resp.error.data {
                error_map.insert("data".into(), data.clone());
            }
            let mut map = Map::new();
            map.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            map.insert("id".into(), err_resp.id.clone());
            map.insert("error".into(), Value::Object(error_map));
            Value::Object(map)
        }
    };
    serde_json::to_string(&value).expect("Message serializes to valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_request() {
        let msg = parse(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, 4096).unwrap();
        assert!(matches!(msg, Message::Request(Request { ref method, .. }) if method == "ping"));
    }

    #[test]
    fn classifies_notification() {
        let msg = parse(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            4096,
        )
        .unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn rejects_bad_version() {
        let err = parse(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#, 4096).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse("not json", 4096).unwrap_err();
        assert!(matches!(err, ProtocolError::ParseError));
    }

    #[test]
    fn rejects_oversized_without_parsing() {
        let big = format!(r#"{{"jsonrpc":"2.0","id":1,"method":"{}"}}"#, "x".repeat(100));
        let err = parse(&big, 10).unwrap_err();
        assert!(matches!(err, ProtocolError::ParseError));
    }

    #[test]
    fn round_trips_request() {
        let original = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"add"}}"#;
        let msg = parse(original, 4096).unwrap();
        let once = serialize(&msg);
        let twice = serialize(&parse(&once, 4096).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn id_equality_matches_type_and_value() {
        assert_eq!(Value::from(1), Value::from(1));
        assert_ne!(Value::from(1), Value::String("1".to_string()));
        assert_eq!(Value::Null, Value::Null);
    }
}
