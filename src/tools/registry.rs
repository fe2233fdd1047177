//! Tool registry and invocation pipeline.
//!
//! A keyed `HashMap<String, ToolEntry>` behind one `tokio::sync::RwLock`
//! holds the registered tools. An insertion-ordered `Vec<String>` rides
//! alongside the map so `tools/list` still enumerates in registration order
//! without relying on `HashMap` iteration order.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{ServerError, ToolError};
use crate::tools::accessor::ParamAccessor;
use crate::tools::schema::{check_structural, synthesize_schema, ParamDesc};
use crate::tools::value::ToolValue;

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ToolValue, ToolError>> + Send>>;
pub type ToolHandler = Arc<dyn Fn(ParamAccessor) -> ToolFuture + Send + Sync>;
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

const NAME_MAX_LEN: usize = 255;

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= NAME_MAX_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A registered tool. The registry holds one `Arc<Tool>`; invocation clones
/// it (taking an additional strong reference) before dropping the read
/// guard, so user code never runs with the registry lock held.
pub struct Tool {
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Option<Value>,
    pub execute: ToolHandler,
    pub validate: Option<ValidateFn>,
    pub category: String,
    pub is_async: bool,
    pub is_dangerous: bool,
    pub max_execution_time_ms: Option<u64>,
    pub max_memory_usage_bytes: Option<u64>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("is_dangerous", &self.is_dangerous)
            .finish()
    }
}

/// Builder for a `Tool`. Registration itself lives on `ToolRegistry` so it
/// can check name validity/uniqueness/capacity before inserting.
pub struct ToolBuilder {
    name: String,
    title: Option<String>,
    description: String,
    params: Vec<ParamDesc>,
    output_schema: Option<Value>,
    execute: Option<ToolHandler>,
    validate: Option<ValidateFn>,
    category: String,
    is_async: bool,
    is_dangerous: bool,
    max_execution_time_ms: Option<u64>,
    max_memory_usage_bytes: Option<u64>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            params: Vec::new(),
            output_schema: None,
            execute: None,
            validate: None,
            category: "general".to_string(),
            is_async: true,
            is_dangerous: false,
            max_execution_time_ms: None,
            max_memory_usage_bytes: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn params(mut self, params: Vec<ParamDesc>) -> Self {
        self.params = params;
        self
    }

    pub fn output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn dangerous(mut self, dangerous: bool) -> Self {
        self.is_dangerous = dangerous;
        self
    }

    pub fn max_execution_time_ms(mut self, ms: u64) -> Self {
        self.max_execution_time_ms = Some(ms);
        self
    }

    pub fn max_memory_usage_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_usage_bytes = Some(bytes);
        self
    }

    pub fn validate(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn execute<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ParamAccessor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolValue, ToolError>> + Send + 'static,
    {
        self.execute = Some(Arc::new(move |acc| Box::pin(handler(acc)) as ToolFuture));
        self
    }

    fn build(self) -> Result<Tool, ServerError> {
        let execute = self
            .execute
            .ok_or_else(|| ServerError::Config(format!("tool {} has no handler", self.name)))?;
        let input_schema = synthesize_schema(&self.name, &self.description, &self.params);
        Ok(Tool {
            name: self.name,
            title: self.title,
            description: self.description,
            input_schema,
            output_schema: self.output_schema,
            execute,
            validate: self.validate,
            category: self.category,
            is_async: self.is_async,
            is_dangerous: self.is_dangerous,
            max_execution_time_ms: self.max_execution_time_ms,
            max_memory_usage_bytes: self.max_memory_usage_bytes,
        })
    }
}

#[derive(Debug, Default)]
pub struct ToolStats {
    pub calls_made: AtomicU64,
    pub calls_successful: AtomicU64,
    pub calls_failed: AtomicU64,
    pub total_execution_time_ms: AtomicU64,
}

impl ToolStats {
    pub fn average_execution_time_ms(&self) -> f64 {
        let calls = self.calls_made.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        self.total_execution_time_ms.load(Ordering::Relaxed) as f64 / calls as f64
    }

    fn record(&self, success: bool, elapsed_ms: u64) {
        self.calls_made.fetch_add(1, Ordering::Relaxed);
        if success {
            self.calls_successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.calls_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_execution_time_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
    }
}

pub struct ToolEntry {
    pub tool: Arc<Tool>,
    pub registered_time: SystemTime,
    pub is_builtin: bool,
    pub stats: ToolStats,
}

#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<Inner>,
    max_tools: usize,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new(max_tools: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_tools,
        }
    }

    pub async fn register(&self, builder: ToolBuilder, is_builtin: bool) -> Result<(), ServerError> {
        if !is_valid_tool_name(&builder.name) {
            return Err(ServerError::InvalidToolName(builder.name));
        }
        let tool = builder.build()?;
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&tool.name) {
            return Err(ServerError::ToolExists(tool.name));
        }
        if inner.entries.len() >= self.max_tools {
            return Err(ServerError::ToolRegistryFull(self.max_tools));
        }
        let name = tool.name.clone();
        inner.entries.insert(
            name.clone(),
            ToolEntry {
                tool: Arc::new(tool),
                registered_time: SystemTime::now(),
                is_builtin,
                stats: ToolStats::default(),
            },
        );
        inner.order.push(name);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn list(&self) -> Value {
        let inner = self.inner.read().await;
        let tools: Vec<Value> = inner
            .order
            .iter()
            .filter_map(|name| inner.entries.get(name))
            .map(|entry| {
                let mut obj = serde_json::json!({
                    "name": entry.tool.name,
                    "description": entry.tool.description,
                    "inputSchema": entry.tool.input_schema,
                });
                if let Some(title) = &entry.tool.title {
                    obj["title"] = Value::String(title.clone());
                }
                obj
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    /// Implements `tools/call` end to end: lookup, validation, invocation,
    /// stats update, and MCP content-block shaping.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Value {
        let tool = {
            let inner = self.inner.read().await;
            match inner.entries.get(name) {
                Some(entry) => entry.tool.clone(),
                None => return error_content(&ToolError::NotFound(format!("unknown tool: {name}"))),
            }
        };

        let args_value = arguments.clone().unwrap_or_else(|| Value::Object(Default::default()));
        let validation = match &tool.validate {
            Some(validate) => validate(&args_value).err(),
            None => check_structural(&tool.input_schema, &args_value).err(),
        };
        if let Some(details) = validation {
            let inner = self.inner.read().await;
            if let Some(entry) = inner.entries.get(name) {
                entry.stats.record(false, 0);
            }
            return error_content(&ToolError::Validation(details));
        }

        let accessor = ParamAccessor::new(arguments);
        let started = std::time::Instant::now();
        let outcome = futures_util::FutureExt::catch_unwind(std::panic::AssertUnwindSafe((tool.execute)(
            accessor,
        )))
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(tool_err)) => Err(tool_err),
            Err(_) => Err(ToolError::Internal("tool handler panicked".to_string())),
        };

        {
            let inner = self.inner.read().await;
            if let Some(entry) = inner.entries.get(name) {
                entry.stats.record(result.is_ok(), elapsed_ms);
            }
        }

        match result {
            Ok(value) => success_content(&value),
            Err(err) => error_content(&err),
        }
    }

    pub async fn stats_snapshot(&self, name: &str) -> Option<(u64, u64, u64, f64)> {
        let inner = self.inner.read().await;
        inner.entries.get(name).map(|entry| {
            (
                entry.stats.calls_made.load(Ordering::Relaxed),
                entry.stats.calls_successful.load(Ordering::Relaxed),
                entry.stats.calls_failed.load(Ordering::Relaxed),
                entry.stats.average_execution_time_ms(),
            )
        })
    }
}

fn success_content(value: &ToolValue) -> Value {
    serde_json::json!({
        "content": [{ "type": "text", "text": value.stringify() }],
        "structuredContent": value.to_json(),
        "isError": false,
    })
}

fn error_content(err: &ToolError) -> Value {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": format!("Error ({}): {}", err.kind(), err),
        }],
        "isError": true,
    })
}
