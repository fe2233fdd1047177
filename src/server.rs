//! `McpServer`: the host-facing facade that ties config, registries, and
//! transports together. Registration methods delegate to
//! `ProtocolEngine::{tools, resources}`; `run` drives the chosen transport
//! to completion, blocking until the transport shuts down.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::config::{ServerConfig, TransportKind};
use crate::error::{ServerError, ToolError};
use crate::hal::{Hal, SystemHal};
use crate::protocol::engine::ProtocolEngine;
use crate::resources::{BinaryFn, ResourceContent, TemplateFn, TextFn};
use crate::session::manager::SessionManager;
use crate::tools::registry::ToolBuilder;
use crate::tools::ToolValue;
use crate::transport::{http, stdio, TransportState, TransportStateMachine};

pub struct McpServer {
    engine: Arc<ProtocolEngine>,
    hal: Arc<dyn Hal>,
    state: TransportStateMachine,
    last_error: RwLock<Option<String>>,
}

impl McpServer {
    pub fn create(config: ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            engine: Arc::new(ProtocolEngine::new(config)),
            hal: Arc::new(SystemHal),
            state: TransportStateMachine::default(),
            last_error: RwLock::new(None),
        })
    }

    pub async fn add_tool(&self, builder: ToolBuilder) -> Result<(), ServerError> {
        self.engine.tools.register(builder, false).await
    }

    pub async fn add_text_resource(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Result<(), ServerError> {
        self.engine.resources.add_text(uri, name, content, mime_type).await
    }

    pub async fn add_binary_resource(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        data: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<(), ServerError> {
        self.engine.resources.add_binary(uri, name, data, mime_type).await
    }

    pub async fn add_file_resource(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<(), ServerError> {
        self.engine.resources.add_file(uri, name, path).await
    }

    pub async fn add_text_function_resource(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: Option<&str>,
        handler: TextFn,
    ) -> Result<(), ServerError> {
        self.engine
            .resources
            .add_text_function(uri, name, mime_type, handler)
            .await
    }

    pub async fn add_binary_function_resource(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: Option<&str>,
        handler: BinaryFn,
    ) -> Result<(), ServerError> {
        self.engine
            .resources
            .add_binary_function(uri, name, mime_type, handler)
            .await
    }

    pub async fn add_resource_template(
        &self,
        uri_template: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        mime_type: Option<&str>,
        handler: TemplateFn,
    ) -> Result<(), ServerError> {
        self.engine
            .resources
            .add_template(uri_template, name, description, mime_type, handler)
            .await
    }

    /// Drives the chosen transport to completion.
    pub async fn run(&self, transport: TransportKind) -> Result<(), ServerError> {
        if !self.state.begin_start() {
            return Err(ServerError::Transport(
                "server is already running".to_string(),
            ));
        }

        let config = self.engine.config();
        if config.auto_cleanup {
            SessionManager::spawn_sweeper(
                self.engine.sessions.clone(),
                self.hal.clone(),
                config.cleanup_interval_secs,
            );
        }

        info!(name = %config.name, version = %config.version, "mcp server starting");
        self.state.mark_running();

        let result = match transport {
            TransportKind::Stdio => stdio::run(self.engine.clone()).await,
            TransportKind::Http => {
                http::run(self.engine.clone(), &config.host, config.port, &config.path).await
            }
        };

        match result {
            Ok(()) => {
                self.state.mark_stopped();
                Ok(())
            }
            Err(err) => {
                self.state.mark_error();
                *self.last_error.write().unwrap() = Some(err.to_string());
                Err(ServerError::from(err))
            }
        }
    }

    pub fn stop(&self) {
        self.state.begin_stop();
        self.state.mark_stopped();
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    pub fn state(&self) -> TransportState {
        self.state.state()
    }
}

pub type ToolResult = Result<ToolValue, ToolError>;
pub type ResourceReadResult = Result<ResourceContent, crate::error::ResourceError>;
