//! Default conversion engine for oasbridge.
//!
//! Consumes a prepared document plus client configuration (the
//! [`oasbridge_core::engine::ConversionRequest`] hand-off) and produces a
//! runnable MCP server. Route mapping is deliberately minimal: `GET`
//! routes become resources (templates when path parameters are involved),
//! everything else becomes a tool, and declared schemas pass through
//! untouched.

pub mod routes;
pub mod server;

pub use server::{BridgeServer, EngineHandle};

use async_trait::async_trait;
use oasbridge_core::engine::{ConversionEngine, ConversionRequest};
use thiserror::Error;

/// Error type for engine construction and tool execution.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid client configuration (unusable header names/values).
    #[error("engine configuration error: {0}")]
    Config(String),

    /// A tool/resource call could not be built or was rejected upstream.
    #[error("call error: {0}")]
    Call(String),

    /// Outbound HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Conversion engine backed by rmcp's server transports.
#[derive(Debug, Default)]
pub struct RmcpEngine;

impl RmcpEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionEngine for RmcpEngine {
    type Handle = EngineHandle;

    async fn convert(&self, request: ConversionRequest) -> anyhow::Result<EngineHandle> {
        let routes = routes::discover(&request.document);
        if routes.is_empty() {
            anyhow::bail!("document contains no convertible operations");
        }

        let server = BridgeServer::new(
            request.server_name,
            routes,
            request.base_url,
            &request.client,
        )?;
        tracing::info!(
            tools = server.tool_count(),
            resources = server.resource_count(),
            templates = server.template_count(),
            "conversion produced an MCP surface"
        );
        Ok(EngineHandle::new(server))
    }
}
