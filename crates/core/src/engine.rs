//! Boundary to the conversion engine.
//!
//! The engine turns a prepared document plus client configuration into a
//! running MCP server. It is an external collaborator from this crate's
//! point of view: only the narrow interface below is relied upon, and the
//! engine's route-mapping behavior is opaque here.

use crate::client_config::ClientConfig;
use async_trait::async_trait;
use serde_json::Value;

/// Everything the engine needs to build a server.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Normalized OpenAPI document.
    pub document: Value,
    /// Resolved REST API base address.
    pub base_url: String,
    /// HTTP client configuration applied to every outbound call.
    pub client: ClientConfig,
    /// Display name for the generated server (from `info.title`).
    pub server_name: String,
}

/// A runnable server produced by the engine.
#[async_trait]
pub trait ServerHandle: Send + Sync {
    async fn tool_count(&self) -> usize;
    async fn resource_count(&self) -> usize;
    async fn template_count(&self) -> usize;

    /// Serve until shutdown. `transport` is an opaque identifier passed
    /// through unmodified; `host`/`port` only apply to network transports.
    async fn run(self: Box<Self>, transport: &str, host: &str, port: u16) -> anyhow::Result<()>;
}

/// The conversion engine contract.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    type Handle: ServerHandle;

    async fn convert(&self, request: ConversionRequest) -> anyhow::Result<Self::Handle>;
}
