//! Conversion orchestration: load, validate, resolve, authenticate, hand
//! off.
//!
//! Single-shot by design: loader/validator/resolver failures abort the run
//! immediately, and the only recovery loop is the human re-answering a
//! prompt. Engine failures are wrapped with the originating source
//! identifier before propagating.

use crate::address::{self, AddressPrompt};
use crate::client_config;
use crate::engine::{ConversionEngine, ConversionRequest, ServerHandle};
use crate::error::{CoreError, Result};
use crate::loader::DocumentLoader;
use crate::security::{self, CredentialSource};
use crate::validator;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_SERVER_NAME: &str = "OpenAPI MCP Server";

/// Options governing a single conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Explicit base-address override; wins over the document's servers.
    pub base_url: Option<String>,
    /// Timeout for the document fetch and for outbound API calls.
    pub timeout: Duration,
    /// Abort on structural validation errors (the default).
    pub validate: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            validate: true,
        }
    }
}

/// Introspection counts reported after a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub tools: usize,
    pub resources: usize,
    pub templates: usize,
}

/// Sequences the conversion pipeline. One converter per run; nothing in it
/// is safe to share across concurrent conversions.
pub struct Converter {
    loader: DocumentLoader,
    options: ConvertOptions,
}

impl Converter {
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            loader: DocumentLoader::new(options.timeout),
            options,
        }
    }

    /// Run the preparation pipeline without handing off to an engine.
    ///
    /// # Errors
    ///
    /// Propagates loader, validation-abort, and address-resolution
    /// failures.
    pub async fn prepare(
        &self,
        source: &str,
        credentials: &dyn CredentialSource,
        prompt: &dyn AddressPrompt,
    ) -> Result<ConversionRequest> {
        tracing::info!(%source, "starting OpenAPI conversion");
        let document = self.loader.load(source).await?;

        if self.options.validate {
            let result = validator::validate(&document);
            if !result.is_valid {
                return Err(CoreError::ValidationFailed {
                    errors: result.errors,
                });
            }
        } else {
            tracing::warn!("document validation skipped");
        }

        let base_url = address::resolve(&document, self.options.base_url.as_deref(), prompt)?;

        let collected = security::analyze(&document, credentials);
        let client = client_config::build(&collected, self.options.timeout);
        if !collected.is_empty() {
            let schemes: Vec<&str> = collected.keys().map(String::as_str).collect();
            tracing::info!(?schemes, "configured authentication schemes");
        }

        let server_name = document
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SERVER_NAME)
            .to_string();

        Ok(ConversionRequest {
            document,
            base_url,
            client,
            server_name,
        })
    }

    /// Prepare `source` and hand the result to `engine`.
    ///
    /// # Errors
    ///
    /// Propagates preparation failures unmodified; engine failures come
    /// back as [`CoreError::Engine`] carrying the source identifier.
    pub async fn convert<E: ConversionEngine>(
        &self,
        source: &str,
        engine: &E,
        credentials: &dyn CredentialSource,
        prompt: &dyn AddressPrompt,
    ) -> Result<E::Handle> {
        let request = self.prepare(source, credentials, prompt).await?;
        engine
            .convert(request)
            .await
            .map_err(|e| CoreError::Engine {
                source_id: source.to_string(),
                message: format!("{e:#}"),
            })
    }
}

/// Query a handle's introspection surface.
pub async fn summarize(handle: &dyn ServerHandle) -> ConversionSummary {
    ConversionSummary {
        tools: handle.tool_count().await,
        resources: handle.resource_count().await,
        templates: handle.template_count().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
