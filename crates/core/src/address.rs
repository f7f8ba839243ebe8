//! REST API base-address resolution.
//!
//! Precedence is total and strictly ordered: explicit override, then the
//! document's first `servers` entry, then interactive prompting. The
//! prompt loops until a syntactically valid absolute URL arrives; empty
//! and malformed answers re-prompt with distinguishable reasons.

use crate::error::{CoreError, Result};
use serde_json::Value;

/// Why an address prompt is being (re-)issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRetry {
    /// The document has no usable `servers` entry and no override was
    /// given; this is the initial ask.
    NoServers,
    /// The previous answer was empty.
    EmptyInput,
    /// The previous answer did not start with `http://` or `https://`.
    InvalidFormat,
}

/// Pluggable address prompting capability.
pub trait AddressPrompt {
    /// Ask for a base address. `None` means prompting is unavailable
    /// (non-interactive deployment).
    fn request_address(&self, retry: AddressRetry) -> Option<String>;
}

/// A prompt for non-interactive contexts; always unavailable.
pub struct NoPrompt;

impl AddressPrompt for NoPrompt {
    fn request_address(&self, _retry: AddressRetry) -> Option<String> {
        None
    }
}

/// Whether `address` is acceptable as an API base address.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    address.starts_with("http://") || address.starts_with("https://")
}

/// Determine the REST API base address for `doc`.
///
/// # Errors
///
/// Returns [`CoreError::NoAddressAvailable`] only when no address can be
/// determined and `prompt` reports itself unavailable.
pub fn resolve(
    doc: &Value,
    override_url: Option<&str>,
    prompt: &dyn AddressPrompt,
) -> Result<String> {
    if let Some(url) = override_url.filter(|u| !u.is_empty()) {
        tracing::info!(%url, "using explicitly configured base address");
        return Ok(url.to_string());
    }

    if let Some(url) = first_server_url(doc) {
        tracing::info!(%url, "using base address from the document's servers");
        return Ok(url);
    }

    tracing::warn!("document has no usable servers entry; a base address must be supplied");
    let mut retry = AddressRetry::NoServers;
    loop {
        let Some(answer) = prompt.request_address(retry) else {
            return Err(CoreError::NoAddressAvailable);
        };
        let answer = answer.trim().to_string();
        if answer.is_empty() {
            retry = AddressRetry::EmptyInput;
        } else if !is_valid_address(&answer) {
            retry = AddressRetry::InvalidFormat;
        } else {
            tracing::info!(url = %answer, "using interactively supplied base address");
            return Ok(answer);
        }
    }
}

fn first_server_url(doc: &Value) -> Option<String> {
    doc.get("servers")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
