//! Error types for `oasbridge-core`.

use thiserror::Error;

/// Main error type for the conversion core.
///
/// Declined or unsupported authentication schemes are deliberately not
/// represented here: they degrade to "no credential" with a diagnostic and
/// never abort a run.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A network source could not be fetched, or answered with a
    /// non-success status.
    #[error("failed to fetch OpenAPI document from '{url}': {message}")]
    SourceUnreachable { url: String, message: String },

    /// A local source path does not exist.
    #[error("OpenAPI document not found: {path}")]
    SourceNotFound { path: String },

    /// Neither JSON nor YAML decoding produced a document mapping.
    #[error("failed to decode OpenAPI document from '{location}': {message}")]
    Decode { location: String, message: String },

    /// Structural validation reported errors and the caller opted to abort
    /// (the default).
    #[error("OpenAPI document failed validation with {} error(s)", errors.len())]
    ValidationFailed { errors: Vec<String> },

    /// Prompting is unavailable and no base address could be determined.
    #[error("no API base address available: the document declares no servers and prompting is disabled")]
    NoAddressAvailable,

    /// The conversion engine failed; wrapped with the originating source
    /// identifier for context.
    #[error("conversion failed for '{source_id}': {message}")]
    Engine { source_id: String, message: String },

    /// IO errors (local document reads).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
