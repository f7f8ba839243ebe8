//! OpenAPI -> MCP conversion core.
//!
//! This crate owns the parts of the bridge with actual decision logic:
//! document acquisition and normalization, structural validation,
//! security-scheme discovery and credential collection, HTTP client
//! configuration, and base-address resolution.
//!
//! The engine that turns a prepared document into a running MCP server is a
//! collaborator behind [`engine::ConversionEngine`]; this crate never
//! depends on a concrete engine.

pub mod address;
pub mod client_config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod loader;
pub mod security;
pub mod validator;
