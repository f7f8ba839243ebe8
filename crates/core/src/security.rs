//! Security-scheme discovery and credential collection.
//!
//! The analyzer extracts the schemes a document declares, works out which
//! of them a client actually needs, and asks a [`CredentialSource`] for
//! each. Declined and unsupported schemes degrade to "no credential" with
//! a diagnostic; they are never errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

impl fmt::Display for ApiKeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeyLocation::Header => write!(f, "header"),
            ApiKeyLocation::Query => write!(f, "query"),
            ApiKeyLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// A security scheme declared under `components.securitySchemes`.
///
/// Declarations with an unrecognized `type` (or a malformed body) fail
/// typed extraction and are treated as unsupported rather than erroring.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        #[serde(default)]
        description: Option<String>,
    },
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(default)]
        description: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        #[serde(default)]
        flows: BTreeMap<String, Value>,
        #[serde(default)]
        description: Option<String>,
    },
}

/// A concrete credential supplied for one security scheme.
///
/// Records live only for the duration of client-configuration
/// construction and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CredentialRecord {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        value: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    #[serde(rename = "bearer")]
    HttpBearer { token: String },
    #[serde(rename = "basic")]
    HttpBasic { username: String, password: String },
    #[serde(rename = "oauth2")]
    OAuth2 { token: String },
}

/// Pluggable credential collection capability.
///
/// Implementations may drive a console prompt, read a config file, or
/// return canned answers in tests. Returning `None` declines the scheme;
/// a decline is silent by contract.
pub trait CredentialSource {
    fn provide(&self, scheme_name: &str, scheme: &SecurityScheme) -> Option<CredentialRecord>;
}

/// A source that declines every scheme (non-interactive runs without
/// configured credentials).
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn provide(&self, scheme_name: &str, _scheme: &SecurityScheme) -> Option<CredentialRecord> {
        tracing::debug!(scheme = %scheme_name, "no credential source configured; skipping");
        None
    }
}

/// Collect one credential per required security scheme.
///
/// Required schemes are the union of names across the document's global
/// `security` requirements; when that union is empty every declared scheme
/// is treated as potentially required. Names required but never declared
/// are skipped silently (the requirement references an undefined scheme).
pub fn analyze(doc: &Value, source: &dyn CredentialSource) -> BTreeMap<String, CredentialRecord> {
    let declared = declared_schemes(doc);
    let required = required_scheme_names(doc, &declared);

    if declared.is_empty() && required.is_empty() {
        tracing::info!("document declares no security configuration; assuming no authentication");
        return BTreeMap::new();
    }

    describe_schemes(&declared);

    let mut credentials = BTreeMap::new();
    for name in required {
        let Some(raw) = declared.get(&name) else {
            tracing::debug!(scheme = %name, "required security scheme is not declared; skipping");
            continue;
        };

        let scheme = match serde_json::from_value::<SecurityScheme>(raw.clone()) {
            Ok(scheme) => scheme,
            Err(_) => {
                let declared_type = raw
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                tracing::warn!(scheme = %name, scheme_type = %declared_type, "unsupported security scheme; skipping");
                continue;
            }
        };

        if let SecurityScheme::Http {
            scheme: http_scheme,
            ..
        } = &scheme
        {
            let lowered = http_scheme.to_ascii_lowercase();
            if lowered != "bearer" && lowered != "basic" {
                tracing::warn!(scheme = %name, http_scheme = %http_scheme, "unsupported HTTP authentication scheme; skipping");
                continue;
            }
        }

        if let Some(record) = source.provide(&name, &scheme) {
            credentials.insert(name, record);
        }
    }

    credentials
}

fn declared_schemes(doc: &Value) -> BTreeMap<String, Value> {
    doc.get("components")
        .and_then(|c| c.get("securitySchemes"))
        .and_then(Value::as_object)
        .map(|schemes| {
            schemes
                .iter()
                .map(|(name, raw)| (name.clone(), raw.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn required_scheme_names(doc: &Value, declared: &BTreeMap<String, Value>) -> BTreeSet<String> {
    let mut required: BTreeSet<String> = BTreeSet::new();
    if let Some(requirements) = doc.get("security").and_then(Value::as_array) {
        for requirement in requirements {
            if let Some(entry) = requirement.as_object() {
                required.extend(entry.keys().cloned());
            }
        }
    }

    if required.is_empty() {
        // The document does not scope security explicitly; treat every
        // declared scheme as potentially required.
        required.extend(declared.keys().cloned());
    }

    required
}

fn describe_schemes(declared: &BTreeMap<String, Value>) {
    if declared.is_empty() {
        return;
    }
    tracing::info!("document declares {} security scheme(s):", declared.len());
    for (name, raw) in declared {
        let declared_type = raw.get("type").and_then(Value::as_str).unwrap_or("unknown");
        match declared_type {
            "apiKey" => {
                let key = raw.get("name").and_then(Value::as_str).unwrap_or("?");
                let location = raw.get("in").and_then(Value::as_str).unwrap_or("?");
                tracing::info!("  {name}: apiKey '{key}' in {location}");
            }
            "http" => {
                let http_scheme = raw.get("scheme").and_then(Value::as_str).unwrap_or("?");
                tracing::info!("  {name}: http ({http_scheme})");
            }
            "oauth2" => {
                let flows: Vec<&str> = raw
                    .get("flows")
                    .and_then(Value::as_object)
                    .map(|f| f.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                tracing::info!("  {name}: oauth2 (flows: {})", flows.join(", "));
            }
            other => tracing::info!("  {name}: {other}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
