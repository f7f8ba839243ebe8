//! HTTP client configuration derived from collected credentials.

use crate::security::{ApiKeyLocation, CredentialRecord};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration applied to every outbound call to the wrapped REST API.
///
/// At most one basic-auth pair survives; when several schemes supply one,
/// the last writer in scheme-name order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub basic_auth: Option<(String, String)>,
}

/// Merge collected credentials into one client configuration.
///
/// Pure and infallible: malformed records cannot occur here, they were
/// filtered upstream. Each credential contributes independently; when two
/// schemes write the same header or cookie key, the later scheme name in
/// map order wins (a documented collision, not an error).
///
/// Query-located API keys are deliberately not applied: a shared client
/// cannot carry per-request query parameters, so attaching them is the
/// conversion engine's job.
#[must_use]
pub fn build(
    credentials: &BTreeMap<String, CredentialRecord>,
    timeout: Duration,
) -> ClientConfig {
    let mut headers = BTreeMap::new();
    let mut cookies = BTreeMap::new();
    let mut basic_auth = None;

    for (scheme_name, record) in credentials {
        match record {
            CredentialRecord::ApiKey {
                name,
                value,
                location,
            } => match location {
                ApiKeyLocation::Header => {
                    headers.insert(name.clone(), value.clone());
                }
                ApiKeyLocation::Cookie => {
                    cookies.insert(name.clone(), value.clone());
                }
                ApiKeyLocation::Query => {
                    tracing::warn!(
                        scheme = %scheme_name,
                        param = %name,
                        "query-located API key is not applied to the shared HTTP client; it must be attached per request"
                    );
                }
            },
            CredentialRecord::HttpBearer { token } | CredentialRecord::OAuth2 { token } => {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
            CredentialRecord::HttpBasic { username, password } => {
                basic_auth = Some((username.clone(), password.clone()));
            }
        }
    }

    ClientConfig {
        timeout,
        headers,
        cookies,
        basic_auth,
    }
}

// ============================================================================
// Tests
// ============================================================================
