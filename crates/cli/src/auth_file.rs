//! Non-interactive credential source backed by a JSON file.
//!
//! The file maps scheme names to credential entries in the same tagged
//! form as [`CredentialRecord`]:
//!
//! ```json
//! {
//!   "bearerAuth": {"type": "bearer", "token": "..."},
//!   "keyAuth": {"type": "apiKey", "name": "X-Key", "value": "...", "in": "header"}
//! }
//! ```
//!
//! Schemes absent from the file are declined, which the analyzer treats as
//! "no credential" rather than an error.

use oasbridge_core::security::{CredentialRecord, CredentialSource, SecurityScheme};
use std::collections::BTreeMap;
use std::path::Path;

pub struct FileCredentialSource {
    records: BTreeMap<String, CredentialRecord>,
}

impl FileCredentialSource {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let records = serde_json::from_slice(&bytes)?;
        Ok(Self { records })
    }
}

impl CredentialSource for FileCredentialSource {
    fn provide(&self, scheme_name: &str, _scheme: &SecurityScheme) -> Option<CredentialRecord> {
        let record = self.records.get(scheme_name).cloned();
        if record.is_none() {
            tracing::debug!(scheme = %scheme_name, "no credential configured in auth file; skipping");
        }
        record
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oasbridge_core::security::ApiKeyLocation;

    fn bearer_scheme() -> SecurityScheme {
        serde_json::from_value(serde_json::json!({"type": "http", "scheme": "bearer"})).unwrap()
    }

    #[test]
    fn answers_from_the_file_and_declines_missing_schemes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(
            &path,
            r#"{
                "bearerAuth": {"type": "bearer", "token": "tok"},
                "keyAuth": {"type": "apiKey", "name": "X-Key", "value": "v", "in": "cookie"}
            }"#,
        )
        .unwrap();

        let source = FileCredentialSource::load(&path).unwrap();
        assert_eq!(
            source.provide("bearerAuth", &bearer_scheme()),
            Some(CredentialRecord::HttpBearer {
                token: "tok".to_string()
            })
        );
        assert_eq!(
            source.provide("keyAuth", &bearer_scheme()),
            Some(CredentialRecord::ApiKey {
                name: "X-Key".to_string(),
                value: "v".to_string(),
                location: ApiKeyLocation::Cookie,
            })
        );
        assert_eq!(source.provide("ghost", &bearer_scheme()), None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileCredentialSource::load(&path).is_err());
    }
}
