//! OpenAPI document acquisition.
//!
//! Sources are classified as network-addressed iff they begin with
//! `http://` or `https://`; everything else is treated as a local path.
//! Bodies decode as JSON first with a YAML fallback, so both serializations
//! normalize to the same in-memory document.

use crate::error::{CoreError, Result};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Loads OpenAPI documents from URLs or local files.
///
/// One loader per conversion run; it performs no caching across
/// invocations.
pub struct DocumentLoader {
    client: Client,
    timeout: Duration,
}

impl DocumentLoader {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Load and decode a document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceUnreachable`] when a network fetch fails
    /// or answers non-2xx, [`CoreError::SourceNotFound`] when a local path
    /// is absent, and [`CoreError::Decode`] when neither JSON nor YAML
    /// decoding yields a document mapping.
    pub async fn load(&self, source: &str) -> Result<Value> {
        if is_url(source) {
            self.load_from_url(source).await
        } else {
            self.load_from_file(source)
        }
    }

    async fn load_from_url(&self, url: &str) -> Result<Value> {
        tracing::info!(%url, "fetching OpenAPI document");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CoreError::SourceUnreachable {
                url: url.to_string(),
                message: sanitize_reqwest_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::SourceUnreachable {
                url: url.to_string(),
                message: format!("server answered with status {status}"),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::SourceUnreachable {
                url: url.to_string(),
                message: format!("failed to read response body: {}", sanitize_reqwest_error(&e)),
            })?;

        decode_any(&body, url)
    }

    fn load_from_file(&self, path: &str) -> Result<Value> {
        let file = Path::new(path);
        if !file.exists() {
            return Err(CoreError::SourceNotFound {
                path: path.to_string(),
            });
        }

        tracing::info!(%path, "loading OpenAPI document from file");
        let content = std::fs::read_to_string(file)?;

        match file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => decode_json(&content, path),
            Some("yaml" | "yml") => decode_yaml(&content, path),
            _ => decode_any(&content, path),
        }
    }
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn decode_json(content: &str, location: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(content).map_err(|e| CoreError::Decode {
        location: location.to_string(),
        message: e.to_string(),
    })?;
    require_mapping(value, location)
}

fn decode_yaml(content: &str, location: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| CoreError::Decode {
        location: location.to_string(),
        message: e.to_string(),
    })?;
    require_mapping(value, location)
}

/// JSON first, then YAML. JSON is a YAML subset, but keeping both attempts
/// distinct keeps the reported decode error precise.
fn decode_any(content: &str, location: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return require_mapping(value, location);
    }
    decode_yaml(content, location)
}

fn require_mapping(value: Value, location: &str) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(CoreError::Decode {
            location: location.to_string(),
            message: "decoded document is not a mapping".to_string(),
        })
    }
}

/// Strip credentials/query from URLs embedded in reqwest error messages so
/// they never reach logs.
fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        let mut redacted = u.clone();
        let _ = redacted.set_username("");
        let _ = redacted.set_password(None);
        redacted.set_query(None);
        redacted.set_fragment(None);
        msg = msg.replace(u.as_str(), redacted.as_str());
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JSON_DOC: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "t", "version": "1"},
        "paths": {"/users": {"get": {"operationId": "listUsers"}}}
    }"#;

    const YAML_DOC: &str = r#"
openapi: "3.0.0"
info:
  title: t
  version: "1"
paths:
  /users:
    get:
      operationId: listUsers
"#;

    fn loader() -> DocumentLoader {
        DocumentLoader::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn json_and_yaml_files_yield_equal_documents() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("spec.json");
        let yaml_path = dir.path().join("spec.yaml");
        std::fs::write(&json_path, JSON_DOC).unwrap();
        std::fs::write(&yaml_path, YAML_DOC).unwrap();

        let from_json = loader().load(json_path.to_str().unwrap()).await.unwrap();
        let from_yaml = loader().load(yaml_path.to_str().unwrap()).await.unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("spec.txt");
        std::fs::write(&spec_path, YAML_DOC).unwrap();

        let doc = loader().load(spec_path.to_str().unwrap()).await.unwrap();
        assert_eq!(doc["info"]["title"], "t");
    }

    #[tokio::test]
    async fn missing_file_is_source_not_found() {
        let err = loader().load("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, CoreError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn json_extension_does_not_fall_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("spec.json");
        std::fs::write(&spec_path, YAML_DOC).unwrap();

        let err = loader().load(spec_path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn scalar_document_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("spec.yaml");
        std::fs::write(&spec_path, "just a string").unwrap();

        let err = loader().load(spec_path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn fetches_json_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(JSON_DOC))
            .mount(&server)
            .await;

        let doc = loader()
            .load(&format!("{}/openapi.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(doc["openapi"], "3.0.0");
    }

    #[tokio::test]
    async fn fetches_yaml_body_regardless_of_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(YAML_DOC))
            .mount(&server)
            .await;

        let doc = loader()
            .load(&format!("{}/openapi", server.uri()))
            .await
            .unwrap();
        assert_eq!(doc["paths"]["/users"]["get"]["operationId"], "listUsers");
    }

    #[tokio::test]
    async fn non_success_status_is_source_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/openapi.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SourceUnreachable { .. }));
    }
}
