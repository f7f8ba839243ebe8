//! Structural validation of OpenAPI documents.
//!
//! Checks are advisory and exhaustive: every problem is collected, nothing
//! short-circuits, and the decision to abort on a non-empty error list
//! belongs to the caller.

use serde_json::Value;

/// Declared versions this bridge accepts.
pub const SUPPORTED_VERSIONS: [&str; 5] = ["3.0.0", "3.0.1", "3.0.2", "3.0.3", "3.1.0"];

const REQUIRED_FIELDS: [&str; 3] = ["openapi", "info", "paths"];

/// Outcome of a validation pass. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validate a document's basic structure. Never fails; all problems
/// surface as entries in [`ValidationResult::errors`].
#[must_use]
pub fn validate(doc: &Value) -> ValidationResult {
    let mut errors = Vec::new();

    check_required_fields(doc, &mut errors);
    check_version(doc, &mut errors);
    check_info_section(doc, &mut errors);
    check_paths_section(doc, &mut errors);

    let is_valid = errors.is_empty();
    if is_valid {
        tracing::info!("OpenAPI document passed validation");
    } else {
        tracing::warn!(
            "OpenAPI document failed validation with {} error(s)",
            errors.len()
        );
        for error in &errors {
            tracing::warn!("  - {error}");
        }
    }

    ValidationResult { is_valid, errors }
}

fn check_required_fields(doc: &Value, errors: &mut Vec<String>) {
    for field in REQUIRED_FIELDS {
        if doc.get(field).is_none() {
            errors.push(format!("missing required field: {field}"));
        }
    }
}

fn check_version(doc: &Value, errors: &mut Vec<String>) {
    let Some(version) = doc.get("openapi") else {
        return;
    };
    let supported = version
        .as_str()
        .is_some_and(|v| SUPPORTED_VERSIONS.contains(&v));
    if !supported {
        let shown = version
            .as_str()
            .map_or_else(|| version.to_string(), str::to_string);
        errors.push(format!(
            "unsupported OpenAPI version: {shown} (supported: {})",
            SUPPORTED_VERSIONS.join(", ")
        ));
    }
}

fn check_info_section(doc: &Value, errors: &mut Vec<String>) {
    let Some(info) = doc.get("info") else {
        return;
    };
    let Some(info) = info.as_object() else {
        errors.push("info must be an object".to_string());
        return;
    };
    for field in ["title", "version"] {
        if !info.contains_key(field) {
            errors.push(format!("info section missing required field: {field}"));
        }
    }
}

fn check_paths_section(doc: &Value, errors: &mut Vec<String>) {
    let Some(paths) = doc.get("paths") else {
        return;
    };
    let Some(paths) = paths.as_object() else {
        errors.push("paths must be an object".to_string());
        return;
    };
    if paths.is_empty() {
        errors.push("paths is empty: the document defines no API routes".to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_doc() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Petstore", "version": "1.0.0"},
            "paths": {"/pets": {"get": {}}}
        })
    }

    #[test]
    fn accepts_a_minimal_document() {
        let result = validate(&minimal_doc());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn reports_every_missing_required_field() {
        let result = validate(&json!({}));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
        for field in ["openapi", "info", "paths"] {
            assert!(
                result
                    .errors
                    .iter()
                    .any(|e| e.contains(&format!("missing required field: {field}"))),
                "no error for {field}: {:?}",
                result.errors
            );
        }
    }

    #[test]
    fn unknown_version_is_reported_alongside_other_errors() {
        let result = validate(&json!({"openapi": "2.0", "paths": {"/p": {}}}));
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("unsupported OpenAPI version: 2.0"))
        );
        // The missing `info` is still reported independently.
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("missing required field: info"))
        );
    }

    #[test]
    fn each_supported_version_passes() {
        for version in SUPPORTED_VERSIONS {
            let mut doc = minimal_doc();
            doc["openapi"] = json!(version);
            assert!(validate(&doc).is_valid, "version {version} rejected");
        }
    }

    #[test]
    fn non_string_version_is_reported() {
        let mut doc = minimal_doc();
        doc["openapi"] = json!(3.1);
        let result = validate(&doc);
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("unsupported OpenAPI version"))
        );
    }

    #[test]
    fn info_missing_title_and_version_yields_two_errors() {
        let mut doc = minimal_doc();
        doc["info"] = json!({});
        let result = validate(&doc);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn info_of_wrong_type_is_a_single_error() {
        let mut doc = minimal_doc();
        doc["info"] = json!("not an object");
        let result = validate(&doc);
        assert_eq!(result.errors, vec!["info must be an object".to_string()]);
    }

    #[test]
    fn empty_paths_is_reported() {
        let mut doc = minimal_doc();
        doc["paths"] = json!({});
        let result = validate(&doc);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("paths is empty")));
    }

    #[test]
    fn validation_does_not_mutate_the_document() {
        let doc = minimal_doc();
        let before = doc.clone();
        let _ = validate(&doc);
        assert_eq!(doc, before);
    }
}
