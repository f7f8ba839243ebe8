//! Route discovery: OpenAPI operations become MCP surface entries.
//!
//! Mapping policy: `GET` operations without path parameters become
//! resources, `GET` operations with path parameters become resource
//! templates, and every other operation becomes a tool. Declared parameter
//! and body schemas pass through untouched; `$ref` parameters and cookie
//! parameters are skipped with a diagnostic.

use serde_json::{Map, Value, json};

const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Tool,
    Resource,
    ResourceTemplate,
}

/// Where a parameter goes on the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone)]
pub struct RouteParameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: Value,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestBodySpec {
    pub schema: Value,
    pub required: bool,
}

/// One OpenAPI operation, classified for the MCP surface.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    /// Lowercase HTTP method.
    pub method: String,
    /// Path template, e.g. `/pet/{petId}`.
    pub path: String,
    pub kind: RouteKind,
    pub description: Option<String>,
    pub parameters: Vec<RouteParameter>,
    pub body: Option<RequestBodySpec>,
}

impl Route {
    /// Resource URI exposed for `GET` routes. Path parameters stay as
    /// `{placeholders}`, which makes the template form directly usable as
    /// an RFC 6570 URI template.
    #[must_use]
    pub fn resource_uri(&self) -> String {
        format!("api://{}", self.path.trim_start_matches('/'))
    }

    /// JSON Schema for the tool's arguments: one property per declared
    /// parameter plus an optional `body` property for the JSON request
    /// body.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut schema = param.schema.clone();
            if let (Some(obj), Some(description)) = (schema.as_object_mut(), &param.description) {
                obj.entry("description")
                    .or_insert_with(|| Value::String(description.clone()));
            }
            properties.insert(param.name.clone(), schema);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        if let Some(body) = &self.body {
            properties.insert("body".to_string(), body.schema.clone());
            if body.required {
                required.push(Value::String("body".to_string()));
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }
}

/// Walk the document's path table and classify every operation.
#[must_use]
pub fn discover(document: &Value) -> Vec<Route> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut routes = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared = parse_parameters(path, item.get("parameters"));
        for method in HTTP_METHODS {
            if let Some(operation) = item.get(method).and_then(Value::as_object) {
                routes.push(build_route(path, method, operation, &shared));
            }
        }
    }
    routes
}

fn build_route(
    path: &str,
    method: &str,
    operation: &Map<String, Value>,
    shared: &[RouteParameter],
) -> Route {
    let mut parameters = shared.to_vec();
    for param in parse_parameters(path, operation.get("parameters")) {
        // Operation-level declarations override path-level ones.
        parameters
            .retain(|existing| !(existing.name == param.name && existing.location == param.location));
        parameters.push(param);
    }

    let body = operation
        .get("requestBody")
        .and_then(Value::as_object)
        .and_then(|request_body| {
            let schema = request_body
                .get("content")?
                .get("application/json")?
                .get("schema")?
                .clone();
            Some(RequestBodySpec {
                schema,
                required: request_body
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            })
        });

    let kind = if method == "get" {
        if path.contains('{') {
            RouteKind::ResourceTemplate
        } else {
            RouteKind::Resource
        }
    } else {
        RouteKind::Tool
    };

    let name = operation
        .get("operationId")
        .and_then(Value::as_str)
        .map_or_else(|| canonical_name(method, path), str::to_string);

    let description = operation
        .get("summary")
        .or_else(|| operation.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Route {
        name,
        method: method.to_string(),
        path: path.to_string(),
        kind,
        description,
        parameters,
        body,
    }
}

fn parse_parameters(path: &str, raw: Option<&Value>) -> Vec<RouteParameter> {
    let Some(raw) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut parameters = Vec::new();
    for entry in raw {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        if entry.contains_key("$ref") {
            tracing::debug!(%path, "skipping $ref parameter (references are not resolved)");
            continue;
        }
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        let location = match entry.get("in").and_then(Value::as_str) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            other => {
                tracing::debug!(%path, param = %name, location = ?other, "skipping parameter with unsupported location");
                continue;
            }
        };
        // Path parameters are always required per the OpenAPI spec.
        let required = location == ParamLocation::Path
            || entry
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);

        parameters.push(RouteParameter {
            name: name.to_string(),
            location,
            required,
            schema: entry.get("schema").cloned().unwrap_or_else(|| json!({})),
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    parameters
}

fn canonical_name(method: &str, path: &str) -> String {
    let mut name = method.to_ascii_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        name.push('_');
        name.push_str(&segment.replace(['{', '}'], ""));
    }
    name
}

// ============================================================================
// Tests
// ============================================================================
