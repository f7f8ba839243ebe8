//! MCP server surface and outbound request execution.
//!
//! [`BridgeServer`] exposes the discovered routes over rmcp's
//! `ServerHandler` and executes the corresponding REST calls with a client
//! derived from the prepared [`ClientConfig`]. [`EngineHandle`] wraps a
//! server for the core's hand-off contract and owns transport selection.

use crate::routes::{ParamLocation, Route, RouteKind};
use crate::{EngineError, Result};
use anyhow::Context as _;
use async_trait::async_trait;
use oasbridge_core::client_config::ClientConfig;
use oasbridge_core::engine::ServerHandle;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use rmcp::ServerHandler;
use rmcp::model::{
    Annotated, CallToolRequestParams, CallToolResult, Content, ErrorData as McpError,
    Implementation, JsonObject,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, RawResource, RawResourceTemplate, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ResourceTemplate, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// The MCP server generated from one OpenAPI document.
#[derive(Clone)]
pub struct BridgeServer {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    routes: Vec<Route>,
    http: reqwest::Client,
    base_url: String,
    basic_auth: Option<(String, String)>,
}

impl BridgeServer {
    /// Build a server over `routes` with an HTTP client derived from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured headers or cookies cannot be
    /// represented on an HTTP client.
    pub fn new(
        name: String,
        routes: Vec<Route>,
        base_url: String,
        config: &ClientConfig,
    ) -> Result<Self> {
        let http = build_http_client(config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                name,
                routes,
                http,
                base_url,
                basic_auth: config.basic_auth.clone(),
            }),
        })
    }

    fn routes_of(&self, kind: RouteKind) -> impl Iterator<Item = &Route> {
        self.inner.routes.iter().filter(move |r| r.kind == kind)
    }

    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.routes_of(RouteKind::Tool).count()
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.routes_of(RouteKind::Resource).count()
    }

    #[must_use]
    pub fn template_count(&self) -> usize {
        self.routes_of(RouteKind::ResourceTemplate).count()
    }

    fn tools(&self) -> Vec<Tool> {
        self.routes_of(RouteKind::Tool)
            .map(|route| {
                let schema = route
                    .input_schema()
                    .as_object()
                    .cloned()
                    .unwrap_or_else(JsonObject::new);
                Tool::new(
                    route.name.clone(),
                    route.description.clone().unwrap_or_default(),
                    Arc::new(schema),
                )
            })
            .collect()
    }

    fn resources(&self) -> Vec<Resource> {
        self.routes_of(RouteKind::Resource)
            .map(|route| {
                let mut raw = RawResource::new(route.resource_uri(), route.name.clone());
                raw.description = route.description.clone();
                Annotated::new(raw, None)
            })
            .collect()
    }

    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        self.routes_of(RouteKind::ResourceTemplate)
            .map(|route| {
                let raw = RawResourceTemplate {
                    uri_template: route.resource_uri(),
                    name: route.name.clone(),
                    title: None,
                    description: route.description.clone(),
                    mime_type: None,
                    icons: None,
                };
                Annotated::new(raw, None)
            })
            .collect()
    }

    /// Find the route serving `uri`, extracting template arguments when
    /// the match goes through a resource template.
    fn match_resource(&self, uri: &str) -> Option<(&Route, JsonObject)> {
        if let Some(route) = self.routes_of(RouteKind::Resource).find(|r| r.resource_uri() == uri) {
            return Some((route, JsonObject::new()));
        }
        self.routes_of(RouteKind::ResourceTemplate)
            .find_map(|route| match_template(&route.resource_uri(), uri).map(|args| (route, args)))
    }

    /// Execute the REST call behind `route` with `args`.
    async fn execute(&self, route: &Route, args: &JsonObject) -> Result<Value> {
        let mut path = route.path.clone();
        let mut query: Vec<(String, String)> = Vec::new();
        let mut extra_headers: Vec<(String, String)> = Vec::new();

        for param in &route.parameters {
            let Some(value) = args.get(&param.name) else {
                if param.required {
                    return Err(EngineError::Call(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                continue;
            };
            let rendered = value_to_string(value);
            match param.location {
                ParamLocation::Path => {
                    path = path.replace(&format!("{{{}}}", param.name), &rendered);
                }
                ParamLocation::Query => query.push((param.name.clone(), rendered)),
                ParamLocation::Header => extra_headers.push((param.name.clone(), rendered)),
            }
        }

        let url = format!(
            "{}/{}",
            self.inner.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let url = Url::parse(&url)
            .map_err(|e| EngineError::Call(format!("invalid request URL '{url}': {e}")))?;
        let method = reqwest::Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| EngineError::Call(format!("invalid HTTP method '{}': {e}", route.method)))?;

        tracing::debug!(method = %route.method, url = %redacted(&url), "executing REST call");

        let mut request = self.inner.http.request(method, url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        for (name, value) in extra_headers {
            request = request.header(name, value);
        }
        if let Some((username, password)) = &self.inner.basic_auth {
            request = request.basic_auth(username, Some(password));
        }
        if route.body.is_some()
            && let Some(body) = args.get("body")
        {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Http(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Http(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(200).collect();
            return Err(EngineError::Call(format!(
                "REST call answered with status {status}: {snippet}"
            )));
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

impl ServerHandler for BridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.inner.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Bridge to the '{}' REST API. Tools invoke write operations; resources expose read-only GET routes.",
                self.inner.name
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let route = self
            .routes_of(RouteKind::Tool)
            .find(|r| r.name == *request.name)
            .cloned()
            .ok_or_else(|| {
                McpError::invalid_params(format!("unknown tool '{}'", request.name), None)
            })?;

        let arguments = request.arguments.unwrap_or_default();
        let body = self
            .execute(&route, &arguments)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let text = match body.as_str() {
            Some(s) => s.to_string(),
            None => serde_json::to_string(&body).unwrap_or_else(|_| body.to_string()),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: self.resources(),
            ..Default::default()
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            resource_templates: self.resource_templates(),
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, McpError> {
        let (route, args) = self.match_resource(&request.uri).ok_or_else(|| {
            McpError::invalid_params(format!("unknown resource '{}'", request.uri), None)
        })?;
        let route = route.clone();

        let body = self
            .execute(&route, &args)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let text = match body.as_str() {
            Some(s) => s.to_string(),
            None => serde_json::to_string(&body).unwrap_or_else(|_| body.to_string()),
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri.clone())],
        })
    }
}

/// Wraps a [`BridgeServer`] for the core's hand-off contract.
pub struct EngineHandle {
    server: BridgeServer,
}

impl EngineHandle {
    #[must_use]
    pub fn new(server: BridgeServer) -> Self {
        Self { server }
    }
}

#[async_trait]
impl ServerHandle for EngineHandle {
    async fn tool_count(&self) -> usize {
        self.server.tool_count()
    }

    async fn resource_count(&self) -> usize {
        self.server.resource_count()
    }

    async fn template_count(&self) -> usize {
        self.server.template_count()
    }

    async fn run(self: Box<Self>, transport: &str, host: &str, port: u16) -> anyhow::Result<()> {
        match transport {
            "streamable-http" => serve_streamable_http(self.server, host, port).await,
            "stdio" => serve_stdio(self.server).await,
            other => anyhow::bail!(
                "unsupported transport '{other}' (expected 'streamable-http' or 'stdio')"
            ),
        }
    }
}

async fn serve_streamable_http(server: BridgeServer, host: &str, port: u16) -> anyhow::Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("bind {host}:{port}"))?;
    tracing::info!("serving MCP over streamable HTTP on http://{host}:{port}/mcp (Ctrl+C stops)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn serve_stdio(server: BridgeServer) -> anyhow::Result<()> {
    use rmcp::ServiceExt as _;

    tracing::info!("serving MCP over stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("start stdio transport")?;
    service.waiting().await?;
    Ok(())
}

fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| EngineError::Config(format!("invalid header name '{name}': {e}")))?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|e| EngineError::Config(format!("invalid value for header '{name}': {e}")))?;
        header_value.set_sensitive(true);
        headers.insert(header, header_value);
    }

    if !config.cookies.is_empty() {
        let cookie = config
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        let mut header_value = HeaderValue::from_str(&cookie)
            .map_err(|e| EngineError::Config(format!("invalid cookie value: {e}")))?;
        header_value.set_sensitive(true);
        headers.insert(COOKIE, header_value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()
        .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))
}

/// Match `uri` against a `{placeholder}` template, capturing placeholder
/// values as string arguments.
fn match_template(template: &str, uri: &str) -> Option<JsonObject> {
    let template_parts: Vec<&str> = template.split('/').collect();
    let uri_parts: Vec<&str> = uri.split('/').collect();
    if template_parts.len() != uri_parts.len() {
        return None;
    }

    let mut args = JsonObject::new();
    for (part, actual) in template_parts.iter().zip(&uri_parts) {
        if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            args.insert(name.to_string(), Value::String((*actual).to_string()));
        } else if part != actual {
            return None;
        }
    }
    Some(args)
}

/// Convert a JSON value to its string form for URL/header parameters.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn redacted(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::discover;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plain_config() -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(5),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            basic_auth: None,
        }
    }

    fn petstore_server(base_url: &str, config: &ClientConfig) -> BridgeServer {
        let doc = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ]
                    },
                    "post": {
                        "operationId": "addPet",
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"type": "object"}}}
                        }
                    }
                },
                "/pets/{petId}": {
                    "get": {
                        "operationId": "getPet",
                        "parameters": [
                            {"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}}
                        ]
                    }
                }
            }
        });
        BridgeServer::new(
            "Petstore".to_string(),
            discover(&doc),
            base_url.to_string(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn counts_reflect_route_kinds() {
        let server = petstore_server("https://example.com", &plain_config());
        assert_eq!(server.tool_count(), 1);
        assert_eq!(server.resource_count(), 1);
        assert_eq!(server.template_count(), 1);
    }

    #[test]
    fn template_matching_extracts_arguments() {
        let args = match_template("api://pets/{petId}", "api://pets/42").unwrap();
        assert_eq!(args.get("petId"), Some(&json!("42")));

        assert!(match_template("api://pets/{petId}", "api://stores/42").is_none());
        assert!(match_template("api://pets/{petId}", "api://pets/42/toys").is_none());
    }

    #[test]
    fn match_resource_prefers_exact_resources() {
        let server = petstore_server("https://example.com", &plain_config());
        let (route, args) = server.match_resource("api://pets").unwrap();
        assert_eq!(route.name, "listPets");
        assert!(args.is_empty());

        let (route, args) = server.match_resource("api://pets/7").unwrap();
        assert_eq!(route.name, "getPet");
        assert_eq!(args.get("petId"), Some(&json!("7")));
    }

    #[tokio::test]
    async fn execute_substitutes_path_parameters() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pets/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": 42}"#))
            .mount(&api)
            .await;

        let server = petstore_server(&api.uri(), &plain_config());
        let route = server
            .routes_of(RouteKind::ResourceTemplate)
            .next()
            .unwrap()
            .clone();
        let mut args = JsonObject::new();
        args.insert("petId".to_string(), json!(42));

        let body = server.execute(&route, &args).await.unwrap();
        assert_eq!(body, json!({"id": 42}));
    }

    #[tokio::test]
    async fn execute_sends_query_parameters_and_configured_headers() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pets"))
            .and(query_param("limit", "10"))
            .and(header("X-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&api)
            .await;

        let mut config = plain_config();
        config
            .headers
            .insert("X-Key".to_string(), "secret".to_string());
        let server = petstore_server(&api.uri(), &config);
        let route = server.routes_of(RouteKind::Resource).next().unwrap().clone();
        let mut args = JsonObject::new();
        args.insert("limit".to_string(), json!(10));

        let body = server.execute(&route, &args).await.unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn execute_posts_json_bodies() {
        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pets"))
            .and(body_json(json!({"name": "rex"})))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 1}"#))
            .mount(&api)
            .await;

        let server = petstore_server(&api.uri(), &plain_config());
        let route = server.routes_of(RouteKind::Tool).next().unwrap().clone();
        let mut args = JsonObject::new();
        args.insert("body".to_string(), json!({"name": "rex"}));

        let body = server.execute(&route, &args).await.unwrap();
        assert_eq!(body, json!({"id": 1}));
    }

    #[tokio::test]
    async fn execute_reports_missing_required_parameters() {
        let server = petstore_server("https://example.com", &plain_config());
        let route = server
            .routes_of(RouteKind::ResourceTemplate)
            .next()
            .unwrap()
            .clone();

        let err = server.execute(&route, &JsonObject::new()).await.unwrap_err();
        assert!(err.to_string().contains("petId"));
    }

    #[tokio::test]
    async fn execute_surfaces_non_success_statuses() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pets"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&api)
            .await;

        let server = petstore_server(&api.uri(), &plain_config());
        let route = server.routes_of(RouteKind::Resource).next().unwrap().clone();

        let err = server.execute(&route, &JsonObject::new()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn execute_sends_cookies_and_basic_auth() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pets"))
            .and(header("Cookie", "session=abc"))
            // user:pass
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&api)
            .await;

        let mut config = plain_config();
        config
            .cookies
            .insert("session".to_string(), "abc".to_string());
        config.basic_auth = Some(("user".to_string(), "pass".to_string()));
        let server = petstore_server(&api.uri(), &config);
        let route = server.routes_of(RouteKind::Resource).next().unwrap().clone();

        let body = server.execute(&route, &JsonObject::new()).await.unwrap();
        assert_eq!(body, json!([]));
    }
}
