//! Interactive console implementations of the core prompting capabilities.
//!
//! Everything is written to stderr: stdout may be carrying the MCP stdio
//! transport. An empty answer declines a credential; declines are handled
//! upstream as "no credential", never as errors.

use oasbridge_core::address::{AddressPrompt, AddressRetry};
use oasbridge_core::security::{CredentialRecord, CredentialSource, SecurityScheme};
use std::io::{self, BufRead as _, Write as _};

/// Ask for the OpenAPI document source until a non-empty answer arrives.
pub fn prompt_source() -> anyhow::Result<String> {
    eprintln!("Enter the OpenAPI document source:");
    eprintln!("  - URL:        https://api.example.com/openapi.json");
    eprintln!("  - local file: ./openapi.json");
    loop {
        let answer = read_answer("source")?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        eprintln!("a document source is required");
    }
}

fn read_answer(prompt: &str) -> io::Result<String> {
    {
        let mut err = io::stderr().lock();
        write!(err, "{prompt}: ")?;
        err.flush()?;
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn announce(scheme_name: &str, kind: &str, description: Option<&str>) {
    eprintln!();
    eprintln!("--- {scheme_name} ({kind}) ---");
    if let Some(description) = description {
        eprintln!("{description}");
    }
}

/// Collects credentials by prompting on the console.
pub struct ConsoleCredentialSource;

impl CredentialSource for ConsoleCredentialSource {
    fn provide(&self, scheme_name: &str, scheme: &SecurityScheme) -> Option<CredentialRecord> {
        match scheme {
            SecurityScheme::ApiKey {
                name,
                location,
                description,
            } => {
                announce(scheme_name, "apiKey", description.as_deref());
                eprintln!("key '{name}' is sent in the {location} (empty answer skips)");
                let value = read_answer(&format!("value for '{name}'")).ok()?;
                (!value.is_empty()).then(|| CredentialRecord::ApiKey {
                    name: name.clone(),
                    value,
                    location: *location,
                })
            }
            SecurityScheme::Http {
                scheme: http_scheme,
                description,
            } => match http_scheme.to_ascii_lowercase().as_str() {
                "bearer" => {
                    announce(scheme_name, "http bearer", description.as_deref());
                    let token = read_answer("bearer token (empty answer skips)").ok()?;
                    (!token.is_empty()).then_some(CredentialRecord::HttpBearer { token })
                }
                "basic" => {
                    announce(scheme_name, "http basic", description.as_deref());
                    let username = read_answer("username (empty answer skips)").ok()?;
                    let password = read_answer("password (empty answer skips)").ok()?;
                    (!username.is_empty() && !password.is_empty())
                        .then_some(CredentialRecord::HttpBasic { username, password })
                }
                // The analyzer filters unsupported sub-schemes before asking.
                _ => None,
            },
            SecurityScheme::OAuth2 { flows, description } => {
                announce(scheme_name, "oauth2", description.as_deref());
                if !flows.is_empty() {
                    let names: Vec<&str> = flows.keys().map(String::as_str).collect();
                    eprintln!("declared flows: {} (a pre-issued token is used as-is)", names.join(", "));
                }
                let token = read_answer("access token (empty answer skips)").ok()?;
                (!token.is_empty()).then_some(CredentialRecord::OAuth2 { token })
            }
        }
    }
}

/// Asks for the REST API base address on the console.
pub struct ConsoleAddressPrompt;

impl AddressPrompt for ConsoleAddressPrompt {
    fn request_address(&self, retry: AddressRetry) -> Option<String> {
        match retry {
            AddressRetry::NoServers => {
                eprintln!();
                eprintln!("The document does not declare an API server.");
                eprintln!(
                    "Enter the REST API base URL (e.g. https://api.example.com or http://localhost:3000)."
                );
            }
            AddressRetry::EmptyInput => eprintln!("the base URL must not be empty"),
            AddressRetry::InvalidFormat => {
                eprintln!("the base URL must start with http:// or https://");
            }
        }
        read_answer("base URL").ok()
    }
}
