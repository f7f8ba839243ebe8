//! oasbridge CLI entrypoint.
//!
//! Wires the conversion core to the default rmcp engine: parses arguments,
//! selects interactive or non-interactive credential/address sources, runs
//! the conversion, and serves until shutdown. All prompts and logs go to
//! stderr so the stdio transport keeps stdout for the protocol.

mod auth_file;
mod console;

use anyhow::Context as _;
use clap::Parser;
use oasbridge_core::address::{AddressPrompt, NoPrompt};
use oasbridge_core::convert::{ConvertOptions, Converter, summarize};
use oasbridge_core::engine::ServerHandle as _;
use oasbridge_core::security::{CredentialSource, NoCredentials};
use oasbridge_engine::RmcpEngine;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oasbridge", version, about = "Serve an OpenAPI-described REST API as MCP tools and resources")]
struct Cli {
    /// OpenAPI document source: an http(s) URL or a local file path.
    /// Prompted for when omitted in interactive mode.
    source: Option<String>,

    /// Override the REST API base URL (wins over the document's servers).
    #[arg(long, env = "OASBRIDGE_BASE_URL")]
    base_url: Option<String>,

    /// MCP server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// MCP server port.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// MCP transport ("streamable-http" or "stdio").
    #[arg(long, default_value = "streamable-http")]
    transport: String,

    /// HTTP timeout in seconds (document fetch and API calls).
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Proceed even when structural validation reports errors.
    #[arg(long)]
    skip_validation: bool,

    /// JSON file mapping scheme names to credentials (non-interactive
    /// authentication).
    #[arg(long, env = "OASBRIDGE_AUTH_FILE")]
    auth_file: Option<PathBuf>,

    /// Never prompt; fail instead of asking for missing input.
    #[arg(long)]
    non_interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match cli.source {
        Some(source) => source,
        None if cli.non_interactive => {
            anyhow::bail!("an OpenAPI document source is required in non-interactive mode")
        }
        None => console::prompt_source()?,
    };

    let converter = Converter::new(ConvertOptions {
        base_url: cli.base_url,
        timeout: Duration::from_secs(cli.timeout),
        validate: !cli.skip_validation,
    });

    let credentials: Box<dyn CredentialSource> = match &cli.auth_file {
        Some(path) => Box::new(
            auth_file::FileCredentialSource::load(path)
                .with_context(|| format!("load auth file {}", path.display()))?,
        ),
        None if cli.non_interactive => Box::new(NoCredentials),
        None => Box::new(console::ConsoleCredentialSource),
    };
    let prompt: Box<dyn AddressPrompt> = if cli.non_interactive {
        Box::new(NoPrompt)
    } else {
        Box::new(console::ConsoleAddressPrompt)
    };

    let engine = RmcpEngine::new();
    let handle = converter
        .convert(&source, &engine, credentials.as_ref(), prompt.as_ref())
        .await?;

    let summary = summarize(&handle).await;
    tracing::info!(
        tools = summary.tools,
        resources = summary.resources,
        templates = summary.templates,
        "MCP server ready"
    );

    Box::new(handle).run(&cli.transport, &cli.host, cli.port).await
}
