//! AI Factory CLI entry point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ai_factory::adapters::{HttpTransport, StdioTransport, Transport, TransportKind};
use ai_factory::config::Config;
use ai_factory::gateway::Gateway;
use ai_factory::mcp::McpServer;
use ai_factory::ui;

/// Slack on top of the provider deadline before an HTTP request is cut off.
const HTTP_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "ai-factory")]
#[command(about = "AI Factory - one MCP tool surface over Gemini, Claude, OpenAI and Copilot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Stdio,

    /// Serve MCP over HTTP
    Http {
        /// Listen port (defaults to HTTP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show provider status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ai_factory::config::load()?;

    // stdout belongs to the stdio transport
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    ctrlc::set_handler(|| {
        eprintln!("\nShutting down");
        std::process::exit(0);
    })
    .ok();

    match cli.command {
        Some(Commands::Status) => run_status(&config),
        Some(Commands::Stdio) => run_transport(&config, TransportKind::Stdio, None).await,
        Some(Commands::Http { port }) => run_transport(&config, TransportKind::Http, port).await,
        None => {
            let kind: TransportKind = config.transport.parse()?;
            run_transport(&config, kind, None).await
        }
    }
}

async fn run_transport(config: &Config, kind: TransportKind, port: Option<u16>) -> Result<()> {
    let gateway = Arc::new(Gateway::from_config(config));

    let available = gateway.registry.list_available();
    tracing::info!(
        "Starting {} transport ({}) with {}/{} providers configured{}",
        kind,
        kind.description(),
        available.len(),
        gateway.registry.list_all().len(),
        if gateway.brain.is_available() { ", brain enabled" } else { "" }
    );

    let server = Arc::new(McpServer::new(gateway));
    match kind {
        TransportKind::Stdio => StdioTransport::new(server).serve().await?,
        TransportKind::Http => {
            let port = port.unwrap_or(config.http_port);
            let token = Some(config.auth_token.clone());
            let deadline = Duration::from_millis(config.request_timeout_ms) + HTTP_GRACE;
            HttpTransport::new(server, port, token, deadline).serve().await?
        }
    }

    Ok(())
}

fn run_status(config: &Config) -> Result<()> {
    let gateway = Gateway::from_config(config);

    ui::print_header(&config.transport);
    println!();
    ui::print_provider_table(&gateway.registry.status());
    println!();

    ui::print_step(&format!("Config: {}", ai_factory::config::config_path().display()));
    ui::print_step(&format!("Request timeout: {}ms", config.request_timeout_ms));

    if gateway.brain.is_available() {
        ui::print_success("AI Brain available");
    } else {
        ui::print_warning("AI Brain not configured (set AI_BRAIN_PATH)");
    }

    if gateway.registry.list_available().is_empty() {
        ui::print_warning("No providers configured. Set GEMINI_API_KEY, ANTHROPIC_API_KEY or OPENAI_API_KEY");
    }

    Ok(())
}
