//! Salesforce MCP - Sales and Service Cloud tools over the Model Context Protocol
//!
//! This is the main entry point: it loads credentials, logs in to Salesforce
//! and serves the tool catalog over stdio or HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use salesforce_mcp::{
    mcp::{http::serve_http, tool_catalog},
    salesforce, ConfigOverrides, McpServer, SalesforceConfig, ToolHandler,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesforce-mcp")]
#[command(about = "MCP server exposing Salesforce Sales and Service Cloud tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Salesforce username (overrides SF_USERNAME)
    #[arg(long, global = true)]
    sf_username: Option<String>,

    /// Salesforce password (overrides SF_PASSWORD)
    #[arg(long, global = true)]
    sf_password: Option<String>,

    /// Salesforce security token (overrides SF_TOKEN)
    #[arg(long, global = true)]
    sf_token: Option<String>,

    /// Login domain: 'login', 'test' or a My Domain prefix (overrides SF_DOMAIN)
    #[arg(long, global = true)]
    sf_domain: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server
    Serve {
        /// Transport to serve on
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,

        /// Bind address for the HTTP transport
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the HTTP transport
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },

    /// Print the tool catalog as JSON
    Tools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use the requested level for this crate, but WARN for noisy HTTP crates
    let filter = EnvFilter::new(format!(
        "salesforce_mcp={},tower_http=info,hyper=warn,reqwest=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries the MCP stream
        .init();

    debug!("salesforce-mcp v{} starting...", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        username: cli.sf_username,
        password: cli.sf_password,
        token: cli.sf_token,
        domain: cli.sf_domain,
    };

    match cli.command {
        Some(Commands::Tools) => {
            println!("{}", serde_json::to_string_pretty(&tool_catalog())?);
            Ok(())
        }
        Some(Commands::Serve {
            transport,
            host,
            port,
        }) => start_server(cli.config, overrides, transport, &host, port).await,
        None => start_server(cli.config, overrides, Transport::Stdio, "127.0.0.1", 3000).await,
    }
}

async fn start_server(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    transport: Transport,
    host: &str,
    port: u16,
) -> Result<()> {
    let config = SalesforceConfig::load(config_path.as_deref(), overrides)
        .context("Failed to load Salesforce configuration")?;
    let session = salesforce::login(&config)
        .await
        .context("Failed to log in to Salesforce")?;
    info!("Connected to {}", session.instance_url());

    let handler = ToolHandler::with_limits(
        Arc::new(session),
        config.max_candidates,
        config.max_list_records,
    );
    let server = McpServer::new(handler);

    match transport {
        Transport::Stdio => {
            tokio::select! {
                result = server.run() => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping MCP server gracefully...");
                }
            }
        }
        Transport::Http => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid listen address '{}:{}': {}", host, port, e))?;
            serve_http(Arc::new(server), addr, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Received shutdown signal, stopping HTTP server gracefully...");
            })
            .await
            .context("HTTP transport failed")?;
        }
    }

    info!("MCP server shut down complete");
    Ok(())
}
