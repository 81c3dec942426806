//! atelierd: serves the Atelier dashboard.
//!
//! # Usage
//!
//! ```text
//! atelierd serve --config atelier.toml --api-url http://localhost:8080
//! ```

use std::path::PathBuf;

use anyhow::Context;
use atelierd::config::{AtelierConfig, Overrides};
use atelierd::{LogFormat, build_app, init_tracing};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "atelierd", about = "Atelier dashboard daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard over HTTP.
    Serve {
        /// Path to atelier.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on, e.g. 0.0.0.0:3001.
        #[arg(long)]
        listen: Option<String>,

        /// Port to listen on; keeps the configured host.
        #[arg(long, conflicts_with = "listen")]
        port: Option<u16>,

        /// Base URL of the Atelier backend API.
        #[arg(long, env = "ATELIER_API_URL")]
        api_url: Option<String>,

        /// API key sent as X-API-Key.
        #[arg(long, env = "ATELIER_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            config,
            listen,
            port,
            api_url,
            api_key,
        } => {
            let mut settings = AtelierConfig::load(config.as_deref())?;
            settings.apply(Overrides {
                listen,
                port,
                api_url,
                api_key,
            });
            serve(settings).await
        }
    }
}

async fn serve(config: AtelierConfig) -> anyhow::Result<()> {
    info!("Atelier dashboard starting");

    let addr = config.listen_addr()?;
    let router = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "dashboard listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(%err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("Atelier dashboard stopped");
    Ok(())
}
