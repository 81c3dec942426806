//! atelierd: the Atelier dashboard daemon.
//!
//! Loads configuration, builds the API client and response cache, and
//! serves the dashboard router.

pub mod config;

use std::time::Duration;

use anyhow::Context;
use atelier_api::{ApiClient, ResourceCache};
use atelier_dashboard::{DashboardState, dashboard_router};
use axum::Router;
use tracing::info;

use crate::config::AtelierConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,atelierd=debug,atelier=debug";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Build the dashboard state described by `config`.
pub fn build_state(config: &AtelierConfig) -> anyhow::Result<DashboardState> {
    let timeout: Duration = config.api_timeout()?;
    let ttl = config.cache_ttl()?;

    let client = ApiClient::new(&config.api.url)
        .with_context(|| format!("invalid api url {:?}", config.api.url))?
        .with_api_key(config.api.api_key.clone())
        .with_timeout(timeout);

    info!(
        api = client.address(),
        timeout_ms = timeout.as_millis() as u64,
        ttl_ms = ttl.as_millis() as u64,
        "api client configured"
    );

    Ok(DashboardState::new(client, ResourceCache::new(ttl)))
}

pub fn build_app(config: &AtelierConfig) -> anyhow::Result<Router> {
    Ok(dashboard_router(build_state(config)?))
}
