//! atelier-dashboard: server-rendered web UI for Atelier.
//!
//! Provides axum route handlers that render HTML pages from the Atelier
//! backend API. List pages are [`atelier_table::DataTable`]s whose search,
//! filter and sort state lives in the query string, so every view is a
//! plain link.
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `/` | Overview |
//! | `/tailorings` | Tailoring list |
//! | `/tailorings/{ns}/{name}` | Tailoring detail |
//! | `/fitprofiles` | Fit profile list |
//! | `/fitprofiles/{ns}/{name}` | Fit profile detail |
//! | `/costs` | OpenCost breakdown |
//! | `/analytics` | Cluster resource and cost analytics |
//! | `/analytics/{ns}` | Per-container usage of one namespace |
//! | `/atelier` | Atelier configuration and strategies |
//! | `/partials/...` | HTMX table fragments |
//! | `/healthz` | Liveness |

pub mod pages;
pub mod partials;
pub mod query;
pub mod tables;
pub mod views;

use std::sync::Arc;

use atelier_api::{ApiClient, ResourceCache};
use axum::Router;
use axum::routing::get;

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub client: ApiClient,
    pub cache: Arc<ResourceCache>,
}

impl DashboardState {
    pub fn new(client: ApiClient, cache: ResourceCache) -> Self {
        Self {
            client,
            cache: Arc::new(cache),
        }
    }
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::overview))
        .route("/tailorings", get(pages::tailorings))
        .route("/tailorings/{ns}/{name}", get(pages::tailoring_detail))
        .route("/fitprofiles", get(pages::fit_profiles))
        .route("/fitprofiles/{ns}/{name}", get(pages::fit_profile_detail))
        .route("/costs", get(pages::costs))
        .route("/analytics", get(pages::analytics))
        .route("/analytics/{ns}", get(pages::namespace_analytics))
        .route("/atelier", get(pages::atelier))
        .route("/partials/tailorings", get(partials::tailorings_table))
        .route("/partials/fitprofiles", get(partials::fit_profiles_table))
        .route("/partials/stats", get(partials::overview_stats))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}
