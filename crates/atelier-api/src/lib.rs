//! atelier-api: client for the Atelier backend REST API.
//!
//! [`ApiClient`] fetches tailorings, fit profiles, strategies, dashboard
//! statistics, Prometheus series and OpenCost data. Every endpoint answers
//! with an [`ApiResponse`] envelope; list endpoints treat a missing payload
//! as empty, lookups by name turn it into [`ApiError::NotFound`].
//!
//! [`ResourceCache`] keeps the last payload per resource for a TTL so the
//! dashboard does not hit the backend on every page view.

pub mod cache;
pub mod client;
pub mod envelope;
pub mod error;
pub mod types;

pub use cache::{DEFAULT_TTL, Fetched, Lookup, ResourceCache};
pub use client::{ApiClient, DEFAULT_AGGREGATE, DEFAULT_TIMEOUT, DEFAULT_WINDOW};
pub use envelope::ApiResponse;
pub use error::{ApiError, ApiResult};
pub use types::*;
