//! HTTP client for the Atelier backend.
//!
//! Thin wrapper over a shared [`reqwest::Client`] (rustls, so both `http`
//! and `https` base URLs work). Every response is an [`ApiResponse`] envelope.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::types::*;

/// Default OpenCost window.
pub const DEFAULT_WINDOW: &str = "7d";
/// Default OpenCost aggregation.
pub const DEFAULT_AGGREGATE: &str = "namespace";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("atelier-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    /// `scheme://host[:port]` of the base URL.
    origin: String,
    /// `host:port` the client connects to.
    address: String,
    /// Path prefix of the base URL, without a trailing slash.
    base_path: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for a base URL such as `http://localhost:8080` or
    /// `https://atelier.example.com/backend`.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ApiError::InvalidUrl(format!(
                    "{base_url}: unsupported scheme {other:?}"
                )));
            }
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ApiError::InvalidUrl(format!("{base_url}: missing host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ApiError::InvalidUrl(format!("{base_url}: missing port")))?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Request(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            origin: url.origin().ascii_serialization(),
            address: format!("{host}:{port}"),
            base_path: url.path().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Send `X-API-Key` with every request. Empty keys are ignored.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` this client connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── Tailorings ─────────────────────────────────────────────────

    pub async fn list_tailorings(&self, namespace: Option<&str>) -> ApiResult<Vec<TailoringSummary>> {
        let query = namespace_query(namespace);
        Ok(self
            .get("/api/v1/tailorings", &query)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_tailoring(&self, namespace: &str, name: &str) -> ApiResult<Tailoring> {
        let path = format!("/api/v1/tailorings/{}/{}", segment(namespace), segment(name));
        self.get(&path, &[])
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("tailoring {namespace}/{name}")))
    }

    // ── Fit profiles ───────────────────────────────────────────────

    pub async fn list_fit_profiles(&self, namespace: Option<&str>) -> ApiResult<Vec<FitProfile>> {
        let query = namespace_query(namespace);
        Ok(self
            .get("/api/v1/fitprofiles", &query)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_fit_profile(&self, namespace: &str, name: &str) -> ApiResult<FitProfile> {
        let path = format!("/api/v1/fitprofiles/{}/{}", segment(namespace), segment(name));
        self.get(&path, &[])
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("fit profile {namespace}/{name}")))
    }

    // ── Strategies ─────────────────────────────────────────────────

    pub async fn list_strategies(&self) -> ApiResult<Vec<Strategy>> {
        Ok(self.get("/api/v1/strategies", &[]).await?.unwrap_or_default())
    }

    pub async fn get_strategy(&self, name: &str) -> ApiResult<Strategy> {
        let path = format!("/api/v1/strategies/{}", segment(name));
        self.get(&path, &[])
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("strategy {name}")))
    }

    // ── Atelier / dashboard ────────────────────────────────────────

    pub async fn get_atelier(&self) -> ApiResult<AtelierSummary> {
        self.get("/api/v1/atelier", &[])
            .await?
            .ok_or_else(|| ApiError::NotFound("atelier".to_string()))
    }

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        Ok(self
            .get("/api/v1/dashboard/stats", &[])
            .await?
            .unwrap_or_default())
    }

    // ── Prometheus ─────────────────────────────────────────────────

    pub async fn prometheus_metrics(&self, query: &MetricsQuery) -> ApiResult<Vec<MetricPoint>> {
        let mut params = vec![
            ("namespace", query.namespace.as_str()),
            ("podNamePrefix", query.pod_name_prefix.as_str()),
            ("containerName", query.container_name.as_str()),
            ("resourceType", query.resource_type.as_str()),
        ];
        if query.per_pod {
            params.push(("perPod", "true"));
        }
        if let Some(window) = query.window.as_deref().filter(|w| !w.is_empty()) {
            params.push(("window", window));
        }
        Ok(self
            .get("/api/v1/prometheus/metrics", &params)
            .await?
            .unwrap_or_default())
    }

    // ── OpenCost ───────────────────────────────────────────────────

    pub async fn opencost_allocations(
        &self,
        window: Option<&str>,
        aggregate: Option<&str>,
    ) -> ApiResult<Vec<OpenCostAllocation>> {
        let params = [
            ("window", window.unwrap_or(DEFAULT_WINDOW)),
            ("aggregate", aggregate.unwrap_or(DEFAULT_AGGREGATE)),
        ];
        Ok(self
            .get("/api/v1/opencost/allocations", &params)
            .await?
            .unwrap_or_default())
    }

    pub async fn opencost_summary(&self, window: Option<&str>) -> ApiResult<OpenCostSummary> {
        let params = [("window", window.unwrap_or(DEFAULT_WINDOW))];
        Ok(self
            .get("/api/v1/opencost/summary", &params)
            .await?
            .unwrap_or_default())
    }

    pub async fn opencost_namespace_costs(
        &self,
        window: Option<&str>,
    ) -> ApiResult<Vec<OpenCostAllocation>> {
        let params = [("window", window.unwrap_or(DEFAULT_WINDOW))];
        Ok(self
            .get("/api/v1/opencost/namespaces", &params)
            .await?
            .unwrap_or_default())
    }

    pub async fn opencost_controller_costs(
        &self,
        window: Option<&str>,
        namespace: Option<&str>,
    ) -> ApiResult<Vec<OpenCostAllocation>> {
        let mut params = vec![("window", window.unwrap_or(DEFAULT_WINDOW))];
        params.extend(namespace_query(namespace));
        Ok(self
            .get("/api/v1/opencost/controllers", &params)
            .await?
            .unwrap_or_default())
    }

    pub async fn opencost_health(&self) -> ApiResult<OpenCostHealthStatus> {
        Ok(self
            .get("/api/v1/opencost/health", &[])
            .await?
            .unwrap_or_default())
    }

    pub async fn resource_analytics(&self) -> ApiResult<ResourceAnalytics> {
        Ok(self
            .get("/api/v1/opencost/analytics/resources", &[])
            .await?
            .unwrap_or_default())
    }

    pub async fn cost_analytics(&self) -> ApiResult<CostAnalytics> {
        Ok(self
            .get("/api/v1/opencost/analytics/costs", &[])
            .await?
            .unwrap_or_default())
    }

    pub async fn cluster_summary(&self) -> ApiResult<ClusterResourceSummary> {
        Ok(self
            .get("/api/v1/opencost/analytics/cluster", &[])
            .await?
            .unwrap_or_default())
    }

    pub async fn namespace_breakdown(&self, namespace: &str) -> ApiResult<NamespaceResourceBreakdown> {
        let path = format!("/api/v1/opencost/namespace/{}", segment(namespace));
        Ok(self
            .get::<NamespaceResourceBreakdown>(&path, &[])
            .await?
            .unwrap_or_else(|| NamespaceResourceBreakdown {
                namespace: namespace.to_string(),
                ..Default::default()
            }))
    }

    // ── Transport ──────────────────────────────────────────────────

    /// GET `path` and unwrap the envelope. `Ok(None)` means the backend
    /// reported success without a payload.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Option<T>> {
        let target = self.target(path, query);
        let body = self.send(&target).await?;

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("{target}: {e}")))?;
        envelope.into_result()
    }

    /// Origin-form request target: base path, route, query string.
    fn target(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut target = format!("{}{path}", self.base_path);
        for (i, (key, value)) in query.iter().enumerate() {
            target.push(if i == 0 { '?' } else { '&' });
            target.push_str(&urlencoding::encode(key));
            target.push('=');
            target.push_str(&urlencoding::encode(value));
        }
        target
    }

    async fn send(&self, target: &str) -> ApiResult<Vec<u8>> {
        let url = format!("{}{target}", self.origin);
        let mut request = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        debug!(%target, "API request");
        let resp = request
            .send()
            .await
            .map_err(|e| self.transport_error(target, e))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(target, e))?;

        if !status.is_success() {
            debug!(%status, %target, "API non-2xx");
            let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.error.or(env.message));
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body.to_vec())
    }

    fn transport_error(&self, target: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            warn!(%target, timeout = ?self.timeout, "API request timed out");
            ApiError::Timeout(self.timeout)
        } else if err.is_connect() {
            debug!(error = %err, address = %self.address, "API connection failed");
            ApiError::Connect(format!("{}: {err}", self.address))
        } else {
            ApiError::Request(format!("{target}: {err}"))
        }
    }
}

fn namespace_query(namespace: Option<&str>) -> Vec<(&'static str, &str)> {
    namespace
        .filter(|ns| !ns.is_empty())
        .map(|ns| vec![("namespace", ns)])
        .unwrap_or_default()
}

fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_url() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(client.address(), "localhost:8080");
        assert_eq!(client.target("/api/v1/atelier", &[]), "/api/v1/atelier");
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn default_port_and_base_path() {
        let client = ApiClient::new("http://atelier.internal/backend/").unwrap();
        assert_eq!(client.address(), "atelier.internal:80");
        assert_eq!(
            client.target("/api/v1/strategies", &[]),
            "/backend/api/v1/strategies"
        );
    }

    #[test]
    fn accepts_http_and_https() {
        let plain = ApiClient::new("http://atelier.internal").unwrap();
        assert_eq!(plain.address(), "atelier.internal:80");
        assert_eq!(plain.origin, "http://atelier.internal");

        let tls = ApiClient::new("https://atelier.example.com/backend").unwrap();
        assert_eq!(tls.address(), "atelier.example.com:443");
        assert_eq!(tls.origin, "https://atelier.example.com");
        assert_eq!(tls.target("/api/v1/atelier", &[]), "/backend/api/v1/atelier");

        let custom = ApiClient::new("https://atelier.example.com:8443").unwrap();
        assert_eq!(custom.address(), "atelier.example.com:8443");
        assert_eq!(custom.origin, "https://atelier.example.com:8443");
    }

    #[test]
    fn rejects_unsupported_urls() {
        assert!(matches!(
            ApiClient::new("ftp://example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(ApiClient::new("localhost"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(ApiClient::new("file:///tmp/x"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn query_is_percent_encoded() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.target("/x", &[("window", "7d"), ("namespace", "a b&c")]),
            "/x?window=7d&namespace=a%20b%26c"
        );
    }

    #[test]
    fn empty_api_key_is_ignored() {
        let client = ApiClient::new("http://localhost:8080")
            .unwrap()
            .with_api_key(Some(String::new()));
        assert!(client.api_key.is_none());
    }

    #[test]
    fn namespace_query_skips_empty() {
        assert!(namespace_query(None).is_empty());
        assert!(namespace_query(Some("")).is_empty());
        assert_eq!(namespace_query(Some("prod")), vec![("namespace", "prod")]);
    }
}
