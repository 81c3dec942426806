//! ApiClient against an in-process mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use atelier_api::*;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

/// Requests seen by the mock: `(path-and-query, x-api-key)`.
type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

fn record(seen: &Seen, route: &str, query: &HashMap<String, String>, headers: &HeaderMap) {
    let mut pairs: Vec<_> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((format!("{route}?{}", pairs.join("&")), key));
}

fn mock_backend(seen: Seen) -> Router {
    Router::new()
        .route(
            "/api/v1/tailorings",
            get(
                |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>, headers: HeaderMap| async move {
                    record(&seen, "tailorings", &q, &headers);
                    Json(json!({
                        "success": true,
                        "data": [
                            {"name": "api", "namespace": "prod", "fitProfile": "cost-saver", "containerCount": 2},
                            {"name": "web", "namespace": "prod", "intent": "balanced"}
                        ]
                    }))
                },
            ),
        )
        .route(
            "/api/v1/tailorings/{ns}/{name}",
            get(|Path((ns, name)): Path<(String, String)>| async move {
                if name == "missing" {
                    Json(json!({"success": true}))
                } else {
                    Json(json!({
                        "success": true,
                        "data": {"metadata": {"name": name, "namespace": ns}, "spec": {"target": {"kind": "Deployment", "name": "api"}}}
                    }))
                }
            }),
        )
        .route(
            "/api/v1/fitprofiles",
            get(|| async { Json(json!({"success": true})) }),
        )
        .route(
            "/api/v1/strategies/{name}",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": "strategy registry unavailable"})),
                )
            }),
        )
        .route(
            "/api/v1/atelier",
            get(|| async { Json(json!({"success": false, "message": "not configured"})) }),
        )
        .route(
            "/api/v1/dashboard/stats",
            get(|| async { Json(json!({"success": true, "data": {"totalTailorings": 4, "openPRs": 1}})) }),
        )
        .route(
            "/api/v1/opencost/summary",
            get(|| async { "this is not json" }),
        )
        .route(
            "/api/v1/opencost/controllers",
            get(
                |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>, headers: HeaderMap| async move {
                    record(&seen, "controllers", &q, &headers);
                    Json(json!({"success": true, "data": [{"name": "api", "controllerKind": "deployment", "totalCost": 12.5}]}))
                },
            ),
        )
        .route(
            "/api/v1/opencost/allocations",
            get(
                |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>, headers: HeaderMap| async move {
                    record(&seen, "allocations", &q, &headers);
                    Json(json!({"success": true, "data": []}))
                },
            ),
        )
        .route(
            "/api/v1/prometheus/metrics",
            get(
                |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>, headers: HeaderMap| async move {
                    record(&seen, "metrics", &q, &headers);
                    Json(json!({"success": true, "data": [{"timestamp": 1700000000000i64, "value": 0.25, "pod": "api-1"}]}))
                },
            ),
        )
        .route(
            "/api/v1/opencost/namespace/{ns}",
            get(|| async { Json(json!({"success": true})) }),
        )
        .route(
            "/api/v1/opencost/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"success": true, "data": {"connected": true, "enabled": true}}))
            }),
        )
        .with_state(seen)
}

async fn spawn_backend() -> (ApiClient, Seen) {
    let seen: Seen = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = mock_backend(seen.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = ApiClient::new(&format!("http://{addr}")).unwrap();
    (client, seen)
}

#[tokio::test]
async fn list_tailorings_decodes_and_sends_key() {
    let (client, seen) = spawn_backend().await;
    let client = client.with_api_key(Some("secret".into()));

    let rows = client.list_tailorings(Some("prod")).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].profile_name(), Some("cost-saver"));
    assert_eq!(rows[1].profile_name(), Some("balanced"));
    assert_eq!(rows[0].container_count, 2);

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[0],
        ("tailorings?namespace=prod".to_string(), Some("secret".to_string()))
    );
}

#[tokio::test]
async fn get_tailoring_and_not_found() {
    let (client, _) = spawn_backend().await;

    let tailoring = client.get_tailoring("prod", "api").await.unwrap();
    assert_eq!(tailoring.metadata.name, "api");
    assert_eq!(tailoring.spec.target.kind, "Deployment");

    let err = client.get_tailoring("prod", "missing").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn missing_list_data_is_empty() {
    let (client, _) = spawn_backend().await;
    assert!(client.list_fit_profiles(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_carries_message() {
    let (client, _) = spawn_backend().await;
    let err = client.get_strategy("right-size").await.unwrap_err();
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("strategy registry unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Unknown route: axum's 404 without an envelope.
    let err = client.list_strategies().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, message: None }));
}

#[tokio::test]
async fn unsuccessful_envelope_is_api_error() {
    let (client, _) = spawn_backend().await;
    let err = client.get_atelier().await.unwrap_err();
    assert!(matches!(err, ApiError::Api(m) if m == "not configured"));
}

#[tokio::test]
async fn partial_stats_fill_zeroes() {
    let (client, _) = spawn_backend().await;
    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_tailorings, 4);
    assert_eq!(stats.open_prs, 1);
    assert_eq!(stats.merged_prs, 0);
}

#[tokio::test]
async fn undecodable_body_is_decode_error() {
    let (client, _) = spawn_backend().await;
    let err = client.opencost_summary(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn opencost_defaults_and_namespace() {
    let (client, seen) = spawn_backend().await;

    client.opencost_allocations(None, None).await.unwrap();
    let controllers = client
        .opencost_controller_costs(Some("24h"), Some("prod"))
        .await
        .unwrap();
    assert_eq!(controllers[0].controller_kind.as_deref(), Some("deployment"));
    assert_eq!(controllers[0].total_cost, 12.5);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, "allocations?aggregate=namespace&window=7d");
    assert_eq!(seen[1].0, "controllers?namespace=prod&window=24h");
    assert_eq!(seen[0].1, None);
}

#[tokio::test]
async fn metrics_query_parameters() {
    let (client, seen) = spawn_backend().await;
    let points = client
        .prometheus_metrics(&MetricsQuery {
            namespace: "prod".into(),
            pod_name_prefix: "api-".into(),
            container_name: "app".into(),
            resource_type: ResourceType::Memory,
            window: None,
            per_pod: true,
        })
        .await
        .unwrap();
    assert_eq!(points[0].pod.as_deref(), Some("api-1"));

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[0].0,
        "metrics?containerName=app&namespace=prod&perPod=true&podNamePrefix=api-&resourceType=memory"
    );
}

#[tokio::test]
async fn namespace_breakdown_defaults_to_requested_namespace() {
    let (client, _) = spawn_backend().await;
    let breakdown = client.namespace_breakdown("batch").await.unwrap();
    assert_eq!(breakdown.namespace, "batch");
    assert!(breakdown.containers.is_empty());
}

#[tokio::test]
async fn slow_backend_times_out() {
    let (client, _) = spawn_backend().await;
    let client = client.with_timeout(Duration::from_millis(100));
    let err = client.opencost_health().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
}

#[tokio::test]
async fn unreachable_backend_is_connect_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}")).unwrap();
    let err = client.list_tailorings(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Connect(_)));
}

#[tokio::test]
async fn cache_serves_stale_when_backend_goes_away() {
    let (client, _) = spawn_backend().await;
    let cache = ResourceCache::new(Duration::ZERO);

    let first = cache
        .get_or_fetch("stats", || client.dashboard_stats())
        .await;
    assert_eq!(first.value.unwrap().total_tailorings, 4);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = ApiClient::new(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let second = cache.get_or_fetch("stats", || dead.dashboard_stats()).await;
    assert!(second.stale);
    assert_eq!(second.value.unwrap().total_tailorings, 4);
    assert!(matches!(second.error, Some(ApiError::Connect(_))));
}
