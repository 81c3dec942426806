//! The dashboard router driven request by request, backend unreachable.

use std::time::Duration;

use atelier_api::{
    ApiClient, AtelierSummary, ClusterResourceSummary, CostAnalytics, NamespaceResourceBreakdown,
    OpenCostHealthStatus, ResourceAnalytics, ResourceCache, Strategy, TailoringSummary,
};
use atelier_dashboard::pages::keys;
use atelier_dashboard::{DashboardState, dashboard_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn offline_state() -> DashboardState {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ApiClient::new(&format!("http://{addr}"))
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    DashboardState::new(client, ResourceCache::new(Duration::from_secs(300)))
}

async fn get_page(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn seed(state: &DashboardState) {
    let cache = &state.cache;
    cache
        .insert(
            keys::ATELIER,
            AtelierSummary {
                name: "atelier".into(),
                git_provider_type: "github".into(),
                git_provider_connected: true,
                open_cost_enabled: true,
                open_cost_connected: true,
                open_cost_url: Some("http://opencost:9003".into()),
                ..Default::default()
            },
        )
        .await;
    cache
        .insert(
            keys::STRATEGIES,
            vec![Strategy {
                name: "peak".into(),
                description: "Size for observed peaks".into(),
                ..Default::default()
            }],
        )
        .await;
    cache
        .insert(
            keys::OPENCOST_HEALTH,
            OpenCostHealthStatus {
                connected: true,
                enabled: true,
                error: None,
            },
        )
        .await;
    cache
        .insert(
            keys::CLUSTER_SUMMARY,
            ClusterResourceSummary {
                total_nodes: 3,
                total_cpu_cores: 24.0,
                ..Default::default()
            },
        )
        .await;
    cache
        .insert(
            keys::COST_ANALYTICS,
            CostAnalytics {
                cost_by_namespace: [("shop".to_string(), 0.42)].into(),
                ..Default::default()
            },
        )
        .await;
    cache
        .insert(keys::RESOURCE_ANALYTICS, ResourceAnalytics::default())
        .await;
    cache
        .insert(
            keys::namespace_breakdown("shop"),
            NamespaceResourceBreakdown {
                namespace: "shop".into(),
                ..Default::default()
            },
        )
        .await;
    cache
        .insert(
            keys::TAILORINGS,
            vec![TailoringSummary {
                name: "cart".into(),
                namespace: "shop".into(),
                ..Default::default()
            }],
        )
        .await;
}

#[tokio::test]
async fn atelier_route() {
    let state = offline_state();
    seed(&state).await;
    let (status, body) = get_page(dashboard_router(state), "/atelier").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Atelier Configuration"));
    assert!(body.contains("github"));
    assert!(body.contains("http://opencost:9003"));
    assert!(body.contains("Size for observed peaks"));
    assert!(body.contains(r#"href="/atelier" class="active""#));
}

#[tokio::test]
async fn analytics_routes() {
    let state = offline_state();
    seed(&state).await;
    let app = dashboard_router(state);

    let (status, body) = get_page(app.clone(), "/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("24.0 cores"));
    assert!(body.contains("/analytics/shop"));
    assert!(body.contains("$0.4200"));

    let (status, body) = get_page(app, "/analytics/shop").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No containers in this namespace"));
}

#[tokio::test]
async fn costs_route_ignores_unknown_window() {
    let state = offline_state();
    seed(&state).await;
    let cache = state.cache.clone();

    let (status, body) = get_page(dashboard_router(state), "/costs?window=forever").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<strong>Last 7 Days</strong>"));

    // Only the default window was attempted; nothing keyed by the bogus value.
    for key in [
        keys::opencost_summary("forever"),
        keys::opencost_namespaces("forever"),
        keys::opencost_controllers("forever"),
    ] {
        assert!(!cache.invalidate(&key).await);
    }
}

#[tokio::test]
async fn tailorings_partial_route() {
    let state = offline_state();
    seed(&state).await;
    let (status, body) = get_page(dashboard_router(state), "/partials/tailorings?q=cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/tailorings/shop/cart"));
    assert!(!body.contains("<nav>"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = get_page(dashboard_router(offline_state()), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
