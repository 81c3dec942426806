//! Dashboard page handlers.
//!
//! Each handler loads API payloads through the shared cache, builds view
//! types and renders an Askama template. Backend failures never fail the
//! page: cached data is shown with a notice, or the page renders empty
//! with an error banner.

use std::future::Future;
use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;

use atelier_api::{
    ApiError, ApiResult, DashboardStats, MetricPoint, MetricsQuery, ResourceType, Tailoring,
};
use atelier_table::Snapshot;

use crate::DashboardState;
use crate::partials::{render_stats, render_table};
use crate::query::{QueryParams, with_query};
use crate::tables;
use crate::views::*;

pub(crate) fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

/// Cache keys, one per backend resource.
pub mod keys {
    pub const STATS: &str = "dashboard/stats";
    pub const ATELIER: &str = "atelier";
    pub const TAILORINGS: &str = "tailorings";
    pub const FIT_PROFILES: &str = "fitprofiles";
    pub const OPENCOST_HEALTH: &str = "opencost/health";
    pub const STRATEGIES: &str = "strategies";
    pub const CLUSTER_SUMMARY: &str = "opencost/analytics/cluster";
    pub const COST_ANALYTICS: &str = "opencost/analytics/costs";
    pub const RESOURCE_ANALYTICS: &str = "opencost/analytics/resources";

    pub fn strategy(name: &str) -> String {
        format!("strategy/{name}")
    }

    pub fn namespace_breakdown(namespace: &str) -> String {
        format!("opencost/namespace/{namespace}")
    }

    pub fn metrics(namespace: &str, target: &str, container: &str, resource: &str, window: &str) -> String {
        format!("metrics/{namespace}/{target}/{container}/{resource}/{window}")
    }

    pub fn tailoring(namespace: &str, name: &str) -> String {
        format!("tailoring/{namespace}/{name}")
    }

    pub fn fit_profile(namespace: &str, name: &str) -> String {
        format!("fitprofile/{namespace}/{name}")
    }

    pub fn opencost_summary(window: &str) -> String {
        format!("opencost/summary/{window}")
    }

    pub fn opencost_namespaces(window: &str) -> String {
        format!("opencost/namespaces/{window}")
    }

    pub fn opencost_controllers(window: &str) -> String {
        format!("opencost/controllers/{window}")
    }
}

/// Fetch through the cache, turning failures into notices.
///
/// A stale value comes back as `Ok` with a notice; the error is returned
/// only when nothing is cached.
pub(crate) async fn load<T, F, Fut>(
    state: &DashboardState,
    key: &str,
    what: &str,
    notices: &mut Vec<Notice>,
    fetch: F,
) -> ApiResult<Arc<T>>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let fetched = state.cache.get_or_fetch(key, fetch).await;
    match (fetched.value, fetched.error) {
        (Some(value), None) => Ok(value),
        (Some(value), Some(err)) => {
            notices.push(Notice::stale(what, &err));
            Ok(value)
        }
        (None, Some(err)) => {
            notices.push(Notice::failed(what, &err));
            Err(err)
        }
        (None, None) => Err(ApiError::NotFound(what.to_string())),
    }
}

/// Wrap payloads as table records.
pub(crate) fn snapshots<T: serde::Serialize + Clone>(
    items: &[T],
    what: &str,
    notices: &mut Vec<Notice>,
) -> Vec<Snapshot<T>> {
    Snapshot::collect(items.iter().cloned()).unwrap_or_else(|err| {
        notices.push(Notice::failed(what, err));
        Vec::new()
    })
}

// ── Overview ────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "overview.html")]
struct OverviewTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    stats_html: String,
    atelier: Option<AtelierView>,
}

pub(crate) async fn load_stats(state: &DashboardState, notices: &mut Vec<Notice>) -> DashboardStats {
    let client = &state.client;
    load(state, keys::STATS, "dashboard statistics", notices, || {
        client.dashboard_stats()
    })
    .await
    .map(|stats| (*stats).clone())
    .unwrap_or_default()
}

pub async fn overview(State(state): State<DashboardState>) -> Html<String> {
    let mut notices = Vec::new();
    let client = &state.client;

    let stats = load_stats(&state, &mut notices).await;
    let atelier = load(&state, keys::ATELIER, "atelier configuration", &mut notices, || {
        client.get_atelier()
    })
    .await
    .ok()
    .map(|summary| AtelierView::from_summary(&summary));

    render(OverviewTemplate {
        active_page: "overview",
        notices,
        stats_html: render_stats(stat_cards(&stats)),
        atelier,
    })
}

// ── List Pages ──────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "list.html")]
struct ListTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    title: &'static str,
    subtitle: &'static str,
    empty: bool,
    empty_title: &'static str,
    empty_hint: &'static str,
    refresh_href: String,
    table_html: String,
}

/// The tailorings table, or `None` when the backend has no tailorings.
pub(crate) async fn tailorings_table_html(
    state: &DashboardState,
    params: &QueryParams,
    notices: &mut Vec<Notice>,
) -> Option<TableHtml> {
    let client = &state.client;
    let loaded = load(state, keys::TAILORINGS, "tailorings", notices, || {
        client.list_tailorings(None)
    })
    .await;
    let records = snapshots(loaded.as_deref().map(Vec::as_slice).unwrap_or_default(), "tailorings", notices);
    if records.is_empty() && loaded.is_ok() {
        return None;
    }

    let table = match tables::tailorings_table() {
        Ok(table) => table,
        Err(err) => {
            notices.push(Notice::failed("tailorings table", err));
            return None;
        }
    };
    let table = {
        let state = params.table_state("", &table);
        table.with_state(state)
    };

    Some(build_table_html(
        &table,
        &records,
        params,
        &TableLinks {
            id: "tailorings-table",
            path: "/tailorings",
            prefix: "",
            empty_message: "No tailorings match the current filters",
            row_href: Some(&tables::tailoring_href),
        },
    ))
}

pub async fn tailorings(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    let table = tailorings_table_html(&state, &params, &mut notices).await;

    render(ListTemplate {
        active_page: "tailorings",
        notices,
        title: "Tailorings",
        subtitle: "Manage resource optimization for your workloads",
        empty: table.is_none(),
        empty_title: "No Tailorings Found",
        empty_hint: "Create a Tailoring to start optimizing your workloads",
        refresh_href: with_query("/partials/tailorings", params.pairs()),
        table_html: table.map(|t| render_table(t, Vec::new())).unwrap_or_default(),
    })
}

/// The fit-profiles table, or `None` when the backend has no profiles.
pub(crate) async fn fit_profiles_table_html(
    state: &DashboardState,
    params: &QueryParams,
    notices: &mut Vec<Notice>,
) -> Option<TableHtml> {
    let client = &state.client;
    let loaded = load(state, keys::FIT_PROFILES, "fit profiles", notices, || {
        client.list_fit_profiles(None)
    })
    .await;
    let records = snapshots(loaded.as_deref().map(Vec::as_slice).unwrap_or_default(), "fit profiles", notices);
    if records.is_empty() && loaded.is_ok() {
        return None;
    }

    let table = match tables::fit_profiles_table() {
        Ok(table) => table,
        Err(err) => {
            notices.push(Notice::failed("fit profiles table", err));
            return None;
        }
    };
    let table = {
        let state = params.table_state("", &table);
        table.with_state(state)
    };

    Some(build_table_html(
        &table,
        &records,
        params,
        &TableLinks {
            id: "fitprofiles-table",
            path: "/fitprofiles",
            prefix: "",
            empty_message: "No fit profiles match the current filters",
            row_href: Some(&tables::fit_profile_href),
        },
    ))
}

pub async fn fit_profiles(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    let table = fit_profiles_table_html(&state, &params, &mut notices).await;

    render(ListTemplate {
        active_page: "fitprofiles",
        notices,
        title: "Fit Profiles",
        subtitle: "Optimization strategies applied by tailorings",
        empty: table.is_none(),
        empty_title: "No Fit Profiles Found",
        empty_hint: "Create a FitProfile to define how workloads are right-sized",
        refresh_href: with_query("/partials/fitprofiles", params.pairs()),
        table_html: table.map(|t| render_table(t, Vec::new())).unwrap_or_default(),
    })
}

// ── Tailoring Detail ────────────────────────────────────────────

#[derive(Template)]
#[template(path = "tailoring_detail.html")]
struct TailoringDetailTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    namespace: String,
    name: String,
    tailoring: Option<TailoringDetailView>,
    usage_window: &'static str,
    usage: Vec<UsageView>,
}

/// Window of the per-container usage summary.
pub const USAGE_WINDOW: &str = "1h";

/// Recent CPU and memory usage of every analysed container.
async fn container_usage(state: &DashboardState, t: &Tailoring) -> Vec<UsageView> {
    let Some(containers) = t
        .status
        .last_analysis
        .as_ref()
        .and_then(|a| a.containers.as_ref())
    else {
        return Vec::new();
    };

    let mut usage = Vec::with_capacity(containers.len());
    for c in containers {
        let cpu = usage_series(state, t, &c.name, ResourceType::Cpu).await;
        let memory = usage_series(state, t, &c.name, ResourceType::Memory).await;
        usage.push(UsageView::new(&c.name, &cpu, &memory));
    }
    usage
}

/// One usage series. A failed query yields an empty series.
async fn usage_series(
    state: &DashboardState,
    t: &Tailoring,
    container: &str,
    resource: ResourceType,
) -> Arc<Vec<MetricPoint>> {
    let query = MetricsQuery {
        namespace: t.metadata.namespace.clone(),
        pod_name_prefix: t.spec.target.name.clone(),
        container_name: container.to_string(),
        resource_type: resource,
        window: Some(USAGE_WINDOW.to_string()),
        per_pod: false,
    };
    let key = keys::metrics(
        &query.namespace,
        &query.pod_name_prefix,
        container,
        resource.as_str(),
        USAGE_WINDOW,
    );
    let client = &state.client;
    state
        .cache
        .get_or_fetch(&key, || client.prometheus_metrics(&query))
        .await
        .value
        .unwrap_or_default()
}

pub async fn tailoring_detail(
    State(state): State<DashboardState>,
    Path((namespace, name)): Path<(String, String)>,
) -> (StatusCode, Html<String>) {
    let mut notices = Vec::new();
    let client = &state.client;
    let loaded = load(
        &state,
        &keys::tailoring(&namespace, &name),
        "tailoring",
        &mut notices,
        || client.get_tailoring(&namespace, &name),
    )
    .await;

    let status = status_for(&loaded);
    let (tailoring, usage) = match loaded {
        Ok(t) => (
            Some(TailoringDetailView::from_tailoring(&t)),
            container_usage(&state, &t).await,
        ),
        Err(_) => (None, Vec::new()),
    };

    (
        status,
        render(TailoringDetailTemplate {
            active_page: "tailorings",
            notices,
            namespace,
            name,
            tailoring,
            usage_window: USAGE_WINDOW,
            usage,
        }),
    )
}

// ── Fit Profile Detail ──────────────────────────────────────────

#[derive(Template)]
#[template(path = "fitprofile_detail.html")]
struct FitProfileDetailTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    namespace: String,
    name: String,
    profile: Option<FitProfileDetailView>,
    strategy: Option<StrategyView>,
}

pub async fn fit_profile_detail(
    State(state): State<DashboardState>,
    Path((namespace, name)): Path<(String, String)>,
) -> (StatusCode, Html<String>) {
    let mut notices = Vec::new();
    let client = &state.client;
    let loaded = load(
        &state,
        &keys::fit_profile(&namespace, &name),
        "fit profile",
        &mut notices,
        || client.get_fit_profile(&namespace, &name),
    )
    .await;

    let status = status_for(&loaded);
    let mut strategy = None;
    let profile = match loaded {
        Ok(p) => {
            let strategy_name = p.spec.strategy.as_str();
            if !strategy_name.is_empty() {
                strategy = load(
                    &state,
                    &keys::strategy(strategy_name),
                    "strategy",
                    &mut notices,
                    || client.get_strategy(strategy_name),
                )
                .await
                .ok()
                .map(|s| StrategyView::from_strategy(&s));
            }
            Some(FitProfileDetailView::from_profile(&p))
        }
        Err(_) => None,
    };

    (
        status,
        render(FitProfileDetailTemplate {
            active_page: "fitprofiles",
            notices,
            namespace,
            name,
            profile,
            strategy,
        }),
    )
}

fn status_for<T>(loaded: &ApiResult<T>) -> StatusCode {
    match loaded {
        Ok(_) => StatusCode::OK,
        Err(ApiError::NotFound(_)) | Err(ApiError::Http { status: 404, .. }) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::BAD_GATEWAY,
    }
}

// ── Costs ───────────────────────────────────────────────────────

/// Why OpenCost pages have nothing to show, or `None` when it is connected.
async fn opencost_gate(state: &DashboardState, notices: &mut Vec<Notice>) -> Option<String> {
    let client = &state.client;
    let health = load(state, keys::OPENCOST_HEALTH, "OpenCost status", notices, || {
        client.opencost_health()
    })
    .await;
    match &health {
        Ok(h) if h.enabled && h.connected => None,
        Ok(h) => Some(opencost_unavailable(h.enabled, h.error.as_deref())),
        Err(err) => Some(opencost_unavailable(true, Some(&err.to_string()))),
    }
}

#[derive(Template)]
#[template(path = "costs.html")]
struct CostsTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    unavailable: Option<String>,
    windows: Vec<WindowOption>,
    cards_html: String,
    namespace_table: String,
    workload_table: String,
}

pub async fn costs(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    let client = &state.client;
    let window = cost_window(&params);
    let unavailable = opencost_gate(&state, &mut notices).await;

    let mut page = CostsTemplate {
        active_page: "costs",
        notices: Vec::new(),
        windows: window_options(&params, "/costs", window),
        unavailable,
        cards_html: String::new(),
        namespace_table: String::new(),
        workload_table: String::new(),
    };
    if page.unavailable.is_some() {
        page.notices = notices;
        return render(page);
    }

    let summary = load(
        &state,
        &keys::opencost_summary(window),
        "cost summary",
        &mut notices,
        || client.opencost_summary(Some(window)),
    )
    .await
    .map(|s| (*s).clone())
    .unwrap_or_default();
    page.cards_html = render_stats(cost_cards(&summary));

    let namespaces = load(
        &state,
        &keys::opencost_namespaces(window),
        "namespace costs",
        &mut notices,
        || client.opencost_namespace_costs(Some(window)),
    )
    .await
    .map(|a| tables::without_idle(&a))
    .unwrap_or_default();

    let controllers = load(
        &state,
        &keys::opencost_controllers(window),
        "workload costs",
        &mut notices,
        || client.opencost_controller_costs(Some(window), None),
    )
    .await
    .map(|a| tables::without_idle(&a))
    .unwrap_or_default();

    let sections = [
        ("ns", "namespace-costs", "Search namespaces...", "No namespace cost data available", namespaces),
        ("wl", "workload-costs", "Search workloads...", "No workload cost data available", controllers),
    ];
    let mut rendered = Vec::with_capacity(sections.len());
    for (prefix, id, placeholder, empty_message, allocations) in sections {
        let records = snapshots(&allocations, "cost allocations", &mut notices);
        let html = match tables::allocations_table(placeholder) {
            Ok(table) => {
                let table_state = params.table_state(prefix, &table);
                let table = table.with_state(table_state);
                render_table(
                    build_table_html(
                        &table,
                        &records,
                        &params,
                        &TableLinks {
                            id,
                            path: "/costs",
                            prefix,
                            empty_message,
                            row_href: None,
                        },
                    ),
                    Vec::new(),
                )
            }
            Err(err) => {
                notices.push(Notice::failed("cost table", err));
                String::new()
            }
        };
        rendered.push(html);
    }
    let mut rendered = rendered.into_iter();
    page.namespace_table = rendered.next().unwrap_or_default();
    page.workload_table = rendered.next().unwrap_or_default();
    page.notices = notices;

    render(page)
}

// ── Atelier ─────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "atelier.html")]
struct AtelierTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    atelier: Option<AtelierView>,
    integrations: Vec<IntegrationView>,
    strategies: Vec<StrategyView>,
}

pub async fn atelier(State(state): State<DashboardState>) -> Html<String> {
    let mut notices = Vec::new();
    let client = &state.client;

    let summary = load(&state, keys::ATELIER, "atelier configuration", &mut notices, || {
        client.get_atelier()
    })
    .await
    .ok();
    let strategies = load(&state, keys::STRATEGIES, "strategies", &mut notices, || {
        client.list_strategies()
    })
    .await
    .map(|list| list.iter().map(StrategyView::from_strategy).collect())
    .unwrap_or_default();

    render(AtelierTemplate {
        active_page: "atelier",
        notices,
        atelier: summary.as_deref().map(AtelierView::from_summary),
        integrations: summary.as_deref().map(integrations).unwrap_or_default(),
        strategies,
    })
}

// ── Analytics ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "analytics.html")]
struct AnalyticsTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    unavailable: Option<String>,
    cluster_html: String,
    utilization_html: String,
    breakdown: Vec<(&'static str, String)>,
    namespace_table: String,
    consumer_lists: Vec<ConsumerList>,
    nodes: Vec<NodeCostView>,
}

pub async fn analytics(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    let client = &state.client;

    let mut page = AnalyticsTemplate {
        active_page: "analytics",
        notices: Vec::new(),
        unavailable: opencost_gate(&state, &mut notices).await,
        cluster_html: String::new(),
        utilization_html: String::new(),
        breakdown: Vec::new(),
        namespace_table: String::new(),
        consumer_lists: Vec::new(),
        nodes: Vec::new(),
    };
    if page.unavailable.is_some() {
        page.notices = notices;
        return render(page);
    }

    let cluster = load(&state, keys::CLUSTER_SUMMARY, "cluster summary", &mut notices, || {
        client.cluster_summary()
    })
    .await
    .unwrap_or_default();
    let costs = load(&state, keys::COST_ANALYTICS, "cost analytics", &mut notices, || {
        client.cost_analytics()
    })
    .await
    .unwrap_or_default();
    let resources = load(
        &state,
        keys::RESOURCE_ANALYTICS,
        "resource analytics",
        &mut notices,
        || client.resource_analytics(),
    )
    .await
    .unwrap_or_default();

    page.cluster_html = render_stats(cluster_cards(&cluster, &costs));
    page.utilization_html = render_stats(utilization_cards(&cluster, &costs));
    page.breakdown = cost_breakdown(&costs);
    page.consumer_lists = vec![
        ConsumerList {
            title: "Top CPU Consumers",
            consumers: top_consumers(&resources.top_cpu_consumers, ResourceType::Cpu),
        },
        ConsumerList {
            title: "Top Memory Consumers",
            consumers: top_consumers(&resources.top_memory_consumers, ResourceType::Memory),
        },
    ];
    page.nodes = node_costs(&costs);

    let records = snapshots(&namespace_usage(&resources, &costs), "namespace usage", &mut notices);
    page.namespace_table = match tables::namespace_usage_table() {
        Ok(table) => {
            let table_state = params.table_state("", &table);
            let table = table.with_state(table_state);
            render_table(
                build_table_html(
                    &table,
                    &records,
                    &params,
                    &TableLinks {
                        id: "namespace-usage",
                        path: "/analytics",
                        prefix: "",
                        empty_message: "No data available",
                        row_href: Some(&tables::namespace_usage_href),
                    },
                ),
                Vec::new(),
            )
        }
        Err(err) => {
            notices.push(Notice::failed("namespace table", err));
            String::new()
        }
    };
    page.notices = notices;

    render(page)
}

#[derive(Template)]
#[template(path = "namespace_analytics.html")]
struct NamespaceAnalyticsTemplate {
    active_page: &'static str,
    notices: Vec<Notice>,
    namespace: String,
    loaded: bool,
    cards_html: String,
    container_table: String,
}

pub async fn namespace_analytics(
    State(state): State<DashboardState>,
    Path(namespace): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    let client = &state.client;

    let loaded = load(
        &state,
        &keys::namespace_breakdown(&namespace),
        "namespace breakdown",
        &mut notices,
        || client.namespace_breakdown(&namespace),
    )
    .await;
    let status = status_for(&loaded);

    let mut page = NamespaceAnalyticsTemplate {
        active_page: "analytics",
        notices: Vec::new(),
        namespace: namespace.clone(),
        loaded: loaded.is_ok(),
        cards_html: String::new(),
        container_table: String::new(),
    };
    if let Ok(breakdown) = loaded {
        page.cards_html = render_stats(namespace_cards(&breakdown));
        let records = snapshots(&breakdown.containers, "containers", &mut notices);
        let path = format!("/analytics/{}", urlencoding::encode(&namespace));
        page.container_table = match tables::container_usage_table() {
            Ok(table) => {
                let table_state = params.table_state("", &table);
                let table = table.with_state(table_state);
                render_table(
                    build_table_html(
                        &table,
                        &records,
                        &params,
                        &TableLinks {
                            id: "container-usage",
                            path: &path,
                            prefix: "",
                            empty_message: "No containers in this namespace",
                            row_href: None,
                        },
                    ),
                    Vec::new(),
                )
            }
            Err(err) => {
                notices.push(Notice::failed("container table", err));
                String::new()
            }
        };
    }
    page.notices = notices;

    (status, render(page))
}
