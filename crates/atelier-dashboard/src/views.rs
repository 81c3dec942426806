//! View types passed to Askama templates.
//!
//! These are plain structs with pre-formatted strings so templates stay
//! free of logic.

use std::collections::BTreeSet;

use atelier_api::{
    AtelierSummary, ClusterResourceSummary, ContainerAnalysis, CostAnalytics, DashboardStats,
    FitProfile, MetricPoint, NamespaceResourceBreakdown, OpenCostSummary, ResourceAnalytics,
    ResourceConsumer, ResourceType, Strategy, Tailoring,
};
use atelier_table::{Cell, DataTable, Record, SortDirection};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::{ParamNames, QueryParams};

// ── Data Table ──────────────────────────────────────────────────

/// One rendered data table: headers with sort links, filter dropdowns,
/// active-filter chips and the visible rows.
#[derive(Debug, Clone)]
pub struct TableHtml {
    /// Element id; also the HTMX swap target.
    pub id: String,
    /// Form action and base of every link.
    pub path: String,
    pub searchable: bool,
    pub search_name: String,
    pub search: String,
    pub search_placeholder: String,
    /// Parameters the filter form must carry through unchanged.
    pub hidden: Vec<(String, String)>,
    pub headers: Vec<HeaderHtml>,
    pub filters: Vec<FilterHtml>,
    pub chips: Vec<ChipHtml>,
    pub clear_all_href: Option<String>,
    pub rows: Vec<RowHtml>,
    pub shown: usize,
    pub total: usize,
    pub empty_message: String,
}

impl TableHtml {
    pub fn summary(&self) -> String {
        if self.shown == self.total {
            format!("{} {}", self.total, plural(self.total, "row", "rows"))
        } else {
            format!("Showing {} of {}", self.shown, self.total)
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderHtml {
    pub label: String,
    /// Link applying the toggled sort; `None` for unsortable columns.
    pub href: Option<String>,
    pub indicator: &'static str,
    pub aria_sort: &'static str,
}

#[derive(Debug, Clone)]
pub struct FilterHtml {
    pub name: String,
    pub label: String,
    pub options: Vec<OptionHtml>,
    /// Nothing selected; the "All" choice is current.
    pub all_selected: bool,
}

#[derive(Debug, Clone)]
pub struct OptionHtml {
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct ChipHtml {
    pub label: String,
    pub value: String,
    pub clear_href: String,
}

#[derive(Debug, Clone)]
pub struct RowHtml {
    pub href: Option<String>,
    pub cells: Vec<Cell>,
}

/// Where a table lives and how its rows link out.
pub struct TableLinks<'a, R> {
    pub id: &'a str,
    pub path: &'a str,
    pub prefix: &'a str,
    pub empty_message: &'a str,
    pub row_href: Option<&'a dyn Fn(&R) -> String>,
}

/// Derive the table's view over `records` and turn it into template data.
pub fn build_table_html<R: Record>(
    table: &DataTable<R>,
    records: &[R],
    params: &QueryParams,
    links: &TableLinks<'_, R>,
) -> TableHtml {
    let view = table.view(records);
    let state = table.state();
    let names = ParamNames::new(links.prefix);

    let headers = table
        .columns()
        .iter()
        .map(|column| {
            let direction = view.sort_indicator(column.key());
            HeaderHtml {
                label: column.label().to_string(),
                href: table
                    .state_after_sort_click(column.key())
                    .map(|next| params.href(links.path, links.prefix, &next)),
                indicator: match direction {
                    Some(SortDirection::Ascending) => "▲",
                    Some(SortDirection::Descending) => "▼",
                    None => "",
                },
                aria_sort: match direction {
                    Some(SortDirection::Ascending) => "ascending",
                    Some(SortDirection::Descending) => "descending",
                    None => "none",
                },
            }
        })
        .collect();

    let filters = view
        .filters
        .iter()
        .map(|control| FilterHtml {
            name: names.filter_param(&control.key),
            label: control.label.clone(),
            options: control
                .options
                .iter()
                .map(|value| OptionHtml {
                    selected: control.selected.as_deref() == Some(value.as_str()),
                    value: value.clone(),
                })
                .collect(),
            all_selected: control.selected.is_none(),
        })
        .collect();

    let chips = view
        .active_filters
        .iter()
        .map(|active| {
            let mut next = state.clone();
            next.clear_filter(&active.key);
            ChipHtml {
                label: active.label.clone(),
                value: active.value.clone(),
                clear_href: params.href(links.path, links.prefix, &next),
            }
        })
        .collect();

    let clear_all_href = (!view.active_filters.is_empty()).then(|| {
        let mut next = state.clone();
        next.clear_all_filters();
        params.href(links.path, links.prefix, &next)
    });

    // The form submits search and filters; sort and foreign parameters ride along.
    let mut hidden = params.foreign_pairs(links.prefix);
    if let Some(sort) = state.sort() {
        hidden.push((names.sort.clone(), sort.key.clone()));
        hidden.push((names.dir.clone(), sort.direction.as_str().to_string()));
    }

    let rows = view
        .rows
        .iter()
        .map(|record| RowHtml {
            href: links.row_href.map(|f| f(*record)),
            cells: table.columns().iter().map(|c| c.cell(*record)).collect(),
        })
        .collect();

    TableHtml {
        id: links.id.to_string(),
        path: links.path.to_string(),
        searchable: view.searchable,
        search_name: names.search,
        search: view.search.clone(),
        search_placeholder: view.search_placeholder.clone(),
        hidden,
        headers,
        filters,
        chips,
        clear_all_href,
        rows,
        shown: view.len(),
        total: view.total,
        empty_message: links.empty_message.to_string(),
    }
}

// ── Notices ─────────────────────────────────────────────────────

/// A banner above the page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// Nothing could be shown; otherwise the page shows cached data.
    pub error: bool,
}

impl Notice {
    pub fn stale(what: &str, err: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Showing cached {what}: {err}"),
            error: false,
        }
    }

    pub fn failed(what: &str, err: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Failed to load {what}: {err}"),
            error: true,
        }
    }
}

// ── Overview ────────────────────────────────────────────────────

pub struct StatCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: Option<String>,
}

pub fn stat_cards(stats: &DashboardStats) -> Vec<StatCard> {
    let card = |title, value: u32| StatCard {
        title,
        value: value.to_string(),
        subtitle: None,
    };
    vec![
        card("Total Tailorings", stats.total_tailorings),
        card("Active Tailorings", stats.active_tailorings),
        card("Paused Tailorings", stats.paused_tailorings),
        StatCard {
            title: "Open PRs",
            value: stats.open_prs.to_string(),
            subtitle: Some(format!(
                "{} merged, {} closed, {} ignored",
                stats.merged_prs, stats.closed_prs, stats.ignored_prs
            )),
        },
        card("Fit Profiles", stats.total_fit_profiles),
    ]
}

/// One integration line on the overview ("Prometheus: Connected").
pub struct ConnectionView {
    pub name: &'static str,
    pub detail: String,
    pub connected: bool,
}

pub struct AtelierView {
    pub name: String,
    pub connections: Vec<ConnectionView>,
    pub managed_tailorings: u32,
    pub batch_mode: bool,
}

impl AtelierView {
    pub fn from_summary(summary: &AtelierSummary) -> Self {
        let mut connections = vec![
            ConnectionView {
                name: "Prometheus",
                detail: summary.prometheus_url.clone(),
                connected: summary.prometheus_connected,
            },
            ConnectionView {
                name: "Git provider",
                detail: summary.git_provider_type.clone(),
                connected: summary.git_provider_connected,
            },
        ];
        if summary.argocd_enabled {
            connections.push(ConnectionView {
                name: "Argo CD",
                detail: String::new(),
                connected: summary.argocd_connected,
            });
        }
        if summary.open_cost_enabled {
            connections.push(ConnectionView {
                name: "OpenCost",
                detail: summary.open_cost_url.clone().unwrap_or_default(),
                connected: summary.open_cost_connected,
            });
        }
        Self {
            name: summary.name.clone(),
            connections,
            managed_tailorings: summary.managed_tailorings,
            batch_mode: summary.batch_mode,
        }
    }
}

// ── Tailoring Detail ────────────────────────────────────────────

pub struct TailoringDetailView {
    pub name: String,
    pub namespace: String,
    pub target: String,
    pub fit_profile: String,
    pub status: Cell,
    pub paused: bool,
    pub write_back: Vec<(&'static str, String)>,
    pub pull_request: Option<PullRequestView>,
    pub last_analysis: String,
    pub analysis_window: String,
    pub savings: String,
    pub containers: Vec<ContainerView>,
    pub conditions: Vec<ConditionView>,
}

pub struct PullRequestView {
    pub number: String,
    pub state: String,
    pub url: Option<String>,
    pub branch: String,
}

pub struct ContainerView {
    pub name: String,
    pub current_cpu: String,
    pub current_memory: String,
    pub recommended_cpu: String,
    pub recommended_memory: String,
    pub p95_cpu: String,
    pub p95_memory: String,
}

pub struct ConditionView {
    pub kind: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

impl TailoringDetailView {
    pub fn from_tailoring(t: &Tailoring) -> Self {
        let ready = t
            .status
            .conditions
            .iter()
            .flatten()
            .any(|c| c.kind == "Ready" && c.is_true());
        let status = tailoring_status_cell(t.spec.paused, ready);

        let wb = &t.spec.write_back;
        let mut write_back = vec![
            ("Repository", or_dash(&wb.repository)),
            ("Path", or_dash(&wb.path)),
            ("Mode", or_dash(&wb.kind)),
        ];
        if let Some(branch) = &wb.branch {
            write_back.push(("Branch", branch.clone()));
        }

        let pull_request = t.status.pr_number.map(|number| PullRequestView {
            number: format!("#{number}"),
            state: t.status.pr_state.clone().unwrap_or_else(|| "-".to_string()),
            url: t.status.pr_url.clone(),
            branch: t.status.branch_name.clone().unwrap_or_else(|| "-".to_string()),
        });

        let analysis = t.status.last_analysis.as_ref();

        Self {
            name: t.metadata.name.clone(),
            namespace: t.metadata.namespace.clone(),
            target: format!("{}/{}", t.spec.target.kind, t.spec.target.name),
            fit_profile: or_dash(&t.spec.fit_profile_ref.name),
            status,
            paused: t.spec.paused,
            write_back,
            pull_request,
            last_analysis: analysis
                .map(|a| format_relative_time(&a.timestamp))
                .unwrap_or_else(|| "Never".to_string()),
            analysis_window: analysis
                .and_then(|a| a.analysis_window.clone())
                .unwrap_or_else(|| "-".to_string()),
            savings: analysis
                .and_then(|a| a.savings_estimate.clone())
                .unwrap_or_else(|| "-".to_string()),
            containers: analysis
                .and_then(|a| a.containers.as_ref())
                .map(|cs| cs.iter().map(ContainerView::from_analysis).collect())
                .unwrap_or_default(),
            conditions: t
                .status
                .conditions
                .iter()
                .flatten()
                .map(|c| ConditionView {
                    kind: c.kind.clone(),
                    status: c.status.clone(),
                    reason: c.reason.clone().unwrap_or_default(),
                    message: c.message.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

impl ContainerView {
    fn from_analysis(c: &ContainerAnalysis) -> Self {
        let quantity = |reqs: Option<&atelier_api::ResourceRequirements>, cpu: bool| {
            reqs.and_then(|r| r.requests.as_ref())
                .and_then(|q| if cpu { q.cpu.clone() } else { q.memory.clone() })
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            name: c.name.clone(),
            current_cpu: quantity(c.current.as_ref(), true),
            current_memory: quantity(c.current.as_ref(), false),
            recommended_cpu: quantity(c.recommended.as_ref(), true),
            recommended_memory: quantity(c.recommended.as_ref(), false),
            p95_cpu: c.p95_cpu.clone().unwrap_or_else(|| "-".to_string()),
            p95_memory: c.p95_memory.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

// ── Fit Profile Detail ──────────────────────────────────────────

pub struct FitProfileDetailView {
    pub name: String,
    pub display_name: String,
    pub namespace: String,
    pub strategy: String,
    pub description: String,
    pub status: Cell,
    pub usage: String,
    pub priority: String,
    pub validation_message: Option<String>,
    pub parameters: String,
}

impl FitProfileDetailView {
    pub fn from_profile(p: &FitProfile) -> Self {
        let parameters = match &p.spec.parameters {
            // Parameters authored as YAML arrive as `{ "raw": "<yaml>" }`.
            Some(serde_json::Value::Object(map)) if map.len() == 1 && map.contains_key("raw") => {
                map["raw"].as_str().unwrap_or_default().to_string()
            }
            Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
            None => String::new(),
        };
        Self {
            name: p.metadata.name.clone(),
            display_name: p
                .spec
                .display_name
                .clone()
                .unwrap_or_else(|| p.metadata.name.clone()),
            namespace: p.metadata.namespace.clone(),
            strategy: p.spec.strategy.clone(),
            description: p.spec.description.clone().unwrap_or_else(|| "-".to_string()),
            status: fit_profile_status_cell(p.is_valid()),
            usage: usage_label(p.usage_count()),
            priority: p
                .spec
                .priority
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            validation_message: p
                .status
                .as_ref()
                .and_then(|s| s.validation_message.clone()),
            parameters,
        }
    }
}

// ── Costs ───────────────────────────────────────────────────────

pub struct WindowOption {
    pub value: &'static str,
    pub label: &'static str,
    pub href: String,
    pub selected: bool,
}

pub const COST_WINDOWS: &[(&str, &str)] = &[
    ("1d", "Last 24 Hours"),
    ("7d", "Last 7 Days"),
    ("30d", "Last 30 Days"),
    ("lastweek", "Last Week"),
    ("lastmonth", "Last Month"),
];

pub fn window_options(params: &QueryParams, path: &str, current: &str) -> Vec<WindowOption> {
    COST_WINDOWS
        .iter()
        .map(|&(value, label)| WindowOption {
            value,
            label,
            href: params.href_with(path, "window", value),
            selected: value == current,
        })
        .collect()
}

/// The requested cost window if it is one we offer, else the default.
pub fn cost_window(params: &QueryParams) -> &'static str {
    params
        .get("window")
        .and_then(|w| COST_WINDOWS.iter().find(|(value, _)| *value == w))
        .map(|&(value, _)| value)
        .unwrap_or(atelier_api::DEFAULT_WINDOW)
}

pub fn cost_cards(summary: &OpenCostSummary) -> Vec<StatCard> {
    let efficiency = |ratio: f64| Some(format!("{} efficiency", format_percent(ratio)));
    vec![
        StatCard {
            title: "Total Cost",
            value: format_currency(summary.total_cost),
            subtitle: None,
        },
        StatCard {
            title: "CPU Cost",
            value: format_currency(summary.cpu_cost),
            subtitle: efficiency(summary.cpu_efficiency),
        },
        StatCard {
            title: "Memory Cost",
            value: format_currency(summary.ram_cost),
            subtitle: efficiency(summary.ram_efficiency),
        },
        StatCard {
            title: "Storage Cost",
            value: format_currency(summary.pv_cost),
            subtitle: None,
        },
        StatCard {
            title: "Network Cost",
            value: format_currency(summary.network_cost),
            subtitle: None,
        },
        StatCard {
            title: "Efficiency",
            value: format_percent(summary.efficiency),
            subtitle: None,
        },
    ]
}

/// Why the costs page has nothing to show.
pub fn opencost_unavailable(enabled: bool, error: Option<&str>) -> String {
    if !enabled {
        "OpenCost integration is not enabled. Configure it in your Atelier resource.".to_string()
    } else {
        format!(
            "Unable to connect to OpenCost: {}",
            error.unwrap_or("Unknown error")
        )
    }
}

// ── Atelier ─────────────────────────────────────────────────────

/// One integration card on the Atelier page.
pub struct IntegrationView {
    pub name: &'static str,
    pub rows: Vec<(&'static str, String)>,
    pub connected: bool,
}

pub fn integrations(summary: &AtelierSummary) -> Vec<IntegrationView> {
    let configured = |value: &str| {
        if value.is_empty() {
            "Not configured".to_string()
        } else {
            value.to_string()
        }
    };
    let mut cards = vec![
        IntegrationView {
            name: "Prometheus",
            rows: vec![("URL", configured(&summary.prometheus_url))],
            connected: summary.prometheus_connected,
        },
        IntegrationView {
            name: "Git Provider",
            rows: vec![("Type", configured(&summary.git_provider_type))],
            connected: summary.git_provider_connected,
        },
    ];
    if summary.argocd_enabled {
        cards.push(IntegrationView {
            name: "ArgoCD",
            rows: vec![("Enabled", "Yes".to_string())],
            connected: summary.argocd_connected,
        });
    }
    if summary.open_cost_enabled {
        let mut rows = vec![("Enabled", "Yes".to_string())];
        if let Some(url) = summary.open_cost_url.as_deref().filter(|u| !u.is_empty()) {
            rows.push(("URL", url.to_string()));
        }
        cards.push(IntegrationView {
            name: "OpenCost",
            rows,
            connected: summary.open_cost_connected,
        });
    }
    cards
}

pub struct StrategyView {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub example: Option<String>,
}

impl StrategyView {
    pub fn from_strategy(s: &Strategy) -> Self {
        Self {
            name: s.name.clone(),
            display_name: if s.display_name.is_empty() {
                s.name.clone()
            } else {
                s.display_name.clone()
            },
            description: or_dash(&s.description),
            example: s
                .example_parameters
                .as_ref()
                .filter(|v| !v.is_null())
                .and_then(|v| serde_json::to_string_pretty(v).ok()),
        }
    }
}

// ── Analytics ───────────────────────────────────────────────────

/// Per-namespace usage and cost, merged from the resource and cost analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceUsage {
    pub namespace: String,
    pub cpu_cores: f64,
    pub memory_bytes: f64,
    pub hourly_cost: f64,
}

pub fn namespace_usage(resources: &ResourceAnalytics, costs: &CostAnalytics) -> Vec<NamespaceUsage> {
    let names: BTreeSet<&String> = resources
        .cpu_by_namespace
        .keys()
        .chain(resources.memory_by_namespace.keys())
        .chain(costs.cost_by_namespace.keys())
        .collect();
    names
        .into_iter()
        .map(|ns| NamespaceUsage {
            namespace: ns.clone(),
            cpu_cores: resources.cpu_by_namespace.get(ns).copied().unwrap_or_default(),
            memory_bytes: resources.memory_by_namespace.get(ns).copied().unwrap_or_default(),
            hourly_cost: costs.cost_by_namespace.get(ns).copied().unwrap_or_default(),
        })
        .collect()
}

pub fn cluster_cards(cluster: &ClusterResourceSummary, costs: &CostAnalytics) -> Vec<StatCard> {
    vec![
        StatCard {
            title: "Total CPU",
            value: format!("{:.1} cores", cluster.total_cpu_cores),
            subtitle: Some(format!("{:.2} allocated", cluster.allocated_cpu_cores)),
        },
        StatCard {
            title: "Total Memory",
            value: format!("{:.1} GB", cluster.total_memory_gb),
            subtitle: Some(format!("{:.2} GB allocated", cluster.allocated_memory_gb)),
        },
        StatCard {
            title: "Workloads",
            value: format!("{} pods", cluster.total_pods),
            subtitle: Some(format!(
                "{} containers in {} namespaces",
                cluster.total_containers, cluster.total_namespaces
            )),
        },
        StatCard {
            title: "Monthly Cost",
            value: format_currency(costs.monthly_cost),
            subtitle: Some(format!("{}/hr", format_hourly_currency(costs.total_hourly_cost))),
        },
    ]
}

pub fn utilization_cards(cluster: &ClusterResourceSummary, costs: &CostAnalytics) -> Vec<StatCard> {
    let card = |title, value| StatCard {
        title,
        value,
        subtitle: None,
    };
    vec![
        card("CPU Utilization", format_percent_value(cluster.cpu_utilization)),
        card("Memory Utilization", format_percent_value(cluster.memory_utilization)),
        card("Hourly Cost", format_hourly_currency(costs.total_hourly_cost)),
        card("Daily Cost", format_currency(costs.daily_cost)),
        card("Monthly Cost", format_currency(costs.monthly_cost)),
    ]
}

/// Hourly cost by resource kind, zero lines dropped.
pub fn cost_breakdown(costs: &CostAnalytics) -> Vec<(&'static str, String)> {
    [
        ("CPU", costs.cpu_hourly_cost),
        ("Memory", costs.ram_hourly_cost),
        ("GPU", costs.gpu_hourly_cost),
        ("Storage", costs.storage_hourly_cost),
        ("Network", costs.network_hourly_cost),
        ("Load Balancer", costs.load_balancer_hourly_cost),
    ]
    .into_iter()
    .filter(|&(_, cost)| cost > 0.0)
    .map(|(label, cost)| (label, format_hourly_currency(cost)))
    .collect()
}

/// Consumers shown per resource list.
pub const TOP_CONSUMERS: usize = 8;

pub struct ConsumerView {
    pub container: String,
    pub location: String,
    pub value: String,
    pub percent: String,
}

pub struct ConsumerList {
    pub title: &'static str,
    pub consumers: Vec<ConsumerView>,
}

pub fn top_consumers(consumers: &[ResourceConsumer], resource: ResourceType) -> Vec<ConsumerView> {
    let mut sorted: Vec<&ResourceConsumer> = consumers.iter().collect();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
    sorted
        .into_iter()
        .take(TOP_CONSUMERS)
        .map(|c| ConsumerView {
            container: if c.container.is_empty() {
                c.name.clone()
            } else {
                c.container.clone()
            },
            location: format!("{}/{}", c.namespace, c.pod),
            value: match resource {
                ResourceType::Cpu => format_cores(c.value),
                ResourceType::Memory => format_bytes(c.value),
            },
            percent: format_percent_value(c.percent),
        })
        .collect()
}

pub struct NodeCostView {
    pub node: String,
    pub cpu: String,
    pub ram: String,
    pub gpu: String,
    pub total: String,
}

/// Node costs, most expensive first.
pub fn node_costs(costs: &CostAnalytics) -> Vec<NodeCostView> {
    let mut nodes: Vec<_> = costs.node_costs.iter().collect();
    nodes.sort_by(|a, b| b.total_hourly_cost.total_cmp(&a.total_hourly_cost));
    nodes
        .into_iter()
        .map(|n| NodeCostView {
            node: n.node.clone(),
            cpu: format_hourly_currency(n.cpu_hourly_cost),
            ram: format_hourly_currency(n.ram_hourly_cost),
            gpu: if n.gpu_count > 0 {
                format!("{} ({} GPU)", format_hourly_currency(n.gpu_hourly_cost), n.gpu_count)
            } else {
                format_hourly_currency(n.gpu_hourly_cost)
            },
            total: format_hourly_currency(n.total_hourly_cost),
        })
        .collect()
}

pub fn namespace_cards(b: &NamespaceResourceBreakdown) -> Vec<StatCard> {
    vec![
        StatCard {
            title: "CPU",
            value: format_cores(b.total_cpu),
            subtitle: Some(format!("{} of cluster", format_percent_value(b.cpu_percent))),
        },
        StatCard {
            title: "Memory",
            value: format_bytes(b.total_memory),
            subtitle: Some(format!("{} of cluster", format_percent_value(b.memory_percent))),
        },
        StatCard {
            title: "GPU",
            value: format!("{:.0}", b.total_gpu),
            subtitle: None,
        },
        StatCard {
            title: "Containers",
            value: b.containers.len().to_string(),
            subtitle: None,
        },
    ]
}

// ── Usage ───────────────────────────────────────────────────────

/// Latest and peak usage of one container over the recent window.
pub struct UsageView {
    pub container: String,
    pub cpu_latest: String,
    pub cpu_peak: String,
    pub memory_latest: String,
    pub memory_peak: String,
}

impl UsageView {
    pub fn new(container: &str, cpu: &[MetricPoint], memory: &[MetricPoint]) -> Self {
        let (cpu_latest, cpu_peak) = usage_extremes(cpu, format_cores);
        let (memory_latest, memory_peak) = usage_extremes(memory, format_bytes);
        Self {
            container: container.to_string(),
            cpu_latest,
            cpu_peak,
            memory_latest,
            memory_peak,
        }
    }
}

/// `(latest, peak)` of a series; `"-"` for an empty one.
fn usage_extremes(points: &[MetricPoint], format: fn(f64) -> String) -> (String, String) {
    let latest = points.iter().max_by_key(|p| p.timestamp).map(|p| p.value);
    let peak = points.iter().map(|p| p.value).reduce(f64::max);
    let show = |v: Option<f64>| v.map(format).unwrap_or_else(|| "-".to_string());
    (show(latest), show(peak))
}

// ── Status Cells ────────────────────────────────────────────────

pub fn tailoring_status_cell(paused: bool, ready: bool) -> Cell {
    if paused {
        Cell::text("Paused").with_tone("warning")
    } else if ready {
        Cell::text("Ready").with_tone("success")
    } else {
        Cell::text("Not Ready").with_tone("danger")
    }
}

pub fn fit_profile_status_cell(valid: bool) -> Cell {
    if valid {
        Cell::text("Valid").with_tone("success")
    } else {
        Cell::text("Invalid").with_tone("danger")
    }
}

pub fn pr_state_tone(state: &str) -> &'static str {
    match state {
        "open" => "info",
        "merged" => "success",
        _ => "muted",
    }
}

/// Green at 70% and above, amber from 40%, red below.
pub fn efficiency_tone(ratio: f64) -> &'static str {
    if ratio >= 0.7 {
        "success"
    } else if ratio >= 0.4 {
        "warning"
    } else {
        "danger"
    }
}

// ── Format Helpers ──────────────────────────────────────────────

pub fn format_currency(value: f64) -> String {
    if value >= 1000.0 {
        format!("${:.2}k", value / 1000.0)
    } else {
        format!("${value:.2}")
    }
}

/// Hourly rates: four decimals below $1000.
pub fn format_hourly_currency(value: f64) -> String {
    if value >= 1000.0 {
        format!("${:.2}k", value / 1000.0)
    } else {
        format!("${value:.4}")
    }
}

/// A 0..1 ratio as a percentage with one decimal.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// A value that is already a percentage.
pub fn format_percent_value(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Cores, or millicores below one core.
pub fn format_cores(cores: f64) -> String {
    if cores >= 1.0 {
        format!("{cores:.2} cores")
    } else {
        format!("{:.0}m", cores * 1000.0)
    }
}

/// Binary-prefixed byte count with up to two decimals ("1.5 GB").
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes <= 0.0 || !bytes.is_finite() {
        return "0 B".to_string();
    }
    let mut scaled = bytes;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    // Two decimals, trailing zeros dropped.
    let text = format!("{scaled:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

pub fn usage_label(count: u32) -> String {
    format!("{count} {}", plural(count as usize, "Tailoring", "Tailorings"))
}

/// RFC 3339 timestamp as "3m ago"; unparseable input is returned as-is.
pub fn format_relative_time(timestamp: &str) -> String {
    format_relative_time_at(timestamp, Utc::now())
}

pub fn format_relative_time_at(timestamp: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let delta = (now - then.with_timezone(&Utc)).num_seconds().max(0);

    if delta < 60 {
        format!("{delta}s ago")
    } else if delta < 3600 {
        format!("{}m ago", delta / 60)
    } else if delta < 86400 {
        format!("{}h ago", delta / 3600)
    } else {
        format!("{}d ago", delta / 86400)
    }
}

pub fn format_timestamp(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
        })
        .unwrap_or_else(|_| timestamp.to_string())
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

fn or_dash(s: &str) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}
