//! Column sets for the dashboard's data tables.
//!
//! Records are [`Snapshot`]s of API payloads: column keys are camelCase
//! paths into the payload JSON, renderers read the typed struct.

use atelier_api::{ContainerBreakdown, FitProfile, OpenCostAllocation, TailoringSummary};
use atelier_table::{Cell, CellValue, Column, DataTable, Snapshot, SortState, TableError};

use crate::views::{
    NamespaceUsage, efficiency_tone, fit_profile_status_cell, format_bytes, format_cores,
    format_currency, format_hourly_currency, format_percent, format_relative_time,
    pr_state_tone, tailoring_status_cell, usage_label,
};

pub type TailoringRow = Snapshot<TailoringSummary>;
pub type FitProfileRow = Snapshot<FitProfile>;
pub type AllocationRow = Snapshot<OpenCostAllocation>;
pub type NamespaceUsageRow = Snapshot<NamespaceUsage>;
pub type ContainerUsageRow = Snapshot<ContainerBreakdown>;

/// Allocation name OpenCost uses for unallocated capacity.
pub const IDLE_ALLOCATION: &str = "__idle__";

pub fn tailorings_table() -> Result<DataTable<TailoringRow>, TableError> {
    Ok(DataTable::new(vec![
        Column::new("name", "Name")
            .sortable()
            .render(|t: &TailoringRow| Cell::text(&t.name).with_secondary(&t.namespace)),
        Column::new("namespace", "Namespace").sortable().filterable(),
        Column::new("targetName", "Target")
            .sortable()
            .filterable()
            .render(|t: &TailoringRow| Cell::text(&t.target_name).with_secondary(&t.target_kind)),
        Column::new("fitProfile", "Fit Profile")
            .sortable()
            .filterable()
            .filter_by(|t: &TailoringRow| CellValue::from(t.profile_name().unwrap_or_default()))
            .render(|t: &TailoringRow| Cell::text(t.profile_name().unwrap_or("-"))),
        Column::new("readyCondition", "Status")
            .sortable()
            .render(|t: &TailoringRow| tailoring_status_cell(t.paused, t.is_ready())),
        Column::new("prState", "PR Status")
            .sortable()
            .filterable()
            .render(|t: &TailoringRow| match t.pr_state.as_deref() {
                Some(state) => Cell::text(state).with_tone(pr_state_tone(state)),
                None => Cell::text("-").with_tone("muted"),
            }),
        Column::new("prNumber", "PR #")
            .sortable()
            .render(|t: &TailoringRow| match t.pr_number {
                Some(number) => {
                    let cell = Cell::text(format!("#{number}"));
                    match &t.pr_url {
                        Some(url) => cell.with_href(url),
                        None => cell,
                    }
                }
                None => Cell::text("-").with_tone("muted"),
            }),
        Column::new("containerCount", "Containers").sortable(),
        Column::new("lastAnalysis", "Last Analysis")
            .sortable()
            .render(|t: &TailoringRow| match &t.last_analysis {
                Some(ts) => Cell::text(format_relative_time(ts)).with_tone("muted"),
                None => Cell::text("Never").with_tone("muted"),
            }),
    ])?
    .search_placeholder("Search tailorings...")
    .default_sort(SortState::ascending("name")))
}

pub fn tailoring_href(t: &TailoringRow) -> String {
    detail_href("/tailorings", &t.namespace, &t.name)
}

pub fn fit_profiles_table() -> Result<DataTable<FitProfileRow>, TableError> {
    Ok(DataTable::new(vec![
        Column::new("metadata.name", "Name").sortable().render(|p: &FitProfileRow| {
            let name = p
                .spec
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| p.metadata.name.clone());
            Cell::text(name).with_secondary(&p.metadata.namespace)
        }),
        Column::new("metadata.namespace", "Namespace")
            .sortable()
            .filterable(),
        Column::new("spec.strategy", "Strategy")
            .sortable()
            .filterable()
            .render(|p: &FitProfileRow| Cell::text(&p.spec.strategy).with_tone("info")),
        Column::new("spec.description", "Description").render(|p: &FitProfileRow| {
            Cell::text(p.spec.description.as_deref().unwrap_or("-")).with_tone("muted")
        }),
        Column::with_accessor("status.usageCount", "Usage", |p: &FitProfileRow| {
            CellValue::from(p.usage_count())
        })
        .sortable()
        .render(|p: &FitProfileRow| Cell::text(usage_label(p.usage_count()))),
        Column::with_accessor("status", "Status", |p: &FitProfileRow| {
            CellValue::from(p.is_valid())
        })
        .sortable()
        .render(|p: &FitProfileRow| fit_profile_status_cell(p.is_valid())),
    ])?
    .search_placeholder("Search fit profiles by name, strategy, description...")
    .default_sort(SortState::ascending("metadata.name")))
}

pub fn fit_profile_href(p: &FitProfileRow) -> String {
    detail_href("/fitprofiles", &p.metadata.namespace, &p.metadata.name)
}

/// Costs per namespace or per controller, most expensive first.
pub fn allocations_table(placeholder: &str) -> Result<DataTable<AllocationRow>, TableError> {
    let currency = |key: &str, label: &str, value: fn(&OpenCostAllocation) -> f64| {
        Column::new(key, label)
            .sortable()
            .render(move |a: &AllocationRow| Cell::text(format_currency(value(a))))
    };

    Ok(DataTable::new(vec![
        Column::new("name", "Name").sortable().render(|a: &AllocationRow| {
            let name = if a.name.is_empty() {
                a.controller.as_deref().unwrap_or("Unknown")
            } else {
                a.name.as_str()
            };
            Cell::text(name)
        }),
        Column::new("namespace", "Namespace").sortable().filterable(),
        Column::new("controllerKind", "Controller Kind")
            .sortable()
            .filterable(),
        currency("totalCost", "Total", |a| a.total_cost),
        currency("cpuCost", "CPU", |a| a.cpu_cost),
        currency("ramCost", "RAM", |a| a.ram_cost),
        currency("pvCost", "PV", |a| a.pv_cost),
        currency("networkCost", "Network", |a| a.network_cost),
        Column::new("totalEfficiency", "Efficiency")
            .sortable()
            .render(|a: &AllocationRow| {
                Cell::text(format_percent(a.total_efficiency))
                    .with_tone(efficiency_tone(a.total_efficiency))
            }),
    ])?
    .search_placeholder(placeholder)
    .default_sort(SortState::descending("totalCost")))
}

/// Resource usage and hourly cost per namespace, most expensive first.
pub fn namespace_usage_table() -> Result<DataTable<NamespaceUsageRow>, TableError> {
    Ok(DataTable::new(vec![
        Column::new("namespace", "Namespace").sortable(),
        Column::new("cpuCores", "CPU")
            .sortable()
            .render(|n: &NamespaceUsageRow| Cell::text(format_cores(n.cpu_cores))),
        Column::new("memoryBytes", "Memory")
            .sortable()
            .render(|n: &NamespaceUsageRow| Cell::text(format_bytes(n.memory_bytes))),
        Column::new("hourlyCost", "Cost / hr")
            .sortable()
            .render(|n: &NamespaceUsageRow| Cell::text(format_hourly_currency(n.hourly_cost))),
    ])?
    .search_placeholder("Search namespaces...")
    .default_sort(SortState::descending("hourlyCost")))
}

pub fn namespace_usage_href(n: &NamespaceUsageRow) -> String {
    format!("/analytics/{}", urlencoding::encode(&n.namespace))
}

/// Containers of one namespace, heaviest CPU user first.
pub fn container_usage_table() -> Result<DataTable<ContainerUsageRow>, TableError> {
    Ok(DataTable::new(vec![
        Column::new("container", "Container")
            .sortable()
            .render(|c: &ContainerUsageRow| Cell::text(&c.container).with_secondary(&c.pod)),
        Column::new("pod", "Pod").sortable().filterable(),
        Column::new("cpu", "CPU")
            .sortable()
            .render(|c: &ContainerUsageRow| Cell::text(format_cores(c.cpu))),
        Column::new("memory", "Memory")
            .sortable()
            .render(|c: &ContainerUsageRow| Cell::text(format_bytes(c.memory))),
        Column::new("gpu", "GPU").sortable(),
    ])?
    .search_placeholder("Search containers...")
    .default_sort(SortState::descending("cpu")))
}

/// Drop OpenCost's idle bucket.
pub fn without_idle(allocations: &[OpenCostAllocation]) -> Vec<OpenCostAllocation> {
    allocations
        .iter()
        .filter(|a| a.name != IDLE_ALLOCATION)
        .cloned()
        .collect()
}

fn detail_href(base: &str, namespace: &str, name: &str) -> String {
    format!(
        "{base}/{}/{}",
        urlencoding::encode(namespace),
        urlencoding::encode(name)
    )
}
