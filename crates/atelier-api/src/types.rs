//! Payload types served by the Atelier backend.
//!
//! Field names follow the backend's camelCase JSON. Optional fields default
//! when absent so partially-populated resources still decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Shared ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A Kubernetes-style status condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

// ── Tailorings ─────────────────────────────────────────────────────

/// One row of the tailorings list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TailoringSummary {
    pub name: String,
    pub namespace: String,
    pub target_kind: String,
    pub target_name: String,
    /// Superseded by `fit_profile`; older controllers still send it.
    pub intent: Option<String>,
    pub fit_profile: Option<String>,
    pub paused: bool,
    pub target_found: bool,
    pub vpa_detected: bool,
    pub last_analysis: Option<String>,
    pub container_count: u32,
    pub ready_condition: String,
    pub pr_state: Option<String>,
    pub pr_number: Option<u64>,
    pub pr_url: Option<String>,
}

impl TailoringSummary {
    /// The fit profile name, falling back to the legacy intent.
    pub fn profile_name(&self) -> Option<&str> {
        self.fit_profile
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(self.intent.as_deref().filter(|i| !i.is_empty()))
    }

    pub fn is_ready(&self) -> bool {
        self.ready_condition == "True"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tailoring {
    pub metadata: ObjectMeta,
    pub spec: TailoringSpec,
    pub status: TailoringStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TailoringSpec {
    pub target: TargetRef,
    pub fit_profile_ref: FitProfileRef,
    pub write_back: WriteBack,
    pub paused: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetRef {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitProfileRef {
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteBack {
    pub repository: String,
    pub path: String,
    pub branch: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TailoringStatus {
    pub conditions: Option<Vec<Condition>>,
    pub last_analysis: Option<Analysis>,
    pub pr_state: Option<String>,
    pub pr_url: Option<String>,
    pub pr_number: Option<u64>,
    #[serde(rename = "commitSHA")]
    pub commit_sha: Option<String>,
    pub branch_name: Option<String>,
    pub ignored: Option<bool>,
    pub merged_at: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "argoCDApp")]
    pub argocd_app: Option<String>,
    #[serde(rename = "argoCDSyncTriggered")]
    pub argocd_sync_triggered: Option<bool>,
    #[serde(rename = "argoCDSyncTime")]
    pub argocd_sync_time: Option<String>,
    #[serde(rename = "analysisTimestampWhenPRCreated")]
    pub analysis_timestamp_when_pr_created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Analysis {
    pub timestamp: String,
    pub analysis_window: Option<String>,
    pub containers: Option<Vec<ContainerAnalysis>>,
    pub savings_estimate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerAnalysis {
    pub name: String,
    pub current: Option<ResourceRequirements>,
    pub recommended: Option<ResourceRequirements>,
    #[serde(rename = "p95CPU")]
    pub p95_cpu: Option<String>,
    #[serde(rename = "p99CPU")]
    pub p99_cpu: Option<String>,
    #[serde(rename = "p95Memory")]
    pub p95_memory: Option<String>,
    #[serde(rename = "p99Memory")]
    pub p99_memory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequirements {
    pub requests: Option<ResourceQuantities>,
    pub limits: Option<ResourceQuantities>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceQuantities {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

// ── Fit profiles & strategies ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitProfile {
    pub metadata: ObjectMeta,
    pub spec: FitProfileSpec,
    pub status: Option<FitProfileStatus>,
}

impl FitProfile {
    /// Ready condition true, or both strategy and parameters validated.
    pub fn is_valid(&self) -> bool {
        let Some(status) = &self.status else {
            return false;
        };
        let ready = status
            .conditions
            .iter()
            .flatten()
            .any(|c| c.kind == "Ready" && c.is_true());
        ready || (status.parameters_valid == Some(true) && status.strategy_valid == Some(true))
    }

    pub fn usage_count(&self) -> u32 {
        self.status.as_ref().and_then(|s| s.usage_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitProfileSpec {
    pub strategy: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Strategy-specific; either a free-form map or `{ "raw": "<yaml>" }`.
    pub parameters: Option<serde_json::Value>,
    pub priority: Option<i64>,
    pub labels: Option<BTreeMap<String, String>>,
    pub safety_rails_override: Option<serde_json::Value>,
    pub resource_quota_override: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitProfileStatus {
    pub strategy_valid: Option<bool>,
    pub parameters_valid: Option<bool>,
    pub validation_message: Option<String>,
    pub usage_count: Option<u32>,
    pub last_validated: Option<String>,
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Strategy {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parameters_schema: Option<serde_json::Value>,
    pub example_parameters: Option<serde_json::Value>,
}

/// Controller-wide configuration and connectivity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtelierSummary {
    pub name: String,
    pub prometheus_url: String,
    pub prometheus_connected: bool,
    pub git_provider_type: String,
    pub git_provider_connected: bool,
    #[serde(rename = "argoCDEnabled")]
    pub argocd_enabled: bool,
    #[serde(rename = "argoCDConnected")]
    pub argocd_connected: bool,
    pub open_cost_enabled: bool,
    pub open_cost_connected: bool,
    pub open_cost_url: Option<String>,
    pub managed_tailorings: u32,
    pub batch_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_tailorings: u32,
    pub active_tailorings: u32,
    pub paused_tailorings: u32,
    #[serde(rename = "openPRs")]
    pub open_prs: u32,
    #[serde(rename = "mergedPRs")]
    pub merged_prs: u32,
    #[serde(rename = "closedPRs")]
    pub closed_prs: u32,
    #[serde(rename = "ignoredPRs")]
    pub ignored_prs: u32,
    pub total_fit_profiles: u32,
    pub total_savings: Option<String>,
}

// ── Prometheus metrics ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Cpu,
    Memory,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Cpu => "cpu",
            ResourceType::Memory => "memory",
        }
    }
}

/// Parameters of a Prometheus usage query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsQuery {
    pub namespace: String,
    pub pod_name_prefix: String,
    pub container_name: String,
    pub resource_type: ResourceType,
    pub window: Option<String>,
    /// Break the series down per pod instead of aggregating.
    pub per_pod: bool,
}

/// One time-series sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricPoint {
    /// Unix time in milliseconds.
    pub timestamp: i64,
    pub value: f64,
    pub pod: Option<String>,
}

/// A horizontal reference line drawn over a series (request, limit, recommendation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub name: String,
    pub value: f64,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: String,
}

// ── OpenCost ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenCostAllocation {
    pub name: String,
    pub cluster: Option<String>,
    pub namespace: Option<String>,
    pub controller: Option<String>,
    pub controller_kind: Option<String>,
    pub pod: Option<String>,
    pub container: Option<String>,
    pub cpu_cores: f64,
    pub cpu_cost: f64,
    pub cpu_efficiency: f64,
    pub ram_bytes: f64,
    pub ram_cost: f64,
    pub ram_efficiency: f64,
    pub gpu_cost: f64,
    pub pv_cost: f64,
    pub network_cost: f64,
    pub load_balancer_cost: f64,
    pub shared_cost: f64,
    pub total_cost: f64,
    pub total_efficiency: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenCostSummary {
    pub total_cost: f64,
    pub cpu_cost: f64,
    pub ram_cost: f64,
    pub gpu_cost: f64,
    pub pv_cost: f64,
    pub network_cost: f64,
    pub load_balancer_cost: f64,
    pub shared_cost: f64,
    pub efficiency: f64,
    pub cpu_efficiency: f64,
    pub ram_efficiency: f64,
    pub by_namespace: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenCostHealthStatus {
    pub connected: bool,
    pub enabled: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConsumer {
    pub name: String,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub value: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceAnalytics {
    pub total_cpu_capacity: f64,
    pub total_memory_capacity: f64,
    pub total_cpu_allocatable: f64,
    pub total_memory_allocatable: f64,
    pub total_cpu_allocated: f64,
    pub total_memory_allocated: f64,
    pub total_gpu_allocated: f64,
    pub cpu_utilization_percent: f64,
    pub memory_utilization_percent: f64,
    pub cpu_by_namespace: BTreeMap<String, f64>,
    pub memory_by_namespace: BTreeMap<String, f64>,
    pub cpu_by_pod: BTreeMap<String, f64>,
    pub memory_by_pod: BTreeMap<String, f64>,
    pub top_cpu_consumers: Vec<ResourceConsumer>,
    pub top_memory_consumers: Vec<ResourceConsumer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeCostSummary {
    pub node: String,
    pub cpu_hourly_cost: f64,
    pub ram_hourly_cost: f64,
    pub gpu_hourly_cost: f64,
    pub total_hourly_cost: f64,
    pub gpu_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostAnalytics {
    pub total_hourly_cost: f64,
    pub cpu_hourly_cost: f64,
    pub ram_hourly_cost: f64,
    pub gpu_hourly_cost: f64,
    pub storage_hourly_cost: f64,
    pub network_hourly_cost: f64,
    pub load_balancer_hourly_cost: f64,
    pub cluster_management_cost: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
    pub cost_by_namespace: BTreeMap<String, f64>,
    pub node_costs: Vec<NodeCostSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterResourceSummary {
    pub total_nodes: u32,
    pub total_cpu_cores: f64,
    pub total_memory_gb: f64,
    pub allocated_cpu_cores: f64,
    pub allocated_memory_gb: f64,
    pub available_cpu_cores: f64,
    pub available_memory_gb: f64,
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub total_pods: u32,
    pub total_containers: u32,
    pub total_namespaces: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerBreakdown {
    pub container: String,
    pub pod: String,
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamespaceResourceBreakdown {
    pub namespace: String,
    pub total_cpu: f64,
    pub total_memory: f64,
    pub total_gpu: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub containers: Vec<ContainerBreakdown>,
}
