//! Core data models.
//!
//! These types are the contract between the probes, the ledger aggregator,
//! and the renderers. Everything here serializes to camelCase JSON; the
//! narrative renderer reads the same fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::pricing::Currency;
use crate::error::{ErrorCategory, StatusError};

// =============================================================================
// Probe
// =============================================================================

/// Outcome of collecting one independent piece of data.
///
/// Serialized with a `status` tag so consumers can tell a measured zero apart
/// from a metric that could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Probe<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Probe<T> {
    pub fn unavailable(reason: impl ToString) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Self::Available(value) => Probe::Available(f(value)),
            Self::Unavailable { reason } => Probe::Unavailable { reason },
        }
    }
}

impl<T> From<Result<T, StatusError>> for Probe<T> {
    fn from(result: Result<T, StatusError>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(err) => Self::unavailable(err),
        }
    }
}

// =============================================================================
// Metrics Snapshot
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskMetrics {
    pub mount: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureMetrics {
    pub cpu_celsius: f64,
}

/// A model currently held in memory by the model daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedModel {
    pub name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vram_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDaemonMetrics {
    pub endpoint: String,
    /// Installed model count; `None` when the listing call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_models: Option<usize>,
    pub loaded_models: Vec<LoadedModel>,
    pub loaded_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStoreMetrics {
    pub path: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
}

/// One point-in-time capture of host and service state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub captured_at: DateTime<Utc>,
    pub memory: Probe<MemoryMetrics>,
    pub swap: Probe<SwapMetrics>,
    pub cpu: Probe<CpuMetrics>,
    pub disk: Probe<DiskMetrics>,
    pub temperature: Probe<TemperatureMetrics>,
    pub model_daemon: Probe<ModelDaemonMetrics>,
    pub document_store: Probe<DocumentStoreMetrics>,
}

impl MetricsSnapshot {
    /// Every probe unavailable with the same reason.
    #[must_use]
    pub fn unavailable(captured_at: DateTime<Utc>, reason: &str) -> Self {
        Self {
            captured_at,
            memory: Probe::unavailable(reason),
            swap: Probe::unavailable(reason),
            cpu: Probe::unavailable(reason),
            disk: Probe::unavailable(reason),
            temperature: Probe::unavailable(reason),
            model_daemon: Probe::unavailable(reason),
            document_store: Probe::unavailable(reason),
        }
    }

    /// `(name, reason)` for each unavailable probe, in display order.
    #[must_use]
    pub fn unavailable_sources(&self) -> Vec<(&'static str, &str)> {
        [
            ("memory", self.memory.reason()),
            ("swap", self.swap.reason()),
            ("cpu", self.cpu.reason()),
            ("disk", self.disk.reason()),
            ("temperature", self.temperature.reason()),
            ("modelDaemon", self.model_daemon.reason()),
            ("documentStore", self.document_store.reason()),
        ]
        .into_iter()
        .filter_map(|(name, reason)| reason.map(|r| (name, r)))
        .collect()
    }
}

// =============================================================================
// Usage Ledger
// =============================================================================

/// Project name used when the ledger row has none.
pub const UNKNOWN_PROJECT: &str = "unknown";

/// One model call read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub project: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageEvent {
    #[must_use]
    pub const fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Result of reading the ledger for a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRead {
    pub events: Vec<UsageEvent>,
    pub skipped_rows: u64,
}

/// Where the cost data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    pub path: String,
    pub events: u64,
    pub skipped_rows: u64,
}

// =============================================================================
// Cost Summary
// =============================================================================

/// Token and cost totals for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub calls: u64,
    pub cost: f64,
}

impl TokenTotals {
    pub fn add_event(&mut self, event: &UsageEvent, cost: f64) {
        self.input_tokens += event.input_tokens;
        self.output_tokens += event.output_tokens;
        self.total_tokens += event.total_tokens();
        self.calls += 1;
        self.cost += cost;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCost {
    pub provider: String,
    pub model: String,
    /// False when no price entry matched; cost is then zero.
    pub priced: bool,
    #[serde(flatten)]
    pub totals: TokenTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCost {
    pub provider: String,
    #[serde(flatten)]
    pub totals: TokenTotals,
    pub models: Vec<ModelCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCost {
    pub project: String,
    #[serde(flatten)]
    pub totals: TokenTotals,
}

/// A `(provider, model)` pair seen in the ledger without a price entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingGap {
    pub provider: String,
    pub model: String,
    pub tokens: u64,
    pub calls: u64,
}

/// Trend bucket granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSize {
    #[default]
    Day,
    Week,
    Month,
}

/// Totals for one time partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBucket {
    /// `YYYY-MM-DD`, `YYYY-Www` or `YYYY-MM`.
    pub key: String,
    pub start: NaiveDate,
    #[serde(flatten)]
    pub totals: TokenTotals,
    pub models: Vec<ModelCost>,
}

/// Monthly budget position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub monthly_limit: f64,
    pub spent: f64,
    /// `monthly_limit - spent`; negative on overrun.
    pub remaining: f64,
    pub used_percent: f64,
    pub alert_percent: f64,
    pub projected_month_end: f64,
    pub alert: bool,
}

/// Aggregated spend for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub period: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub currency: Currency,
    pub totals: TokenTotals,
    pub by_provider: Vec<ProviderCost>,
    pub by_model: Vec<ModelCost>,
    pub by_project: Vec<ProjectCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<CostBucket>>,
    pub pricing_gaps: Vec<PricingGap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetStatus>,
    pub ledger: Probe<LedgerInfo>,
}

/// Trend data attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub bucket: BucketSize,
    pub period: String,
    pub buckets: Vec<CostBucket>,
}

// =============================================================================
// Report
// =============================================================================

/// Coarse host health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Caution,
    Critical,
}

impl HealthStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Caution => "CAUTION",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Memory,
    Swap,
    Budget,
    Service,
    Disk,
    Pricing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub severity: Severity,
    pub message: String,
}

/// A source that could not contribute to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedSource {
    pub source: String,
    pub category: ErrorCategory,
    pub reason: String,
}

/// The merged health and spend report for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub health: HealthStatus,
    pub snapshot: MetricsSnapshot,
    pub costs: CostSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    pub recommendations: Vec<Recommendation>,
    pub degraded: Vec<DegradedSource>,
}

// =============================================================================
// Robot Output
// =============================================================================

/// Schema identifier for structured output.
pub const SCHEMA_VERSION: &str = "server-status.v1";

/// Top-level JSON envelope for structured output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,

    #[serde(default)]
    pub errors: Vec<String>,

    pub meta: RobotMeta,
}

/// Metadata for robot output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotMeta {
    pub format: String,
    pub version: String,
}

impl<T> RobotOutput<T> {
    /// Create an envelope. The timestamp is supplied by the caller so the
    /// output depends only on its inputs.
    pub fn new(command: impl Into<String>, generated_at: DateTime<Utc>, data: T) -> Self {
        Self::with_errors(command, generated_at, data, Vec::new())
    }

    pub fn with_errors(
        command: impl Into<String>,
        generated_at: DateTime<Utc>,
        data: T,
        errors: Vec<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at,
            command: command.into(),
            data,
            errors,
            meta: RobotMeta {
                format: "json".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}
