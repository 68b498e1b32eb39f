//! Probes, cost aggregation, and report building.

pub mod aggregate;
pub mod budget;
pub mod cli_runner;
pub mod http;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod report;
pub mod snapshot;

pub use aggregate::{CostQuery, summarize};
pub use budget::BudgetConfig;
pub use models::{
    CostSummary, HealthStatus, MetricsSnapshot, Probe, Report, RobotOutput, UsageEvent,
};
pub use pricing::{Conversion, Currency, ModelPricing, PricingTable};
pub use report::{Thresholds, build_report};
pub use snapshot::SnapshotSources;
