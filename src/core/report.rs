//! Health classification and recommendations.
//!
//! Turns a [`MetricsSnapshot`] and a [`CostSummary`] into a [`Report`]. All
//! limits arrive through [`Thresholds`]; nothing here reads config or the
//! clock, so the same inputs always give the same report.

use serde::{Deserialize, Serialize};

use crate::core::models::{
    CostSummary, DegradedSource, HealthStatus, MetricsSnapshot, Recommendation,
    RecommendationKind, Report, Severity, Trend,
};
use crate::core::snapshot::DAEMON_DISABLED;
use crate::error::{ErrorCategory, Result, StatusError};
use crate::util::format::{format_money, format_percent, format_thousands};

/// Percent limits for health and recommendations.
///
/// A reading at or above a limit trips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub ram_warning_percent: f64,
    pub ram_critical_percent: f64,
    pub swap_warning_percent: f64,
    pub swap_critical_percent: f64,
    pub disk_warning_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ram_warning_percent: 75.0,
            ram_critical_percent: 90.0,
            swap_warning_percent: 50.0,
            swap_critical_percent: 80.0,
            disk_warning_percent: 90.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("thresholds.ram_warning_percent", self.ram_warning_percent),
            ("thresholds.ram_critical_percent", self.ram_critical_percent),
            ("thresholds.swap_warning_percent", self.swap_warning_percent),
            ("thresholds.swap_critical_percent", self.swap_critical_percent),
            ("thresholds.disk_warning_percent", self.disk_warning_percent),
        ];
        for (key, value) in checks {
            if !(0.0..=100.0).contains(&value) {
                return Err(StatusError::ConfigInvalid {
                    key: key.to_string(),
                    message: format!("{value} is outside 0-100"),
                });
            }
        }

        if self.ram_warning_percent >= self.ram_critical_percent {
            return Err(StatusError::ConfigInvalid {
                key: "thresholds.ram_warning_percent".to_string(),
                message: "must be below ram_critical_percent".to_string(),
            });
        }
        if self.swap_warning_percent >= self.swap_critical_percent {
            return Err(StatusError::ConfigInvalid {
                key: "thresholds.swap_warning_percent".to_string(),
                message: "must be below swap_critical_percent".to_string(),
            });
        }
        Ok(())
    }
}

/// Level of a single reading against a warning/critical pair.
fn level(value: f64, warning: f64, critical: f64) -> HealthStatus {
    if value >= critical {
        HealthStatus::Critical
    } else if value >= warning {
        HealthStatus::Caution
    } else {
        HealthStatus::Healthy
    }
}

fn memory_level(snapshot: &MetricsSnapshot, t: &Thresholds) -> HealthStatus {
    snapshot.memory.value().map_or(HealthStatus::Healthy, |m| {
        level(m.used_percent, t.ram_warning_percent, t.ram_critical_percent)
    })
}

fn swap_level(snapshot: &MetricsSnapshot, t: &Thresholds) -> HealthStatus {
    snapshot.swap.value().map_or(HealthStatus::Healthy, |s| {
        level(s.used_percent, t.swap_warning_percent, t.swap_critical_percent)
    })
}

/// Worst of the memory and swap levels. Unavailable readings count as healthy.
#[must_use]
pub fn classify_health(snapshot: &MetricsSnapshot, thresholds: &Thresholds) -> HealthStatus {
    memory_level(snapshot, thresholds).max(swap_level(snapshot, thresholds))
}

fn severity(level: HealthStatus) -> Option<Severity> {
    match level {
        HealthStatus::Healthy => None,
        HealthStatus::Caution => Some(Severity::Warning),
        HealthStatus::Critical => Some(Severity::Critical),
    }
}

fn recommend(kind: RecommendationKind, severity: Severity, message: String) -> Recommendation {
    Recommendation {
        kind,
        severity,
        message,
    }
}

/// Recommendations in fixed order: memory, swap, budget, services, disk,
/// pricing. Each rule fires on its own.
#[must_use]
pub fn recommendations(
    snapshot: &MetricsSnapshot,
    costs: &CostSummary,
    thresholds: &Thresholds,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let (Some(memory), Some(sev)) = (
        snapshot.memory.value(),
        severity(memory_level(snapshot, thresholds)),
    ) {
        let message = match sev {
            Severity::Critical => format!(
                "RAM bijna vol ({}): sluit zware applicaties of ontlaad modellen",
                format_percent(memory.used_percent)
            ),
            _ => format!(
                "RAM-gebruik verhoogd ({}): blijf monitoren",
                format_percent(memory.used_percent)
            ),
        };
        out.push(recommend(RecommendationKind::Memory, sev, message));
    }

    if let (Some(swap), Some(sev)) = (
        snapshot.swap.value(),
        severity(swap_level(snapshot, thresholds)),
    ) {
        out.push(recommend(
            RecommendationKind::Swap,
            sev,
            format!(
                "Swapgebruik {}: overweeg RAM-uitbreiding",
                format_percent(swap.used_percent)
            ),
        ));
    }

    if let Some(budget) = &costs.budget {
        if budget.remaining < 0.0 {
            out.push(recommend(
                RecommendationKind::Budget,
                Severity::Critical,
                format!(
                    "Maandbudget overschreden met {} (limiet {})",
                    format_money(-budget.remaining, costs.currency),
                    format_money(budget.monthly_limit, costs.currency)
                ),
            ));
        } else if budget.alert {
            out.push(recommend(
                RecommendationKind::Budget,
                Severity::Warning,
                format!(
                    "{} van het maandbudget verbruikt, prognose maandeinde {} (limiet {})",
                    format_percent(budget.used_percent),
                    format_money(budget.projected_month_end, costs.currency),
                    format_money(budget.monthly_limit, costs.currency)
                ),
            ));
        }
    }

    if let Some(reason) = snapshot.model_daemon.reason() {
        if reason != DAEMON_DISABLED {
            out.push(recommend(
                RecommendationKind::Service,
                Severity::Warning,
                format!("Ollama niet bereikbaar: {reason}"),
            ));
        }
    }
    if let Some(reason) = snapshot.document_store.reason() {
        out.push(recommend(
            RecommendationKind::Service,
            Severity::Warning,
            format!("Documentopslag niet beschikbaar: {reason}"),
        ));
    }
    if let Some(reason) = costs.ledger.reason() {
        out.push(recommend(
            RecommendationKind::Service,
            Severity::Warning,
            format!("Tokenregister niet leesbaar: {reason}"),
        ));
    }

    if let Some(disk) = snapshot.disk.value() {
        if disk.used_percent >= thresholds.disk_warning_percent {
            out.push(recommend(
                RecommendationKind::Disk,
                Severity::Critical,
                format!(
                    "Schijf {} bijna vol ({}): opruimen nodig",
                    disk.mount,
                    format_percent(disk.used_percent)
                ),
            ));
        }
    }

    for gap in &costs.pricing_gaps {
        out.push(recommend(
            RecommendationKind::Pricing,
            Severity::Info,
            format!(
                "Geen prijs bekend voor {}/{} ({} tokens niet meegeteld in kosten)",
                gap.provider,
                gap.model,
                format_thousands(gap.tokens)
            ),
        ));
    }

    out
}

/// Everything that could not contribute to the report.
#[must_use]
pub fn degraded_sources(snapshot: &MetricsSnapshot, costs: &CostSummary) -> Vec<DegradedSource> {
    let mut out: Vec<DegradedSource> = snapshot
        .unavailable_sources()
        .into_iter()
        .filter(|(_, reason)| *reason != DAEMON_DISABLED)
        .map(|(source, reason)| DegradedSource {
            source: source.to_string(),
            category: ErrorCategory::SourceUnavailable,
            reason: reason.to_string(),
        })
        .collect();

    if let Some(reason) = costs.ledger.reason() {
        out.push(DegradedSource {
            source: "ledger".to_string(),
            category: ErrorCategory::LedgerUnavailable,
            reason: reason.to_string(),
        });
    }

    out.extend(costs.pricing_gaps.iter().map(|gap| DegradedSource {
        source: format!("pricing:{}/{}", gap.provider, gap.model),
        category: ErrorCategory::PricingGap,
        reason: format!("no price entry; {} tokens counted at zero cost", gap.tokens),
    }));

    out
}

/// Merge snapshot and costs into a report. The generation time is the
/// snapshot's capture time.
#[must_use]
pub fn build_report(
    snapshot: MetricsSnapshot,
    costs: CostSummary,
    trend: Option<Trend>,
    thresholds: &Thresholds,
) -> Report {
    let health = classify_health(&snapshot, thresholds);
    let recommendations = recommendations(&snapshot, &costs, thresholds);
    let degraded = degraded_sources(&snapshot, &costs);

    tracing::debug!(
        %health,
        recommendations = recommendations.len(),
        degraded = degraded.len(),
        "report built"
    );

    Report {
        generated_at: snapshot.captured_at,
        health,
        snapshot,
        costs,
        trend,
        recommendations,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{BudgetStatus, DiskMetrics, PricingGap, Probe};
    use crate::test_utils::{make_test_cost_summary, make_test_snapshot};

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn default_thresholds_are_valid() {
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn threshold_equal_to_critical_is_rejected() {
        let t = Thresholds {
            ram_warning_percent: 90.0,
            ..Thresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn threshold_above_hundred_is_rejected() {
        let t = Thresholds {
            disk_warning_percent: 101.0,
            ..Thresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn healthy_below_warning() {
        let snapshot = make_test_snapshot(60.0, 10.0);
        let costs = make_test_cost_summary();
        let t = Thresholds::default();

        assert_eq!(classify_health(&snapshot, &t), HealthStatus::Healthy);
        assert!(recommendations(&snapshot, &costs, &t).is_empty());
    }

    #[test]
    fn value_at_threshold_trips_it() {
        let t = Thresholds::default();
        assert_eq!(
            classify_health(&make_test_snapshot(75.0, 0.0), &t),
            HealthStatus::Caution
        );
        assert_eq!(
            classify_health(&make_test_snapshot(90.0, 0.0), &t),
            HealthStatus::Critical
        );
        assert_eq!(
            classify_health(&make_test_snapshot(10.0, 50.0), &t),
            HealthStatus::Caution
        );
    }

    #[test]
    fn critical_memory_dominates_swap() {
        let t = Thresholds::default();
        for swap in [0.0, 55.0, 85.0] {
            assert_eq!(
                classify_health(&make_test_snapshot(95.0, swap), &t),
                HealthStatus::Critical
            );
        }
    }

    #[test]
    fn memory_critical_scenario() {
        let report = build_report(
            make_test_snapshot(92.0, 40.0),
            make_test_cost_summary(),
            None,
            &Thresholds::default(),
        );

        assert_eq!(report.health, HealthStatus::Critical);
        assert_eq!(kinds(&report.recommendations), vec![RecommendationKind::Memory]);
        assert_eq!(report.recommendations[0].severity, Severity::Critical);
        assert!(report.degraded.is_empty());
    }

    #[test]
    fn unavailable_memory_counts_as_healthy() {
        let mut snapshot = make_test_snapshot(0.0, 0.0);
        snapshot.memory = Probe::unavailable("no meminfo");
        snapshot.swap = Probe::unavailable("no meminfo");
        assert_eq!(
            classify_health(&snapshot, &Thresholds::default()),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn recommendations_keep_fixed_order() {
        let mut snapshot = make_test_snapshot(80.0, 85.0);
        snapshot.disk = Probe::Available(DiskMetrics {
            mount: "/".to_string(),
            total_bytes: 100,
            free_bytes: 5,
            used_percent: 95.0,
        });
        snapshot.document_store = Probe::unavailable("missing");

        let mut costs = make_test_cost_summary();
        costs.budget = Some(BudgetStatus {
            monthly_limit: 10.0,
            spent: 12.5,
            remaining: -2.5,
            used_percent: 125.0,
            alert_percent: 80.0,
            projected_month_end: 30.0,
            alert: true,
        });
        costs.pricing_gaps.push(PricingGap {
            provider: "mistral".to_string(),
            model: "mistral-large".to_string(),
            tokens: 1_500,
            calls: 2,
        });

        let recs = recommendations(&snapshot, &costs, &Thresholds::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::Memory,
                RecommendationKind::Swap,
                RecommendationKind::Budget,
                RecommendationKind::Service,
                RecommendationKind::Disk,
                RecommendationKind::Pricing,
            ]
        );
        assert!(recs[2].message.contains("€ 2,50"));
        assert!(recs[5].message.contains("1.500"));
    }

    #[test]
    fn budget_alert_without_overrun_is_warning() {
        let mut costs = make_test_cost_summary();
        costs.budget = Some(BudgetStatus {
            monthly_limit: 100.0,
            spent: 85.0,
            remaining: 15.0,
            used_percent: 85.0,
            alert_percent: 80.0,
            projected_month_end: 110.0,
            alert: true,
        });
        let recs = recommendations(&make_test_snapshot(10.0, 0.0), &costs, &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Warning);
    }

    #[test]
    fn disabled_daemon_is_not_degraded() {
        let mut snapshot = make_test_snapshot(10.0, 0.0);
        snapshot.model_daemon = Probe::unavailable(DAEMON_DISABLED);
        let costs = make_test_cost_summary();

        assert!(degraded_sources(&snapshot, &costs).is_empty());
        assert!(recommendations(&snapshot, &costs, &Thresholds::default()).is_empty());
    }

    #[test]
    fn degraded_lists_probes_ledger_and_gaps() {
        let mut snapshot = make_test_snapshot(10.0, 0.0);
        snapshot.temperature = Probe::unavailable("no thermal zones");
        let mut costs = make_test_cost_summary();
        costs.ledger = Probe::unavailable("file not found");
        costs.pricing_gaps.push(PricingGap {
            provider: "x".to_string(),
            model: "y".to_string(),
            tokens: 10,
            calls: 1,
        });

        let degraded = degraded_sources(&snapshot, &costs);
        let categories: Vec<_> = degraded.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![
                ErrorCategory::SourceUnavailable,
                ErrorCategory::LedgerUnavailable,
                ErrorCategory::PricingGap,
            ]
        );
        assert_eq!(degraded[0].source, "temperature");
    }

    #[test]
    fn report_time_comes_from_snapshot() {
        let snapshot = make_test_snapshot(10.0, 0.0);
        let at = snapshot.captured_at;
        let report = build_report(snapshot, make_test_cost_summary(), None, &Thresholds::default());
        assert_eq!(report.generated_at, at);
    }
}
