//! Narrative (Dutch text) rendering.
//!
//! Everything printed here comes from [`Report`] fields; no probe or clock is
//! consulted. Colour is limited to the health label.

use colored::Colorize;

use crate::core::models::{
    CostBucket, CostSummary, HealthStatus, ModelCost, Probe, Report, Severity, TokenTotals,
};
use crate::core::pricing::Currency;
use crate::util::format::{format_decimal, format_gb, format_mb, format_money, format_percent, format_thousands};

use super::RenderOptions;

const RULE_WIDTH: usize = 60;
const TOP_PROJECTS: usize = 10;
const UNAVAILABLE: &str = "niet beschikbaar";
const PRICE_UNKNOWN: &str = "prijs onbekend";

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn health_label(health: HealthStatus, color: bool) -> String {
    if !color {
        return health.as_str().to_string();
    }
    match health {
        HealthStatus::Healthy => health.as_str().green().bold().to_string(),
        HealthStatus::Caution => health.as_str().yellow().bold().to_string(),
        HealthStatus::Critical => health.as_str().red().bold().to_string(),
    }
}

/// `niet beschikbaar`, with the reason appended in verbose mode.
fn unavailable<T>(probe: &Probe<T>, verbose: bool) -> String {
    match probe.reason() {
        Some(reason) if verbose => format!("{UNAVAILABLE} ({reason})"),
        _ => UNAVAILABLE.to_string(),
    }
}

fn model_cost(model: &ModelCost, currency: Currency) -> String {
    if model.priced {
        format_money(model.totals.cost, currency)
    } else {
        PRICE_UNKNOWN.to_string()
    }
}

/// Render the full report.
#[must_use]
pub fn render_report(report: &Report, options: RenderOptions) -> String {
    let mut lines = vec![
        rule(),
        format!(
            "SERVER STATUS — {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        rule(),
        String::new(),
        format!("Status: {}", health_label(report.health, options.color)),
        String::new(),
    ];

    system_lines(&mut lines, report, options.verbose);
    service_lines(&mut lines, report, options.verbose);
    cost_lines(&mut lines, &report.costs);
    recommendation_lines(&mut lines, report);

    if options.verbose {
        project_lines(&mut lines, &report.costs);
        if let Some(trend) = &report.trend {
            lines.push(String::new());
            lines.push(format!("TREND ({}):", trend.period));
            bucket_lines(&mut lines, &trend.buckets, report.costs.currency);
        }
        degraded_lines(&mut lines, report);
    }

    lines.push(String::new());
    lines.push(rule());
    lines.push(String::new());
    lines.join("\n")
}

fn system_lines(lines: &mut Vec<String>, report: &Report, verbose: bool) {
    let s = &report.snapshot;

    lines.push(match s.memory.value() {
        Some(m) => format!(
            "{:<7}{:>7}  ({} / {})",
            "RAM:",
            format_percent(m.used_percent),
            format_gb(m.used_bytes),
            format_gb(m.total_bytes)
        ),
        None => format!("{:<7}{}", "RAM:", unavailable(&s.memory, verbose)),
    });

    lines.push(match s.cpu.value() {
        Some(c) => {
            let cores = c
                .cores
                .map(|n| format!(" ({n} cores)"))
                .unwrap_or_default();
            format!(
                "{:<7}{:>7}  load{cores}",
                "CPU:",
                format_decimal(c.load_1m, 2)
            )
        }
        None => format!("{:<7}{}", "CPU:", unavailable(&s.cpu, verbose)),
    });

    lines.push(match s.swap.value() {
        Some(sw) => format!(
            "{:<7}{:>7}  ({} / {})",
            "Swap:",
            format_percent(sw.used_percent),
            format_gb(sw.used_bytes),
            format_gb(sw.total_bytes)
        ),
        None => format!("{:<7}{}", "Swap:", unavailable(&s.swap, verbose)),
    });

    lines.push(match s.disk.value() {
        Some(d) => format!(
            "{:<7}{:>7}  ({} vrij op {})",
            "Disk:",
            format_percent(d.used_percent),
            format_gb(d.free_bytes),
            d.mount
        ),
        None => format!("{:<7}{}", "Disk:", unavailable(&s.disk, verbose)),
    });

    lines.push(match s.temperature.value() {
        Some(t) => format!("{:<7}{:>7} °C", "Temp:", format_decimal(t.cpu_celsius, 1)),
        None => format!("{:<7}{}", "Temp:", unavailable(&s.temperature, verbose)),
    });
}

fn service_lines(lines: &mut Vec<String>, report: &Report, verbose: bool) {
    let s = &report.snapshot;
    lines.push(String::new());
    lines.push("SERVICES:".to_string());

    lines.push(match s.model_daemon.value() {
        Some(d) => {
            let installed = d
                .installed_models
                .map(|n| format!(", {n} geïnstalleerd"))
                .unwrap_or_default();
            format!(
                "  {:<12}{} geladen ({}){installed}",
                "Ollama:",
                d.loaded_models.len(),
                format_gb(d.loaded_bytes)
            )
        }
        None => format!("  {:<12}{}", "Ollama:", unavailable(&s.model_daemon, verbose)),
    });
    if verbose {
        if let Some(d) = s.model_daemon.value() {
            for model in &d.loaded_models {
                lines.push(format!("    • {:<28}{}", model.name, format_gb(model.size_bytes)));
            }
        }
    }

    lines.push(match s.document_store.value() {
        Some(store) => {
            let count = store
                .document_count
                .map_or_else(|| "? docs".to_string(), |n| format!("{} docs", format_thousands(n)));
            format!(
                "  {:<12}{count} ({})",
                "Documenten:",
                format_mb(store.size_bytes)
            )
        }
        None => format!(
            "  {:<12}{}",
            "Documenten:",
            unavailable(&s.document_store, verbose)
        ),
    });
}

fn cost_lines(lines: &mut Vec<String>, costs: &CostSummary) {
    let currency = costs.currency;
    lines.push(String::new());
    lines.push(format!("TOKEN TELEMETRIE ({}):", costs.period));

    if let Some(reason) = costs.ledger.reason() {
        lines.push(format!("  Tokenregister {UNAVAILABLE}: {reason}"));
        return;
    }

    lines.push(format!(
        "  {:<16}{:>14}",
        "Totaal tokens:",
        format_thousands(costs.totals.total_tokens)
    ));
    lines.push(format!(
        "  {:<16}{:>14}",
        "Totaal kosten:",
        format_money(costs.totals.cost, currency)
    ));
    lines.push(format!(
        "  {:<16}{:>14}",
        "Aanroepen:",
        format_thousands(costs.totals.calls)
    ));

    if !costs.by_provider.is_empty() {
        lines.push(String::new());
        lines.push("  Per aanbieder:".to_string());
        for provider in &costs.by_provider {
            let all_priced = provider.models.iter().all(|m| m.priced);
            let cost = if all_priced || provider.totals.cost > 0.0 {
                format_money(provider.totals.cost, currency)
            } else {
                PRICE_UNKNOWN.to_string()
            };
            lines.push(format!(
                "    {:<14}{:>14}  ({} tokens)",
                provider.provider,
                cost,
                format_thousands(provider.totals.total_tokens)
            ));
            for model in &provider.models {
                lines.push(format!(
                    "      • {:<28}{:>14}",
                    model.model,
                    model_cost(model, currency)
                ));
            }
        }
    }

    if let Some(budget) = &costs.budget {
        lines.push(String::new());
        let state = if budget.remaining < 0.0 {
            "overschreden"
        } else {
            "resterend"
        };
        lines.push(format!(
            "  Budget: {} {state} van {} ({} verbruikt)",
            format_money(budget.remaining.abs(), currency),
            format_money(budget.monthly_limit, currency),
            format_percent(budget.used_percent)
        ));
        lines.push(format!(
            "  Prognose maandeinde: {}",
            format_money(budget.projected_month_end, currency)
        ));
    }
}

fn recommendation_lines(lines: &mut Vec<String>, report: &Report) {
    lines.push(String::new());
    lines.push("AANBEVELINGEN:".to_string());
    if report.recommendations.is_empty() {
        lines.push("  Geen aanbevelingen: alles in orde".to_string());
        return;
    }
    for rec in &report.recommendations {
        let marker = match rec.severity {
            Severity::Critical => "[!!]",
            Severity::Warning => "[!] ",
            Severity::Info => "[i] ",
        };
        lines.push(format!("  {marker} {}", rec.message));
    }
}

fn project_lines(lines: &mut Vec<String>, costs: &CostSummary) {
    if costs.by_project.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("TOP PROJECTEN:".to_string());
    for project in costs.by_project.iter().take(TOP_PROJECTS) {
        lines.push(format!(
            "  {:<24}{:>14}  ({} tokens)",
            project.project,
            format_money(project.totals.cost, costs.currency),
            format_thousands(project.totals.total_tokens)
        ));
    }
}

fn bucket_lines(lines: &mut Vec<String>, buckets: &[CostBucket], currency: Currency) {
    if buckets.is_empty() {
        lines.push("  Geen gebruik in deze periode".to_string());
        return;
    }
    for bucket in buckets {
        lines.push(bucket_row(&bucket.key, &bucket.totals, currency));
    }
}

fn bucket_row(key: &str, totals: &TokenTotals, currency: Currency) -> String {
    format!(
        "  {:<12}{:>14} tokens {:>8} calls {:>14}",
        key,
        format_thousands(totals.total_tokens),
        format_thousands(totals.calls),
        format_money(totals.cost, currency)
    )
}

fn degraded_lines(lines: &mut Vec<String>, report: &Report) {
    if report.degraded.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("ONVOLLEDIG:".to_string());
    for source in &report.degraded {
        lines.push(format!(
            "  {:<24}{} ({})",
            source.source, source.reason, source.category
        ));
    }
}

/// Render a standalone trend summary (the `trend` command).
#[must_use]
pub fn render_trend(summary: &CostSummary) -> String {
    let mut lines = vec![format!("TOKEN TREND ({}):", summary.period)];

    if let Some(reason) = summary.ledger.reason() {
        lines.push(format!("  Tokenregister {UNAVAILABLE}: {reason}"));
        lines.push(String::new());
        return lines.join("\n");
    }

    let buckets = summary.buckets.as_deref().unwrap_or_default();
    bucket_lines(&mut lines, buckets, summary.currency);
    lines.push(format!("  {}", "-".repeat(RULE_WIDTH - 2)));
    lines.push(bucket_row("Totaal", &summary.totals, summary.currency));

    for gap in &summary.pricing_gaps {
        lines.push(format!(
            "  {PRICE_UNKNOWN}: {}/{} ({} tokens)",
            gap.provider,
            gap.model,
            format_thousands(gap.tokens)
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}
