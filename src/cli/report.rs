//! Report command implementation.
//!
//! Snapshot and ledger are collected one after the other, merged into a
//! [`Report`], printed, and optionally dropped into the outbox.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::cli::args::{OutputFormat, ReportArgs};
use crate::core::aggregate::CostQuery;
use crate::core::budget;
use crate::core::models::{BucketSize, CostSummary, Report, Trend};
use crate::core::report::build_report;
use crate::core::snapshot::{SnapshotSources, capture};
use crate::delivery::Outbox;
use crate::error::Result;
use crate::render::{self, RenderOptions};
use crate::storage::{ResolvedConfig, load_cost_summary};
use crate::util::time::TimeRange;

/// Collect everything for one report.
///
/// # Errors
///
/// Only an invalid period fails; unavailable sources end up in the report.
pub async fn build(
    config: &ResolvedConfig,
    period: TimeRange,
    now: DateTime<Utc>,
) -> Result<Report> {
    let today = now.date_naive();
    let query = CostQuery {
        period: period.label(),
        range: period.resolve(today)?,
        bucket: None,
    };

    tracing::debug!(period = %query.period, "collecting snapshot");
    let snapshot = capture(&SnapshotSources::from_config(config), now).await;

    let pricing = config.pricing_table();
    let conversion = config.conversion();
    let mut costs = load_cost_summary(&config.ledger_path, &query, &pricing, conversion);

    if let TimeRange::Month { year, month } = period {
        if costs.ledger.is_available() {
            costs.budget = budget::evaluate(
                &config.file.budget,
                costs.totals.cost,
                year,
                month,
                today,
            );
        }
    }

    let trend = build_trend(config, now)?;

    Ok(build_report(snapshot, costs, trend, &config.file.thresholds))
}

/// Daily spend for the configured trend window, when the ledger is readable.
fn build_trend(config: &ResolvedConfig, now: DateTime<Utc>) -> Result<Option<Trend>> {
    let days = config.file.general.trend_days;
    if days == 0 {
        return Ok(None);
    }

    let period = TimeRange::LastDays(days);
    let query = CostQuery {
        period: period.label(),
        range: period.resolve(now.date_naive())?,
        bucket: Some(BucketSize::Day),
    };
    let summary: CostSummary = load_cost_summary(
        &config.ledger_path,
        &query,
        &config.pricing_table(),
        config.conversion(),
    );
    if !summary.ledger.is_available() {
        return Ok(None);
    }

    Ok(Some(Trend {
        bucket: BucketSize::Day,
        period: summary.period,
        buckets: summary.buckets.unwrap_or_default(),
    }))
}

/// Queue the report unless delivery is off. Returns the written path.
///
/// The queued body is rendered without colour.
pub fn deliver(
    report: &Report,
    config: &ResolvedConfig,
    format: OutputFormat,
) -> Result<Option<PathBuf>> {
    let notification = &config.file.notification;
    if !notification.enabled {
        tracing::debug!("notification disabled, not queueing");
        return Ok(None);
    }

    let body = render::render_report(
        report,
        format,
        RenderOptions {
            pretty: config.pretty,
            color: false,
            verbose: config.verbose,
        },
    )?;
    let outbox = Outbox::new(
        &config.outbox_dir,
        notification.channel.as_str(),
        notification.chat_id,
    );
    outbox
        .deliver(&body, format.as_str(), report.health, report.generated_at)
        .map(Some)
}

/// Execute the report command.
pub async fn execute(
    args: &ReportArgs,
    config: &ResolvedConfig,
    options: RenderOptions,
    now: DateTime<Utc>,
) -> Result<()> {
    let period = args.time_range(now.date_naive())?;
    let report = build(config, period, now).await?;

    let output = render::render_report(&report, config.format, options)?;
    println!("{output}");

    if args.no_deliver {
        tracing::debug!("--no-deliver given, skipping outbox");
        return Ok(());
    }
    if let Some(path) = deliver(&report, config, config.format)? {
        tracing::debug!(path = %path.display(), "delivered");
    }
    Ok(())
}
