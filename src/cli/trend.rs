//! Trend command implementation.

use chrono::{DateTime, Utc};

use crate::cli::args::TrendArgs;
use crate::core::aggregate::CostQuery;
use crate::error::Result;
use crate::render::{self, RenderOptions};
use crate::storage::{ResolvedConfig, load_cost_summary};

/// Execute the trend command.
pub fn execute(
    args: &TrendArgs,
    config: &ResolvedConfig,
    options: RenderOptions,
    now: DateTime<Utc>,
) -> Result<()> {
    let period = args.time_range();
    let query = CostQuery {
        period: period.label(),
        range: period.resolve(now.date_naive())?,
        bucket: Some(args.bucket.size()),
    };

    tracing::debug!(period = %query.period, bucket = ?args.bucket, "building trend");
    let summary = load_cost_summary(
        &config.ledger_path,
        &query,
        &config.pricing_table(),
        config.conversion(),
    );

    let output = render::render_trend(&summary, now, config.format, options)?;
    println!("{output}");
    Ok(())
}
