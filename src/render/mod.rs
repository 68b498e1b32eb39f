//! Output rendering for narrative and structured modes.

pub mod error;
pub mod narrative;
pub mod structured;

use chrono::{DateTime, Utc};

use crate::cli::args::OutputFormat;
use crate::core::models::{CostSummary, Report};
use crate::error::Result;

/// How to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Indent JSON.
    pub pretty: bool,
    /// Colour the health label.
    pub color: bool,
    /// Detailed narrative: reasons, top projects, trend.
    pub verbose: bool,
}

/// Render a report.
pub fn render_report(report: &Report, format: OutputFormat, options: RenderOptions) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(narrative::render_report(report, options)),
        OutputFormat::Json => structured::render_report(report, options.pretty),
    }
}

/// Render a trend summary.
pub fn render_trend(
    summary: &CostSummary,
    generated_at: DateTime<Utc>,
    format: OutputFormat,
    options: RenderOptions,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(narrative::render_trend(summary)),
        OutputFormat::Json => structured::render_trend(summary, generated_at, options.pretty),
    }
}
