//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::models::BucketSize;
use crate::util::time::TimeRange;

/// Server Status - host health and token spend reports.
#[derive(Parser, Debug)]
#[command(name = "server-status")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Generate a report now (same as `report`)
    #[arg(long)]
    pub now: bool,

    // === Global flags ===
    /// Output format [default: text]
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Detailed report and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect metrics and costs, print the report and queue it
    Report(ReportArgs),

    /// Show token spend over time
    Trend(TrendArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the `report` command.
#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Print only; do not write to the outbox
    #[arg(long)]
    pub no_deliver: bool,

    /// Cost period as YYYY-MM [default: current month]
    #[arg(long, value_name = "YYYY-MM")]
    pub month: Option<String>,
}

impl ReportArgs {
    /// Cost period for the report.
    pub fn time_range(&self, today: chrono::NaiveDate) -> crate::error::Result<TimeRange> {
        self.month
            .as_deref()
            .map_or_else(|| Ok(TimeRange::current_month(today)), TimeRange::parse_month)
    }
}

/// Arguments for the `trend` command.
#[derive(Args, Debug)]
pub struct TrendArgs {
    /// Bucket size
    #[arg(long, value_enum, default_value = "day")]
    pub bucket: BucketArg,

    /// Number of buckets back from today
    #[arg(long, value_name = "N", default_value = "7")]
    pub last: u32,
}

impl TrendArgs {
    #[must_use]
    pub const fn time_range(&self) -> TimeRange {
        TimeRange::last(self.bucket.size(), self.last)
    }
}

/// Trend bucket size as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BucketArg {
    #[default]
    Day,
    Week,
    Month,
}

impl BucketArg {
    #[must_use]
    pub const fn size(self) -> BucketSize {
        match self {
            Self::Day => BucketSize::Day,
            Self::Week => BucketSize::Week,
            Self::Month => BucketSize::Month,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Dutch narrative text
    #[default]
    Text,
    /// JSON envelope
    Json,
}

impl OutputFormat {
    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn from_arg(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "human" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn now_flag_without_command() {
        let cli = Cli::parse_from(["server-status", "--now", "--format", "json"]);
        assert!(cli.now);
        assert!(cli.command.is_none());
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn report_args() {
        let cli = Cli::parse_from(["server-status", "report", "--no-deliver", "--month", "2026-02"]);
        match cli.command {
            Some(Commands::Report(args)) => {
                assert!(args.no_deliver);
                let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
                assert_eq!(
                    args.time_range(today).unwrap(),
                    TimeRange::Month {
                        year: 2026,
                        month: 2
                    }
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn trend_defaults() {
        let cli = Cli::parse_from(["server-status", "trend"]);
        match cli.command {
            Some(Commands::Trend(args)) => {
                assert_eq!(args.bucket, BucketArg::Day);
                assert_eq!(args.last, 7);
                assert_eq!(args.time_range(), TimeRange::LastDays(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["server-status", "trend", "--bucket", "week", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_from_arg() {
        assert_eq!(OutputFormat::from_arg("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_arg("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_arg("md"), None);
    }
}
