//! Structured (JSON) output.
//!
//! Every command wraps its data in a [`RobotOutput`] envelope. The envelope's
//! timestamp comes from the data, so the same inputs serialize to the same
//! bytes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::{CostSummary, Report, RobotOutput};
use crate::error::Result;

/// Serialize any value as compact or pretty JSON.
pub fn render_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(json)
}

/// Report envelope. Degraded sources are repeated in `errors` as
/// `source: reason` lines.
pub fn render_report(report: &Report, pretty: bool) -> Result<String> {
    let errors = report
        .degraded
        .iter()
        .map(|d| format!("{}: {}", d.source, d.reason))
        .collect();
    let output = RobotOutput::with_errors("report", report.generated_at, report, errors);
    render_json(&output, pretty)
}

/// Trend envelope for the `trend` command.
pub fn render_trend(
    summary: &CostSummary,
    generated_at: DateTime<Utc>,
    pretty: bool,
) -> Result<String> {
    let errors = summary
        .ledger
        .reason()
        .map(|r| vec![format!("ledger: {r}")])
        .unwrap_or_default();
    let output = RobotOutput::with_errors("trend", generated_at, summary, errors);
    render_json(&output, pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Probe;
    use crate::test_utils::make_test_report;
    use crate::{assert_contains, assert_json_valid};

    #[test]
    fn report_envelope_fields() {
        let report = make_test_report();
        let json = render_report(&report, false).unwrap();
        assert_json_valid!(&json);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schemaVersion"], "server-status.v1");
        assert_eq!(value["command"], "report");
        assert_eq!(value["data"]["health"], "HEALTHY");
        assert_eq!(value["data"]["snapshot"]["memory"]["status"], "available");
        assert_eq!(
            value["generatedAt"],
            value["data"]["generatedAt"],
            "envelope time is the report time"
        );
    }

    #[test]
    fn same_report_same_bytes() {
        let report = make_test_report();
        assert_eq!(
            render_report(&report, false).unwrap(),
            render_report(&report, false).unwrap()
        );
        assert_eq!(
            render_report(&report, true).unwrap(),
            render_report(&report, true).unwrap()
        );
    }

    #[test]
    fn pretty_output_is_indented() {
        let json = render_report(&make_test_report(), true).unwrap();
        assert_contains!(&json, "\n  \"schemaVersion\"");
    }

    #[test]
    fn degraded_sources_become_errors() {
        let mut report = make_test_report();
        report.snapshot.document_store = Probe::unavailable("missing");
        report.degraded = crate::core::report::degraded_sources(&report.snapshot, &report.costs);

        let value: serde_json::Value =
            serde_json::from_str(&render_report(&report, false).unwrap()).unwrap();
        assert_eq!(value["errors"][0], "documentStore: missing");
        assert_eq!(value["data"]["snapshot"]["documentStore"]["status"], "unavailable");
    }

    #[test]
    fn trend_envelope() {
        let report = make_test_report();
        let json = render_trend(&report.costs, report.generated_at, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"], "trend");
        assert!(value["data"]["buckets"].is_array());
        assert_eq!(value["errors"].as_array().map(Vec::len), Some(0));
    }
}
