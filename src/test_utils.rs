//! Test utilities for server-status.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use server_status::test_utils::*;
//!
//! let snapshot = make_test_snapshot(92.0, 40.0);
//! let dir = TestDir::new();
//! dir.create_file("config.toml", "[budget]\nmonthly_limit = 50.0");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use crate::core::aggregate::{CostQuery, summarize};
use crate::core::models::{
    BucketSize, CostSummary, CpuMetrics, DiskMetrics, DocumentStoreMetrics, LedgerInfo,
    LoadedModel, MemoryMetrics, MetricsSnapshot, ModelDaemonMetrics, Probe, Report, SwapMetrics,
    TemperatureMetrics, UsageEvent,
};
use crate::core::pricing::{Conversion, PricingTable};
use crate::core::report::{Thresholds, build_report};
use crate::util::time::DateRange;

const GIB: u64 = 1024 * 1024 * 1024;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Fixed capture time used by the factories: 2026-03-15 12:00 UTC.
///
/// # Panics
///
/// Never for this constant date.
#[must_use]
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
        .single()
        .expect("valid test time")
}

/// Create a usage event from an RFC 3339 timestamp.
///
/// # Panics
///
/// Panics if `timestamp` is not valid RFC 3339.
#[must_use]
pub fn make_test_usage_event(
    timestamp: &str,
    provider: &str,
    model: &str,
    project: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> UsageEvent {
    UsageEvent {
        timestamp: DateTime::parse_from_rfc3339(timestamp)
            .expect("valid RFC 3339 timestamp")
            .with_timezone(&Utc),
        provider: provider.to_string(),
        model: model.to_string(),
        project: project.to_string(),
        input_tokens,
        output_tokens,
    }
}

/// One ledger row: timestamp, provider, model, project, input, output.
pub type LedgerRow<'a> = (&'a str, &'a str, &'a str, Option<&'a str>, i64, i64);

/// Create a SQLite ledger with a `model_calls` table and the given rows.
///
/// The table carries an extra `cost_eur` column like the real writer does;
/// readers must ignore it.
///
/// # Panics
///
/// Panics if the database cannot be created.
pub fn create_test_ledger(path: &Path, rows: &[LedgerRow<'_>]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create ledger directory");
    }
    let conn = rusqlite::Connection::open(path).expect("Failed to create ledger");
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS model_calls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            provider TEXT,
            model TEXT,
            project_id TEXT,
            input_tokens INTEGER,
            output_tokens INTEGER,
            cost_eur REAL DEFAULT 0
        );",
    )
    .expect("Failed to create model_calls");

    for (timestamp, provider, model, project, input, output) in rows {
        conn.execute(
            "INSERT INTO model_calls (timestamp, provider, model, project_id, input_tokens, output_tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![timestamp, provider, model, project, input, output],
        )
        .expect("Failed to insert ledger row");
    }
}

/// A snapshot with every probe available, memory and swap at the given
/// percentages, disk at 50 %.
#[must_use]
pub fn make_test_snapshot(memory_percent: f64, swap_percent: f64) -> MetricsSnapshot {
    let total = 16 * GIB;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let used = (total as f64 * memory_percent / 100.0) as u64;
    let swap_total = 8 * GIB;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let swap_used = (swap_total as f64 * swap_percent / 100.0) as u64;

    MetricsSnapshot {
        captured_at: test_time(),
        memory: Probe::Available(MemoryMetrics {
            total_bytes: total,
            used_bytes: used,
            available_bytes: total - used.min(total),
            used_percent: memory_percent,
        }),
        swap: Probe::Available(SwapMetrics {
            total_bytes: swap_total,
            used_bytes: swap_used,
            used_percent: swap_percent,
        }),
        cpu: Probe::Available(CpuMetrics {
            load_1m: 0.52,
            load_5m: 0.58,
            load_15m: 0.61,
            cores: Some(8),
        }),
        disk: Probe::Available(DiskMetrics {
            mount: "/".to_string(),
            total_bytes: 500 * GIB,
            free_bytes: 250 * GIB,
            used_percent: 50.0,
        }),
        temperature: Probe::Available(TemperatureMetrics { cpu_celsius: 52.0 }),
        model_daemon: Probe::Available(ModelDaemonMetrics {
            endpoint: "http://127.0.0.1:11434".to_string(),
            installed_models: Some(4),
            loaded_models: vec![LoadedModel {
                name: "mistral-small3.1:24b".to_string(),
                size_bytes: 15 * GIB,
                vram_bytes: None,
            }],
            loaded_bytes: 15 * GIB,
        }),
        document_store: Probe::Available(DocumentStoreMetrics {
            path: "/var/lib/index_data".to_string(),
            size_bytes: 12 * 1024 * 1024,
            document_count: Some(1_234),
        }),
    }
}

/// Events in March 2026: one priced call, one free local call, one more
/// priced call on a second day. No pricing gaps.
#[must_use]
pub fn make_test_usage_events() -> Vec<UsageEvent> {
    vec![
        make_test_usage_event(
            "2026-03-02T10:00:00Z",
            "anthropic",
            "claude-haiku-4-5-20251001",
            "alpha",
            1_000,
            500,
        ),
        make_test_usage_event(
            "2026-03-02T11:00:00Z",
            "ollama",
            "mistral-small3.1:24b",
            "beta",
            2_000,
            1_000,
        ),
        make_test_usage_event("2026-03-10T09:30:00Z", "openai", "gpt-4o", "alpha", 10_000, 2_000),
    ]
}

/// March 2026 query with daily buckets.
///
/// # Panics
///
/// Never for these constant dates.
#[must_use]
pub fn make_test_query() -> CostQuery {
    CostQuery {
        period: "2026-03".to_string(),
        range: DateRange {
            start: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            end: chrono::NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date"),
        },
        bucket: Some(BucketSize::Day),
    }
}

/// Cost summary over [`make_test_usage_events`] with built-in prices, in EUR.
#[must_use]
pub fn make_test_cost_summary() -> CostSummary {
    let events = make_test_usage_events();
    summarize(
        &events,
        &make_test_query(),
        &PricingTable::builtin(),
        Conversion::default(),
        Probe::Available(LedgerInfo {
            path: "token_usage.db".to_string(),
            events: events.len() as u64,
            skipped_rows: 0,
        }),
    )
}

/// A healthy report: memory 60 %, swap 10 %, all sources available.
#[must_use]
pub fn make_test_report() -> Report {
    build_report(
        make_test_snapshot(60.0, 10.0),
        make_test_cost_summary(),
        None,
        &Thresholds::default(),
    )
}

// =============================================================================
// Test Directory
// =============================================================================

/// A temporary directory for tests that is cleaned up on drop.
///
/// # Examples
///
/// ```rust,ignore
/// use server_status::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// let path = dir.create_file("outbox/.keep", "");
/// assert!(path.exists());
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories as
    /// needed. Returns the full path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
        path
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    /// Check if a file exists in the temporary directory.
    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    /// Get the full path to a file in the temporary directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            );
        }
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert approximate floating point equality.
///
/// ```rust,ignore
/// assert_float_eq!(70.0, 70.0000001);
/// assert_float_eq!(70.0, 70.05, 0.1); // Custom epsilon
/// ```
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, f64::EPSILON * 100.0)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    }};
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Check if a string contains ANSI escape sequences.
#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Sample config TOML exercising every section.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
report_interval_hours = 6
trend_days = 7

[thresholds]
ram_warning_percent = 75.0
ram_critical_percent = 90.0
swap_warning_percent = 50.0
swap_critical_percent = 80.0
disk_warning_percent = 90.0

[budget]
monthly_limit = 100.0
alert_percent = 80.0

[pricing]
currency = "EUR"
usd_to_eur = 0.92

[model_daemon]
enabled = false

[notification]
enabled = true
channel = "telegram"

[output]
format = "text"
color = false
pretty = false
"#
    .to_string()
}
