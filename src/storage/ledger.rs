//! Read-only access to the token-usage ledger.
//!
//! The ledger is a SQLite file written by another process. Only the
//! `model_calls` table is read, and only these columns:
//!
//! | column          | type    | notes                          |
//! |-----------------|---------|--------------------------------|
//! | `timestamp`     | TEXT    | ISO 8601, `T` or space         |
//! | `provider`      | TEXT    |                                |
//! | `model`         | TEXT    |                                |
//! | `project_id`    | TEXT    | NULL → `unknown`               |
//! | `input_tokens`  | INTEGER | negative values clamp to zero  |
//! | `output_tokens` | INTEGER |                                |

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, params};

use crate::core::aggregate::{CostQuery, empty_summary, summarize};
use crate::core::models::{CostSummary, LedgerInfo, LedgerRead, Probe, UNKNOWN_PROJECT, UsageEvent};
use crate::core::pricing::{Conversion, PricingTable};
use crate::error::{Result, StatusError};
use crate::util::time::{DateRange, parse_ledger_timestamp};

/// Raw ledger row before timestamp parsing.
struct RawRow {
    timestamp: Option<String>,
    provider: Option<String>,
    model: Option<String>,
    project: Option<String>,
    input_tokens: Option<i64>,
    output_tokens: Option<i64>,
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    })
}

fn integer(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(value) => Some(value),
        #[allow(clippy::cast_possible_truncation)]
        ValueRef::Real(value) => Some(value as i64),
        _ => None,
    })
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        timestamp: text(row, 0)?,
        provider: text(row, 1)?,
        model: text(row, 2)?,
        project: text(row, 3)?,
        input_tokens: integer(row, 4)?,
        output_tokens: integer(row, 5)?,
    })
}

fn clamp_tokens(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawRow {
    fn into_event(self) -> Option<UsageEvent> {
        let timestamp = parse_ledger_timestamp(self.timestamp.as_deref()?)?;
        Some(UsageEvent {
            timestamp,
            provider: non_empty(self.provider).unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            model: non_empty(self.model).unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            project: non_empty(self.project).unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            input_tokens: clamp_tokens(self.input_tokens),
            output_tokens: clamp_tokens(self.output_tokens),
        })
    }
}

/// Read-only handle to the ledger.
pub struct UsageLedger {
    conn: Connection,
    path: PathBuf,
}

impl UsageLedger {
    /// Open the ledger read-only.
    ///
    /// # Errors
    ///
    /// `LedgerUnavailable` if the file does not exist or cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| StatusError::LedgerUnavailable {
            path: path.display().to_string(),
            reason,
        };

        if !path.is_file() {
            return Err(unavailable("file not found".to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(format!("open: {e}")))?;
        conn.busy_timeout(std::time::Duration::from_secs(2))
            .map_err(|e| unavailable(format!("busy timeout: {e}")))?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    fn unavailable(&self, reason: String) -> StatusError {
        StatusError::LedgerUnavailable {
            path: self.path.display().to_string(),
            reason,
        }
    }

    /// Read every event with a timestamp inside `range`.
    ///
    /// Rows whose timestamp cannot be parsed are skipped and counted.
    pub fn read_range(&self, range: &DateRange) -> Result<LedgerRead> {
        let (start, end) = range.sql_bounds();

        let mut stmt = self
            .conn
            .prepare_cached(
                r"
                SELECT timestamp, provider, model, project_id, input_tokens, output_tokens
                FROM model_calls
                WHERE timestamp >= ?1 AND timestamp < ?2
                ORDER BY timestamp ASC
                ",
            )
            .map_err(|e| self.unavailable(format!("prepare select: {e}")))?;

        let rows = stmt
            .query_map(params![start, end], map_row)
            .map_err(|e| self.unavailable(format!("query model_calls: {e}")))?;

        let mut read = LedgerRead::default();
        for row in rows {
            let raw = row.map_err(|e| self.unavailable(format!("map row: {e}")))?;
            match raw.into_event() {
                Some(event) if range.contains(event.timestamp.date_naive()) => {
                    read.events.push(event);
                }
                Some(_) => {}
                None => read.skipped_rows += 1,
            }
        }

        if read.skipped_rows > 0 {
            tracing::warn!(
                skipped = read.skipped_rows,
                path = %self.path.display(),
                "skipped ledger rows with unreadable timestamps"
            );
        }
        tracing::debug!(events = read.events.len(), %start, %end, "ledger read");

        Ok(read)
    }
}

/// Read the ledger and aggregate it; a ledger that cannot be read yields a
/// zero summary marked unavailable instead of an error.
#[must_use]
pub fn load_cost_summary(
    path: &Path,
    query: &CostQuery,
    pricing: &PricingTable,
    conversion: Conversion,
) -> CostSummary {
    let read = UsageLedger::open(path).and_then(|ledger| ledger.read_range(&query.range));
    match read {
        Ok(read) => {
            let info = LedgerInfo {
                path: path.display().to_string(),
                events: read.events.len() as u64,
                skipped_rows: read.skipped_rows,
            };
            summarize(&read.events, query, pricing, conversion, Probe::Available(info))
        }
        Err(err) => {
            tracing::warn!(error = %err, "ledger unavailable");
            empty_summary(query, conversion, &err.to_string())
        }
    }
}
