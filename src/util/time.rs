//! Date ranges, ledger timestamps, and trend bucket keys.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::core::models::BucketSize;
use crate::error::{Result, StatusError};

/// A period to aggregate over, relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// One calendar month.
    Month { year: i32, month: u32 },
    /// The last `n` calendar days, today included.
    LastDays(u32),
    /// From the Monday of the ISO week `n - 1` weeks ago through today.
    LastWeeks(u32),
    /// From the first of the month `n - 1` months ago through today.
    LastMonths(u32),
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Bounds as `YYYY-MM-DD` strings for SQL comparison, one day wider on
    /// each side.
    ///
    /// Stored timestamps may carry a UTC offset, so their text does not sort
    /// by instant. Callers make the exact cut with [`DateRange::contains`].
    #[must_use]
    pub fn sql_bounds(&self) -> (String, String) {
        let start = self.start.checked_sub_days(Days::new(1)).unwrap_or(self.start);
        let end = self.end.checked_add_days(Days::new(1)).unwrap_or(self.end);
        (
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        )
    }
}

impl TimeRange {
    /// The month containing `today`.
    #[must_use]
    pub fn current_month(today: NaiveDate) -> Self {
        Self::Month {
            year: today.year(),
            month: today.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse_month(value: &str) -> Result<Self> {
        let invalid = || StatusError::ConfigInvalid {
            key: "month".to_string(),
            message: format!("expected YYYY-MM, got '{value}'"),
        };
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self::Month { year, month })
    }

    /// Short label used in reports.
    #[must_use]
    pub fn label(&self) -> String {
        match *self {
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
            Self::LastDays(1) => "vandaag".to_string(),
            Self::LastDays(n) => format!("laatste {n} dagen"),
            Self::LastWeeks(1) => "deze week".to_string(),
            Self::LastWeeks(n) => format!("laatste {n} weken"),
            Self::LastMonths(1) => "deze maand".to_string(),
            Self::LastMonths(n) => format!("laatste {n} maanden"),
        }
    }

    /// Resolve to concrete dates.
    ///
    /// # Errors
    ///
    /// A zero-length relative range or an out-of-range date is a
    /// configuration error.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange> {
        let tomorrow = next_day(today)?;
        match *self {
            Self::Month { year, month } => {
                let start = first_of_month(year, month)?;
                let (next_year, next_month) = shift_month(year, month, 1);
                Ok(DateRange {
                    start,
                    end: first_of_month(next_year, next_month)?,
                })
            }
            Self::LastDays(n) => {
                let n = non_zero(n, "days")?;
                let start = today
                    .checked_sub_days(Days::new(u64::from(n - 1)))
                    .ok_or_else(|| out_of_range("days"))?;
                Ok(DateRange {
                    start,
                    end: tomorrow,
                })
            }
            Self::LastWeeks(n) => {
                let n = non_zero(n, "weeks")?;
                let monday = today.week(Weekday::Mon).first_day();
                let start = monday
                    .checked_sub_days(Days::new(u64::from(n - 1) * 7))
                    .ok_or_else(|| out_of_range("weeks"))?;
                Ok(DateRange {
                    start,
                    end: tomorrow,
                })
            }
            Self::LastMonths(n) => {
                let n = non_zero(n, "months")?;
                let back = i32::try_from(n - 1).map_err(|_| out_of_range("months"))?;
                let (year, month) = shift_month(today.year(), today.month(), -back);
                Ok(DateRange {
                    start: first_of_month(year, month)?,
                    end: tomorrow,
                })
            }
        }
    }

    /// Relative range of `n` units of the given bucket size.
    #[must_use]
    pub const fn last(bucket: BucketSize, n: u32) -> Self {
        match bucket {
            BucketSize::Day => Self::LastDays(n),
            BucketSize::Week => Self::LastWeeks(n),
            BucketSize::Month => Self::LastMonths(n),
        }
    }
}

fn non_zero(n: u32, unit: &str) -> Result<u32> {
    if n == 0 {
        Err(StatusError::ConfigInvalid {
            key: "last".to_string(),
            message: format!("number of {unit} must be at least 1"),
        })
    } else {
        Ok(n)
    }
}

fn out_of_range(unit: &str) -> StatusError {
    StatusError::ConfigInvalid {
        key: "last".to_string(),
        message: format!("range of {unit} reaches outside the calendar"),
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt().ok_or_else(|| out_of_range("days"))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| StatusError::ConfigInvalid {
        key: "month".to_string(),
        message: format!("{year:04}-{month:02} is not a valid month"),
    })
}

/// Move `delta` months from `(year, month)`.
#[must_use]
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + i32::try_from(month).unwrap_or(1) - 1 + delta;
    let year = index.div_euclid(12);
    let month = u32::try_from(index.rem_euclid(12)).unwrap_or(0) + 1;
    (year, month)
}

/// Number of days in a month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = shift_month(year, month, 1);
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => u32::try_from((end - start).num_days()).unwrap_or(30),
        _ => 30,
    }
}

/// Parse a ledger timestamp.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` values; naive
/// values are taken as UTC.
#[must_use]
pub fn parse_ledger_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Bucket key and bucket start date for a day.
#[must_use]
pub fn bucket_key(date: NaiveDate, size: BucketSize) -> (String, NaiveDate) {
    match size {
        BucketSize::Day => (date.format("%Y-%m-%d").to_string(), date),
        BucketSize::Week => {
            let iso = date.iso_week();
            (
                format!("{:04}-W{:02}", iso.year(), iso.week()),
                date.week(Weekday::Mon).first_day(),
            )
        }
        BucketSize::Month => (
            format!("{:04}-{:02}", date.year(), date.month()),
            date.with_day(1).unwrap_or(date),
        ),
    }
}
