//! Monthly budget check.
//!
//! ## TOML Configuration Format
//!
//! ```toml
//! [budget]
//! monthly_limit = 100.0   # in the reporting currency; 0 disables the check
//! alert_percent = 80.0
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::models::BudgetStatus;
use crate::error::{Result, StatusError};
use crate::util::time::days_in_month;

/// Budget limits from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Monthly spend limit in the reporting currency.
    pub monthly_limit: f64,
    /// Percentage of the limit at which the alert fires.
    pub alert_percent: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_limit: 100.0,
            alert_percent: 80.0,
        }
    }
}

impl BudgetConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.monthly_limit > 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if !self.monthly_limit.is_finite() || self.monthly_limit < 0.0 {
            return Err(StatusError::ConfigInvalid {
                key: "budget.monthly_limit".to_string(),
                message: "must be zero or a positive amount".to_string(),
            });
        }
        if !(self.alert_percent > 0.0 && self.alert_percent <= 100.0) {
            return Err(StatusError::ConfigInvalid {
                key: "budget.alert_percent".to_string(),
                message: "must be between 0 and 100".to_string(),
            });
        }
        Ok(())
    }
}

/// Days of `month` that have elapsed as of `today`.
///
/// A past month counts as fully elapsed; a future month as not started.
fn elapsed_days(year: i32, month: u32, today: NaiveDate) -> u32 {
    let total = days_in_month(year, month);
    match (year, month).cmp(&(today.year(), today.month())) {
        std::cmp::Ordering::Less => total,
        std::cmp::Ordering::Equal => today.day(),
        std::cmp::Ordering::Greater => 0,
    }
}

/// Evaluate spend for one calendar month against the budget.
///
/// `remaining` is never clamped: an overrun shows up as a negative amount.
/// The projection extrapolates the daily average over the whole month.
#[must_use]
pub fn evaluate(
    config: &BudgetConfig,
    spent: f64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<BudgetStatus> {
    if !config.is_enabled() {
        return None;
    }

    let limit = config.monthly_limit;
    let used_percent = spent / limit * 100.0;

    let elapsed = elapsed_days(year, month, today);
    let projected_month_end = if elapsed == 0 {
        spent
    } else {
        spent / f64::from(elapsed) * f64::from(days_in_month(year, month))
    };

    let alert = used_percent >= config.alert_percent || projected_month_end > limit;
    if alert {
        tracing::info!(
            spent,
            limit,
            projected = projected_month_end,
            "monthly budget alert"
        );
    }

    Some(BudgetStatus {
        monthly_limit: limit,
        spent,
        remaining: limit - spent,
        used_percent,
        alert_percent: config.alert_percent,
        projected_month_end,
        alert,
    })
}
