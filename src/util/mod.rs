//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_decimal, format_money, format_percent, format_thousands};
pub use time::{DateRange, TimeRange};
