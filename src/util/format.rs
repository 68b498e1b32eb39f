//! Number formatting in Dutch notation.
//!
//! Thousands are grouped with `.`, decimals use `,`.

use crate::core::pricing::Currency;

/// Group an integer with dots: `1234567` → `1.234.567`.
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format a decimal with a fixed number of places and Dutch separators.
#[must_use]
pub fn format_decimal(value: f64, places: usize) -> String {
    let rendered = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = rendered
        .split_once('.')
        .map_or((rendered.as_str(), ""), |(i, f)| (i, f));
    let grouped = int_part
        .parse::<u64>()
        .map_or_else(|_| int_part.to_string(), format_thousands);
    let negative = value < 0.0 && rendered.chars().any(|c| c != '0' && c != '.');
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// Format a money amount: `€ 12,34`, or four decimals below one unit so
/// small token costs stay visible.
#[must_use]
pub fn format_money(value: f64, currency: Currency) -> String {
    let places = if value != 0.0 && value.abs() < 1.0 { 4 } else { 2 };
    let amount = format_decimal(value, places);
    match amount.strip_prefix('-') {
        Some(abs) => format!("-{} {abs}", currency.symbol()),
        None => format!("{} {amount}", currency.symbol()),
    }
}

/// Format a percentage with one decimal: `72,5%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_decimal(value, 1))
}

/// Format a byte count in GB with one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_gb(bytes: u64) -> String {
    format!("{} GB", format_decimal(bytes as f64 / 1024f64.powi(3), 1))
}

/// Format a byte count in MB with one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_mb(bytes: u64) -> String {
    format!("{} MB", format_decimal(bytes as f64 / 1024f64.powi(2), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1.000");
        assert_eq!(format_thousands(1_234_567), "1.234.567");
    }

    #[test]
    fn money_in_euros() {
        assert_eq!(format_money(12.34, Currency::Eur), "€ 12,34");
        assert_eq!(format_money(1234.5, Currency::Eur), "€ 1.234,50");
        assert_eq!(format_money(0.0, Currency::Eur), "€ 0,00");
    }

    #[test]
    fn small_amounts_keep_four_decimals() {
        assert_eq!(format_money(0.0028, Currency::Usd), "$ 0,0028");
    }

    #[test]
    fn negative_amounts() {
        assert_eq!(format_money(-5.5, Currency::Eur), "-€ 5,50");
        assert_eq!(format_decimal(-0.0001, 2), "0,00");
    }

    #[test]
    fn percent_and_sizes() {
        assert_eq!(format_percent(72.46), "72,5%");
        assert_eq!(format_gb(8 * 1024 * 1024 * 1024), "8,0 GB");
        assert_eq!(format_mb(1024 * 1024 * 3 / 2), "1,5 MB");
    }
}
