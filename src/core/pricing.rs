//! Price table and currency conversion for ledger usage.
//!
//! Rates are per million tokens in USD. The table is keyed by
//! `(provider, model)`, both normalized to lowercase. A provider-wide entry
//! with model `*` covers every model of that provider; local runtimes such as
//! `ollama` use it to price everything at zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model name that matches any model of its provider.
pub const WILDCARD_MODEL: &str = "*";

/// Default USD → EUR conversion rate.
pub const DEFAULT_USD_TO_EUR: f64 = 0.92;

/// Reporting currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
}

impl Currency {
    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eur => "€",
            Self::Usd => "$",
        }
    }

    /// Parse a currency code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "EUR" => Some(Self::Eur),
            "USD" => Some(Self::Usd),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Converts USD amounts into the reporting currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub currency: Currency,
    pub usd_to_eur: f64,
}

impl Conversion {
    #[must_use]
    pub const fn new(currency: Currency, usd_to_eur: f64) -> Self {
        Self {
            currency,
            usd_to_eur,
        }
    }

    /// Convert a USD amount.
    #[must_use]
    pub fn from_usd(&self, usd: f64) -> f64 {
        match self.currency {
            Currency::Usd => usd,
            Currency::Eur => usd * self.usd_to_eur,
        }
    }
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new(Currency::Eur, DEFAULT_USD_TO_EUR)
    }
}

/// Per-million token pricing for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Provider name (e.g., "anthropic").
    pub provider: String,
    /// Model identifier, or `*` for every model of the provider.
    pub model: String,
    /// Cost per million input tokens (USD).
    pub input_per_million: f64,
    /// Cost per million output tokens (USD).
    pub output_per_million: f64,
}

impl ModelPricing {
    #[must_use]
    pub fn new(
        provider: &str,
        model: &str,
        input_per_million: f64,
        output_per_million: f64,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            input_per_million,
            output_per_million,
        }
    }

    /// Cost in USD for the given token counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_usd(&self, input: u64, output: u64) -> f64 {
        let input_cost = (input as f64 / 1_000_000.0) * self.input_per_million;
        let output_cost = (output as f64 / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Price table keyed by `(provider, model)`.
#[derive(Debug, Clone)]
pub struct PricingTable {
    models: HashMap<(String, String), ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingTable {
    /// An empty table; every lookup is a pricing gap.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Built-in list prices.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::empty();

        // Anthropic
        table.add(ModelPricing::new("anthropic", "claude-3-5-sonnet-20241022", 3.0, 15.0));
        table.add(ModelPricing::new("anthropic", "claude-3-opus-20250219", 15.0, 75.0));
        table.add(ModelPricing::new("anthropic", "claude-haiku-4-5-20251001", 0.8, 4.0));

        // OpenAI
        table.add(ModelPricing::new("openai", "gpt-4o", 5.0, 15.0));
        table.add(ModelPricing::new("openai", "gpt-4o-mini", 0.15, 0.6));
        table.add(ModelPricing::new("openai", "gpt-4-turbo", 10.0, 30.0));

        // Google
        table.add(ModelPricing::new("gemini", "gemini-1.5-pro", 1.25, 5.0));
        table.add(ModelPricing::new("gemini", "gemini-1.5-flash", 0.075, 0.3));

        // Local models run for free
        table.add(ModelPricing::new("ollama", WILDCARD_MODEL, 0.0, 0.0));

        table
    }

    /// Built-in prices with configured entries layered on top.
    #[must_use]
    pub fn with_overrides(overrides: &[ModelPricing]) -> Self {
        let mut table = Self::builtin();
        for entry in overrides {
            table.add(entry.clone());
        }
        table
    }

    /// Insert or replace an entry.
    pub fn add(&mut self, pricing: ModelPricing) {
        let key = (
            pricing.provider.to_lowercase(),
            pricing.model.to_lowercase(),
        );
        self.models.insert(key, pricing);
    }

    /// Look up pricing; an exact model match beats the provider wildcard.
    #[must_use]
    pub fn get(&self, provider: &str, model: &str) -> Option<&ModelPricing> {
        let provider = provider.to_lowercase();
        self.models
            .get(&(provider.clone(), model.to_lowercase()))
            .or_else(|| self.models.get(&(provider, WILDCARD_MODEL.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_float_eq;

    #[test]
    fn builtin_table_has_anthropic_and_openai() {
        let table = PricingTable::builtin();
        assert!(table.get("anthropic", "claude-haiku-4-5-20251001").is_some());
        assert!(table.get("openai", "gpt-4o-mini").is_some());
        assert!(table.get("gemini", "gemini-1.5-flash").is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = PricingTable::builtin();
        assert!(table.get("OpenAI", "GPT-4o").is_some());
    }

    #[test]
    fn wildcard_covers_any_local_model() {
        let table = PricingTable::builtin();
        let pricing = table.get("ollama", "mistral-small3.1:24b").unwrap();
        assert_float_eq!(pricing.cost_usd(1_000_000, 1_000_000), 0.0);
        assert!(table.get("ollama", "nomic-embed-text").is_some());
    }

    #[test]
    fn exact_entry_beats_wildcard() {
        let mut table = PricingTable::builtin();
        table.add(ModelPricing::new("ollama", "paid-model", 1.0, 2.0));
        let pricing = table.get("ollama", "paid-model").unwrap();
        assert_float_eq!(pricing.input_per_million, 1.0);
    }

    #[test]
    fn unknown_pair_has_no_price() {
        let table = PricingTable::builtin();
        assert!(table.get("anthropic", "claude-9-ultra").is_none());
        assert!(table.get("mistral", "mistral-large").is_none());
    }

    #[test]
    fn overrides_replace_builtin_rates() {
        let table =
            PricingTable::with_overrides(&[ModelPricing::new("openai", "gpt-4o", 2.5, 10.0)]);
        let pricing = table.get("openai", "gpt-4o").unwrap();
        assert_float_eq!(pricing.input_per_million, 2.5);
        assert_float_eq!(pricing.output_per_million, 10.0);
    }

    #[test]
    fn haiku_cost_per_call() {
        let table = PricingTable::builtin();
        let pricing = table.get("anthropic", "claude-haiku-4-5-20251001").unwrap();
        // 1000 * 0.8/1e6 + 500 * 4.0/1e6
        assert_float_eq!(pricing.cost_usd(1000, 500), 0.0028, 1e-12);
    }

    #[test]
    fn conversion_to_eur() {
        let conversion = Conversion::default();
        assert_float_eq!(conversion.from_usd(10.0), 9.2, 1e-9);
        let usd = Conversion::new(Currency::Usd, 0.92);
        assert_float_eq!(usd.from_usd(10.0), 10.0);
    }

    #[test]
    fn currency_codes() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::Eur));
        assert_eq!(Currency::from_code(" USD "), Some(Currency::Usd));
        assert_eq!(Currency::from_code("GBP"), None);
        assert_eq!(Currency::Eur.symbol(), "€");
    }
}
