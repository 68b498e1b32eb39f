//! Ledger aggregation.
//!
//! Pure functions over usage events: group by provider, model, project and
//! time bucket, and price every group with a [`PricingTable`]. Nothing here
//! touches the ledger or the clock.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::models::{
    BucketSize, CostBucket, CostSummary, LedgerInfo, ModelCost, PricingGap, Probe, ProjectCost,
    ProviderCost, TokenTotals, UsageEvent,
};
use crate::core::pricing::{Conversion, PricingTable};
use crate::util::time::{DateRange, bucket_key};

/// What to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub period: String,
    pub range: DateRange,
    pub bucket: Option<BucketSize>,
}

/// Cost of one event in the reporting currency; `None` when unpriced.
fn event_cost(event: &UsageEvent, pricing: &PricingTable, conversion: Conversion) -> Option<f64> {
    pricing
        .get(&event.provider, &event.model)
        .map(|price| conversion.from_usd(price.cost_usd(event.input_tokens, event.output_tokens)))
}

/// Cost descending, then tokens descending, then name.
fn by_spend(a: &TokenTotals, a_name: &str, b: &TokenTotals, b_name: &str) -> Ordering {
    b.cost
        .total_cmp(&a.cost)
        .then_with(|| b.total_tokens.cmp(&a.total_tokens))
        .then_with(|| a_name.cmp(b_name))
}

fn model_name(model: &ModelCost) -> String {
    format!("{}/{}", model.provider, model.model)
}

fn sort_models(models: &mut [ModelCost]) {
    models.sort_by(|a, b| by_spend(&a.totals, &model_name(a), &b.totals, &model_name(b)));
}

/// Group events per `(provider, model)`.
fn group_models(
    events: &[&UsageEvent],
    pricing: &PricingTable,
    conversion: Conversion,
) -> Vec<ModelCost> {
    let mut groups: BTreeMap<(&str, &str), ModelCost> = BTreeMap::new();
    for event in events {
        let cost = event_cost(event, pricing, conversion);
        let entry = groups
            .entry((event.provider.as_str(), event.model.as_str()))
            .or_insert_with(|| ModelCost {
                provider: event.provider.clone(),
                model: event.model.clone(),
                priced: cost.is_some(),
                totals: TokenTotals::default(),
            });
        entry.totals.add_event(event, cost.unwrap_or(0.0));
    }
    let mut models: Vec<_> = groups.into_values().collect();
    sort_models(&mut models);
    models
}

/// Summarize the events that fall inside `query.range`.
#[must_use]
pub fn summarize(
    events: &[UsageEvent],
    query: &CostQuery,
    pricing: &PricingTable,
    conversion: Conversion,
    ledger: Probe<LedgerInfo>,
) -> CostSummary {
    let in_range: Vec<&UsageEvent> = events
        .iter()
        .filter(|event| query.range.contains(event.timestamp.date_naive()))
        .collect();

    let mut totals = TokenTotals::default();
    let mut projects: BTreeMap<&str, TokenTotals> = BTreeMap::new();
    for event in &in_range {
        let cost = event_cost(event, pricing, conversion).unwrap_or(0.0);
        totals.add_event(event, cost);
        projects
            .entry(event.project.as_str())
            .or_default()
            .add_event(event, cost);
    }

    let by_model = group_models(&in_range, pricing, conversion);
    let by_provider = providers_from_models(&by_model);

    let mut by_project: Vec<ProjectCost> = projects
        .into_iter()
        .map(|(project, totals)| ProjectCost {
            project: project.to_string(),
            totals,
        })
        .collect();
    by_project.sort_by(|a, b| by_spend(&a.totals, &a.project, &b.totals, &b.project));

    let pricing_gaps = pricing_gaps(&by_model);
    if !pricing_gaps.is_empty() {
        tracing::debug!(count = pricing_gaps.len(), "usage without price entry");
    }

    let buckets = query
        .bucket
        .map(|size| bucketize(&in_range, size, pricing, conversion));

    CostSummary {
        period: query.period.clone(),
        start: query.range.start,
        end: query.range.end,
        currency: conversion.currency,
        totals,
        by_provider,
        by_model,
        by_project,
        buckets,
        pricing_gaps,
        budget: None,
        ledger,
    }
}

/// A summary with zero totals for a ledger that could not be read.
#[must_use]
pub fn empty_summary(query: &CostQuery, conversion: Conversion, reason: &str) -> CostSummary {
    CostSummary {
        period: query.period.clone(),
        start: query.range.start,
        end: query.range.end,
        currency: conversion.currency,
        totals: TokenTotals::default(),
        by_provider: Vec::new(),
        by_model: Vec::new(),
        by_project: Vec::new(),
        buckets: query.bucket.map(|_| Vec::new()),
        pricing_gaps: Vec::new(),
        budget: None,
        ledger: Probe::unavailable(reason),
    }
}

fn providers_from_models(models: &[ModelCost]) -> Vec<ProviderCost> {
    let mut providers: BTreeMap<&str, ProviderCost> = BTreeMap::new();
    for model in models {
        let entry = providers
            .entry(model.provider.as_str())
            .or_insert_with(|| ProviderCost {
                provider: model.provider.clone(),
                totals: TokenTotals::default(),
                models: Vec::new(),
            });
        entry.totals.input_tokens += model.totals.input_tokens;
        entry.totals.output_tokens += model.totals.output_tokens;
        entry.totals.total_tokens += model.totals.total_tokens;
        entry.totals.calls += model.totals.calls;
        entry.totals.cost += model.totals.cost;
        entry.models.push(model.clone());
    }
    let mut providers: Vec<_> = providers.into_values().collect();
    for provider in &mut providers {
        sort_models(&mut provider.models);
    }
    providers.sort_by(|a, b| by_spend(&a.totals, &a.provider, &b.totals, &b.provider));
    providers
}

fn pricing_gaps(models: &[ModelCost]) -> Vec<PricingGap> {
    let mut gaps: Vec<PricingGap> = models
        .iter()
        .filter(|model| !model.priced)
        .map(|model| PricingGap {
            provider: model.provider.clone(),
            model: model.model.clone(),
            tokens: model.totals.total_tokens,
            calls: model.totals.calls,
        })
        .collect();
    gaps.sort_by(|a, b| {
        b.tokens
            .cmp(&a.tokens)
            .then_with(|| a.provider.cmp(&b.provider))
            .then_with(|| a.model.cmp(&b.model))
    });
    gaps
}

/// Partition events into time buckets, ascending by key. Empty buckets are
/// not emitted.
#[must_use]
pub fn bucketize(
    events: &[&UsageEvent],
    size: BucketSize,
    pricing: &PricingTable,
    conversion: Conversion,
) -> Vec<CostBucket> {
    let mut partitions: BTreeMap<String, (chrono::NaiveDate, Vec<&UsageEvent>)> = BTreeMap::new();
    for &event in events {
        let (key, start) = bucket_key(event.timestamp.date_naive(), size);
        partitions
            .entry(key)
            .or_insert_with(|| (start, Vec::new()))
            .1
            .push(event);
    }

    partitions
        .into_iter()
        .map(|(key, (start, bucket_events))| {
            let models = group_models(&bucket_events, pricing, conversion);
            let mut totals = TokenTotals::default();
            for model in &models {
                totals.input_tokens += model.totals.input_tokens;
                totals.output_tokens += model.totals.output_tokens;
                totals.total_tokens += model.totals.total_tokens;
                totals.calls += model.totals.calls;
                totals.cost += model.totals.cost;
            }
            CostBucket {
                key,
                start,
                totals,
                models,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_float_eq;
    use crate::core::pricing::Currency;
    use crate::test_utils::make_test_usage_event;
    use chrono::NaiveDate;

    fn march_query(bucket: Option<BucketSize>) -> CostQuery {
        CostQuery {
            period: "2026-03".to_string(),
            range: DateRange {
                start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            },
            bucket,
        }
    }

    fn ledger() -> Probe<LedgerInfo> {
        Probe::Available(LedgerInfo {
            path: "token_usage.db".to_string(),
            events: 0,
            skipped_rows: 0,
        })
    }

    fn usd() -> Conversion {
        Conversion::new(Currency::Usd, 0.92)
    }

    #[test]
    fn priced_and_free_usage() {
        let events = vec![
            make_test_usage_event(
                "2026-03-02T10:00:00Z",
                "anthropic",
                "claude-haiku-4-5-20251001",
                "alpha",
                1000,
                500,
            ),
            make_test_usage_event(
                "2026-03-02T11:00:00Z",
                "ollama",
                "mistral-small3.1:24b",
                "alpha",
                2000,
                1000,
            ),
        ];

        let summary = summarize(
            &events,
            &march_query(None),
            &PricingTable::builtin(),
            usd(),
            ledger(),
        );

        assert_eq!(summary.totals.total_tokens, 4500);
        assert_eq!(summary.totals.calls, 2);
        assert_float_eq!(summary.totals.cost, 0.0028, 1e-12);
        assert!(summary.pricing_gaps.is_empty());
        assert_eq!(summary.by_provider[0].provider, "anthropic");
        assert!(summary.by_model.iter().all(|m| m.priced));
    }

    #[test]
    fn unknown_model_counts_tokens_without_cost() {
        let events = vec![make_test_usage_event(
            "2026-03-05T09:00:00Z",
            "anthropic",
            "claude-9-ultra",
            "beta",
            4000,
            1000,
        )];

        let summary = summarize(
            &events,
            &march_query(None),
            &PricingTable::builtin(),
            usd(),
            ledger(),
        );

        assert_eq!(summary.totals.total_tokens, 5000);
        assert_float_eq!(summary.totals.cost, 0.0);
        assert_eq!(summary.pricing_gaps.len(), 1);
        assert_eq!(summary.pricing_gaps[0].model, "claude-9-ultra");
        assert_eq!(summary.pricing_gaps[0].tokens, 5000);
        assert!(!summary.by_model[0].priced);
    }

    #[test]
    fn project_and_provider_sums_match_totals() {
        let events = vec![
            make_test_usage_event("2026-03-01T00:00:00Z", "openai", "gpt-4o", "alpha", 100, 50),
            make_test_usage_event("2026-03-03T00:00:00Z", "openai", "gpt-4o-mini", "beta", 900, 10),
            make_test_usage_event("2026-03-09T00:00:00Z", "gemini", "gemini-1.5-pro", "unknown", 10, 10),
            make_test_usage_event("2026-03-31T23:59:59Z", "anthropic", "claude-3-opus-20250219", "alpha", 1, 1),
        ];

        let summary = summarize(
            &events,
            &march_query(None),
            &PricingTable::builtin(),
            Conversion::default(),
            ledger(),
        );

        let project_tokens: u64 = summary.by_project.iter().map(|p| p.totals.total_tokens).sum();
        let project_cost: f64 = summary.by_project.iter().map(|p| p.totals.cost).sum();
        let provider_tokens: u64 = summary.by_provider.iter().map(|p| p.totals.total_tokens).sum();
        let model_cost: f64 = summary.by_model.iter().map(|m| m.totals.cost).sum();

        assert_eq!(project_tokens, summary.totals.total_tokens);
        assert_eq!(provider_tokens, summary.totals.total_tokens);
        assert_float_eq!(project_cost, summary.totals.cost, 1e-9);
        assert_float_eq!(model_cost, summary.totals.cost, 1e-9);
    }

    #[test]
    fn day_buckets_sum_to_totals() {
        let events = vec![
            make_test_usage_event("2026-03-01T08:00:00Z", "openai", "gpt-4o", "a", 100, 100),
            make_test_usage_event("2026-03-01T20:00:00Z", "openai", "gpt-4o", "a", 100, 100),
            make_test_usage_event("2026-03-04T08:00:00Z", "openai", "gpt-4o-mini", "b", 50, 5),
        ];

        let summary = summarize(
            &events,
            &march_query(Some(BucketSize::Day)),
            &PricingTable::builtin(),
            Conversion::default(),
            ledger(),
        );

        let buckets = summary.buckets.as_ref().unwrap();
        assert_eq!(buckets.len(), 2, "empty days are omitted");
        assert_eq!(buckets[0].key, "2026-03-01");
        assert_eq!(buckets[1].key, "2026-03-04");

        let bucket_tokens: u64 = buckets.iter().map(|b| b.totals.total_tokens).sum();
        let bucket_cost: f64 = buckets.iter().map(|b| b.totals.cost).sum();
        assert_eq!(bucket_tokens, summary.totals.total_tokens);
        assert_float_eq!(bucket_cost, summary.totals.cost, 1e-9);
    }

    #[test]
    fn events_outside_range_are_ignored() {
        let events = vec![
            make_test_usage_event("2026-02-28T23:59:59Z", "openai", "gpt-4o", "a", 100, 100),
            make_test_usage_event("2026-04-01T00:00:00Z", "openai", "gpt-4o", "a", 100, 100),
        ];
        let summary = summarize(
            &events,
            &march_query(None),
            &PricingTable::builtin(),
            Conversion::default(),
            ledger(),
        );
        assert_eq!(summary.totals.calls, 0);
        assert!(summary.by_provider.is_empty());
    }

    #[test]
    fn ordering_is_cost_then_tokens_then_name() {
        let events = vec![
            make_test_usage_event("2026-03-02T00:00:00Z", "ollama", "b-model", "p", 10, 0),
            make_test_usage_event("2026-03-02T00:00:00Z", "ollama", "a-model", "p", 10, 0),
            make_test_usage_event("2026-03-02T00:00:00Z", "ollama", "c-model", "p", 500, 0),
            make_test_usage_event("2026-03-02T00:00:00Z", "openai", "gpt-4o", "p", 1, 0),
        ];
        let summary = summarize(
            &events,
            &march_query(None),
            &PricingTable::builtin(),
            Conversion::default(),
            ledger(),
        );
        let names: Vec<_> = summary.by_model.iter().map(|m| m.model.as_str()).collect();
        assert_eq!(names, ["gpt-4o", "c-model", "a-model", "b-model"]);
    }

    #[test]
    fn empty_summary_marks_ledger_unavailable() {
        let summary = empty_summary(&march_query(None), Conversion::default(), "no such file");
        assert_eq!(summary.totals, TokenTotals::default());
        assert_eq!(summary.ledger.reason(), Some("no such file"));
        assert_eq!(summary.currency, Currency::Eur);
    }
}
