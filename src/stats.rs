use crate::model::{BudgetStatus, HistoryEntry};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;

/// Aggregates over the entries priced in one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub currency: String,
    pub count: usize,
    pub mean_total: f64,
    pub median_total: f64,
    pub over_budget: usize,
    pub total_by_category: BTreeMap<String, f64>,
}

/// "₹", "inr" and a blank code all count as INR.
pub fn currency_code(currency: &str) -> String {
    match currency.trim() {
        "" | "₹" => "INR".to_string(),
        code => code.to_uppercase(),
    }
}

/// One summary per currency, ordered by currency code. Totals in different
/// currencies are never mixed.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a HistoryEntry>) -> Vec<HistorySummary> {
    let mut by_currency: BTreeMap<String, Vec<&HistoryEntry>> = BTreeMap::new();
    for e in entries {
        by_currency
            .entry(currency_code(&e.result.currency))
            .or_default()
            .push(e);
    }

    by_currency
        .into_iter()
        .map(|(currency, entries)| summarize_currency(currency, &entries))
        .collect()
}

fn summarize_currency(currency: String, entries: &[&HistoryEntry]) -> HistorySummary {
    let totals: Vec<f64> = entries.iter().map(|e| e.result.estimated_total).collect();

    let mut total_by_category = BTreeMap::new();
    for e in entries {
        *total_by_category
            .entry(e.form_data.category.label().to_string())
            .or_insert(0.0) += e.result.estimated_total;
    }

    HistorySummary {
        currency,
        count: entries.len(),
        mean_total: totals.iter().mean(),
        median_total: Data::new(totals).median(),
        over_budget: entries
            .iter()
            .filter(|e| e.result.budget_status == BudgetStatus::Over)
            .count(),
        total_by_category,
    }
}
