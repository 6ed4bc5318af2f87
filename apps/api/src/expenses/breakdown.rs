//! Per-category spending shares, the data behind the dashboard pie chart.

use serde::Serialize;

use crate::models::expense::CategoryTotal;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSlice {
    pub category: String,
    pub total: i64,
    /// Share of all spending, 0–100, two decimals.
    pub percent: f64,
}

/// Converts category totals into slices, largest first.
pub fn to_slices(totals: &[CategoryTotal]) -> Vec<ChartSlice> {
    let grand_total: i64 = totals.iter().map(|t| t.total).sum();
    if grand_total <= 0 {
        return Vec::new();
    }

    let mut slices: Vec<ChartSlice> = totals
        .iter()
        .filter(|t| t.total > 0)
        .map(|t| ChartSlice {
            category: t.category.clone(),
            total: t.total,
            percent: ((t.total as f64 / grand_total as f64) * 10_000.0).round() / 100.0,
        })
        .collect();
    slices.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    slices
}
