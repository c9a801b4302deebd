//! Dashboard aggregates: stock position per brand and per city, and sales
//! per retained cycle.

use crate::model::{SalesRow, StockRow};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockSummaryRow {
    pub group: String,
    pub skus: usize,
    pub on_hand: f64,
    pub in_transit: f64,
    pub pending: f64,
    pub net_pending: f64,
    /// On-hand units valued at each row's unit price.
    pub stock_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockSummary {
    pub by_brand: Vec<StockSummaryRow>,
    pub by_city: Vec<StockSummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSales {
    pub cycle: String,
    pub total: f64,
    pub by_brand: IndexMap<String, f64>,
}

#[derive(Default)]
struct Accumulator {
    skus: IndexSet<String>,
    row: StockSummaryRow,
}

fn group_by<F>(rows: &[StockRow], key: F) -> Vec<StockSummaryRow>
where
    F: Fn(&StockRow) -> &str,
{
    let mut groups: IndexMap<String, Accumulator> = IndexMap::new();
    for row in rows {
        let acc = groups.entry(key(row).to_string()).or_default();
        acc.skus.insert(row.sku.clone());
        acc.row.on_hand += row.on_hand;
        acc.row.in_transit += row.in_transit;
        acc.row.pending += row.pending;
        acc.row.net_pending += row.net_pending;
        acc.row.stock_value += row.on_hand * row.unit_price;
    }
    groups
        .into_iter()
        .map(|(group, acc)| StockSummaryRow {
            group,
            skus: acc.skus.len(),
            ..acc.row
        })
        .collect()
}

/// Groups appear in first-seen order.
pub fn stock_summary(rows: &[StockRow]) -> StockSummary {
    StockSummary {
        by_brand: group_by(rows, |r| r.brand.as_str()),
        by_city: group_by(rows, StockRow::location),
    }
}

/// Sales totals for each cycle of `window`, in window order. Cycles without
/// sales still get a zero entry.
pub fn sales_history(rows: &[SalesRow], window: &[String]) -> Vec<CycleSales> {
    let mut history: IndexMap<&str, CycleSales> = window
        .iter()
        .map(|cycle| {
            (
                cycle.as_str(),
                CycleSales {
                    cycle: cycle.clone(),
                    total: 0.0,
                    by_brand: IndexMap::new(),
                },
            )
        })
        .collect();
    for row in rows {
        if let Some(entry) = history.get_mut(row.cycle.as_str()) {
            entry.total += row.quantity;
            *entry.by_brand.entry(row.brand.clone()).or_insert(0.0) += row.quantity;
        }
    }
    history.into_values().collect()
}
