use crate::analysis::cycles::ciclo_key;
use crate::model::{BestMoment, PerSkuStats, SalesRow};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};

/// Linear-interpolation percentile of `values` (`pct` in 0..=100).
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let position = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = position - lower as f64;
    sorted[lower] + weight * (sorted[upper] - sorted[lower])
}

/// Unbiased (n - 1) standard deviation; zero for fewer than two samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

pub fn summarize(values: &[f64]) -> Option<PerSkuStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    Some(PerSkuStats {
        n,
        mean: values.iter().sum::<f64>() / n as f64,
        max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        p85: percentile(values, 85.0),
        sigma: sample_std_dev(values),
    })
}

/// Rows whose cycle is part of `window`.
pub fn rows_in_window<'a>(rows: &'a [SalesRow], window: &[String]) -> Vec<&'a SalesRow> {
    let keep: HashSet<&str> = window.iter().map(String::as_str).collect();
    rows.iter().filter(|r| keep.contains(r.cycle.as_str())).collect()
}

/// Total quantity per SKU per cycle, all cities summed. Cycles keep first
/// appearance order.
pub fn cycle_totals<'a, I>(rows: I) -> BTreeMap<String, IndexMap<String, f64>>
where
    I: IntoIterator<Item = &'a SalesRow>,
{
    let mut totals: BTreeMap<String, IndexMap<String, f64>> = BTreeMap::new();
    for row in rows {
        *totals
            .entry(row.sku.clone())
            .or_default()
            .entry(row.cycle.clone())
            .or_insert(0.0) += row.quantity;
    }
    totals
}

/// Count, mean, max, p85 and sample sigma of each SKU's per-cycle totals.
///
/// Sales from every city are summed within a cycle first, so the figures
/// describe the SKU's overall demand rather than any single city.
pub fn compute_stats<'a, I>(rows: I) -> BTreeMap<String, PerSkuStats>
where
    I: IntoIterator<Item = &'a SalesRow>,
{
    cycle_totals(rows)
        .into_iter()
        .filter_map(|(sku, per_cycle)| {
            let values: Vec<f64> = per_cycle.values().copied().collect();
            summarize(&values).map(|stats| (sku, stats))
        })
        .collect()
}

/// Cycle with the highest total sales per SKU. Ties go to the most recent cycle.
pub fn best_moments(
    totals: &BTreeMap<String, IndexMap<String, f64>>,
) -> BTreeMap<String, BestMoment> {
    totals
        .iter()
        .filter_map(|(sku, per_cycle)| {
            per_cycle
                .iter()
                .filter(|(_, qty)| **qty > 0.0)
                .max_by(|a, b| {
                    a.1.total_cmp(b.1)
                        .then_with(|| ciclo_key(a.0).cmp(&ciclo_key(b.0)))
                })
                .map(|(cycle, qty)| {
                    (
                        sku.clone(),
                        BestMoment {
                            cycle: cycle.clone(),
                            quantity: *qty,
                        },
                    )
                })
        })
        .collect()
}
