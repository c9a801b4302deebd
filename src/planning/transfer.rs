//! Transfer and purchase planning.
//!
//! For every SKU the horizon-scaled minimum stock is split across the cities
//! that stock it, weighted by each city's share of historical sales. Cities
//! holding more than their target become sources, cities below it become
//! sinks. Sources are matched to sinks greedily in city order; whatever
//! deficit is left becomes a purchase.

use crate::analysis::cycles::CYCLE_DAYS;
use crate::analysis::share::CityShares;
use crate::model::{
    BestMoment, MinimumStockRecommendation, PlanTotals, PurchaseRecommendation,
    TransferRecommendation,
};
use crate::planning::catalog::{Catalog, CityStock};
use crate::planning::filters::{DeactivatedPurchaseMode, PlanFilters};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HORIZON_DAYS: u32 = 21;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub horizon_days: u32,
    pub filters: PlanFilters,
    pub deactivated_purchases: DeactivatedPurchaseMode,
    pub transfers_enabled: bool,
    pub current_cycle: i64,
}

impl PlanOptions {
    pub fn new(current_cycle: i64) -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            filters: PlanFilters::default(),
            deactivated_purchases: DeactivatedPurchaseMode::default(),
            transfers_enabled: true,
            current_cycle,
        }
    }
}

/// Everything the planner reads besides the minimum-stock table.
#[derive(Debug, Clone, Copy)]
pub struct PlanInputs<'a> {
    pub catalog: &'a Catalog,
    pub shares: &'a BTreeMap<String, CityShares>,
    /// Sales per SKU per city over the retained window.
    pub window_sales: &'a BTreeMap<String, IndexMap<String, f64>>,
    pub best_moments: &'a BTreeMap<String, BestMoment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanResult {
    pub transfers: Vec<TransferRecommendation>,
    pub purchases: Vec<PurchaseRecommendation>,
    pub totals: PlanTotals,
}

/// One unit of work from the greedy matcher: `quantity` units move from
/// `sources[source]` to `sinks[sink]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allotment {
    pub source: usize,
    pub sink: usize,
    pub quantity: u64,
}

/// Minimum stock scaled from one cycle to `horizon_days`.
pub fn horizon_target(base_minimum: u64, horizon_days: u32) -> u64 {
    let scaled = (base_minimum as f64 * horizon_days as f64 / CYCLE_DAYS).round();
    if scaled > 0.0 { scaled as u64 } else { 0 }
}

/// Allocation weights for `cities`, summing to 1.
///
/// Sales shares are used when the SKU sold anywhere; they are renormalized
/// over the cities present. With no usable shares every city weighs the same.
pub fn allocation_weights(cities: &[&str], shares: Option<&CityShares>) -> Vec<f64> {
    if cities.is_empty() {
        return Vec::new();
    }
    let raw: Vec<f64> = match shares {
        Some(shares) if !shares.is_empty() => cities
            .iter()
            .map(|city| shares.get(*city).copied().unwrap_or(0.0))
            .collect(),
        _ => Vec::new(),
    };
    let total: f64 = raw.iter().sum();
    if raw.is_empty() || total <= 0.0 {
        let equal = 1.0 / cities.len() as f64;
        return vec![equal; cities.len()];
    }
    raw.into_iter().map(|w| w / total).collect()
}

/// Floors `global * weight` for every city; the last city takes whatever
/// remains so the targets add up to `global` exactly.
pub fn distribute_target(global: u64, weights: &[f64]) -> Vec<u64> {
    let mut targets = Vec::with_capacity(weights.len());
    let mut assigned = 0u64;
    for (idx, weight) in weights.iter().enumerate() {
        let target = if idx + 1 == weights.len() {
            global.saturating_sub(assigned)
        } else {
            let share = (global as f64 * weight).floor();
            (share.max(0.0) as u64).min(global.saturating_sub(assigned))
        };
        assigned += target;
        targets.push(target);
    }
    targets
}

/// Two-pointer greedy matching. Returns the allotments in the order they
/// were made and the deficit each sink still has afterwards.
pub fn greedy_match(surpluses: &[u64], deficits: &[u64]) -> (Vec<Allotment>, Vec<u64>) {
    let mut source_left = surpluses.to_vec();
    let mut sink_left = deficits.to_vec();
    let mut allotments = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    while i < source_left.len() && j < sink_left.len() {
        if source_left[i] == 0 {
            i += 1;
            continue;
        }
        if sink_left[j] == 0 {
            j += 1;
            continue;
        }
        let quantity = source_left[i].min(sink_left[j]);
        allotments.push(Allotment {
            source: i,
            sink: j,
            quantity,
        });
        source_left[i] -= quantity;
        sink_left[j] -= quantity;
    }

    (allotments, sink_left)
}

struct CityPosition<'a> {
    city: &'a str,
    stock: &'a CityStock,
    target: u64,
}

/// Plans transfers and purchases for every SKU that has both a minimum-stock
/// recommendation and stock data, and passes the filters.
pub fn plan(
    minimum: &BTreeMap<String, MinimumStockRecommendation>,
    inputs: PlanInputs<'_>,
    options: &PlanOptions,
) -> PlanResult {
    let mut result = PlanResult::default();

    for (sku, recommendation) in minimum {
        let Some(cities) = inputs.catalog.cities(sku) else {
            continue;
        };
        if cities.is_empty() {
            continue;
        }
        let meta = inputs.catalog.meta(sku).cloned().unwrap_or_default();
        if !options.filters.accepts_sku(&meta, options.current_cycle) {
            continue;
        }
        let global_target = horizon_target(recommendation.suggested, options.horizon_days);
        if global_target == 0 {
            continue;
        }
        result.totals.skus_planned += 1;

        let names: Vec<&str> = cities.keys().map(String::as_str).collect();
        let weights = allocation_weights(&names, inputs.shares.get(sku));
        let targets = distribute_target(global_target, &weights);
        let positions: Vec<CityPosition<'_>> = cities
            .iter()
            .zip(targets)
            .map(|((city, stock), target)| CityPosition {
                city: city.as_str(),
                stock,
                target,
            })
            .collect();

        let mut sources: Vec<(&str, u64)> = Vec::new();
        let mut sinks: Vec<(&str, u64)> = Vec::new();
        for position in &positions {
            let diff = position.stock.available() - position.target as f64;
            if diff < 0.0 {
                sinks.push((position.city, (-diff).ceil() as u64));
            } else if diff >= 1.0 {
                sources.push((position.city, diff.floor() as u64));
            }
        }

        for (city, need) in &sinks {
            if options.filters.accepts_city(city) {
                result.totals.baseline_purchase_units += need;
                result.totals.baseline_purchase_value +=
                    *need as f64 * inputs.catalog.price(sku, city);
            }
        }

        let remaining: Vec<u64> = if options.transfers_enabled {
            let surplus: Vec<u64> = sources.iter().map(|(_, qty)| *qty).collect();
            let deficits: Vec<u64> = sinks.iter().map(|(_, qty)| *qty).collect();
            let (allotments, remaining) = greedy_match(&surplus, &deficits);
            for allotment in allotments {
                let origin = sources[allotment.source].0;
                let destination = sinks[allotment.sink].0;
                if !options.filters.accepts_city(origin)
                    && !options.filters.accepts_city(destination)
                {
                    continue;
                }
                result.totals.transfer_count += 1;
                result.totals.transfer_units += allotment.quantity;
                result.transfers.push(TransferRecommendation {
                    sku: sku.clone(),
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    quantity: allotment.quantity,
                });
            }
            remaining
        } else {
            sinks.iter().map(|(_, qty)| *qty).collect()
        };

        let excluded = options.deactivated_purchases == DeactivatedPurchaseMode::Exclude
            && meta.is_deactivated(options.current_cycle);
        if excluded {
            tracing::debug!(sku = %sku, "deactivated SKU, purchases dropped");
            continue;
        }

        for ((city, _), quantity) in sinks.iter().zip(remaining) {
            if quantity == 0 || !options.filters.accepts_city(city) {
                continue;
            }
            let stock = &cities[*city];
            let unit_price = inputs.catalog.price(sku, city);
            let total_price = quantity as f64 * unit_price;
            result.totals.purchase_count += 1;
            result.totals.purchase_units += quantity;
            result.totals.purchase_value += total_price;
            result.purchases.push(PurchaseRecommendation {
                sku: sku.clone(),
                description: meta.description.clone(),
                class: meta.class.clone(),
                category: meta.category.clone(),
                city: city.to_string(),
                quantity,
                unit_price,
                total_price,
                window_sales: inputs
                    .window_sales
                    .get(sku)
                    .and_then(|per_city| per_city.get(*city))
                    .copied()
                    .unwrap_or(0.0),
                prior_cycle_sales: stock.prior_cycle_sales,
                current_cycle_sales: stock.current_cycle_sales,
                smart_buy_next_cycle: stock.smart_buy_next_cycle,
                best_moment: inputs.best_moments.get(sku).cloned(),
            });
        }
    }

    tracing::info!(
        skus = result.totals.skus_planned,
        transfers = result.totals.transfer_count,
        purchases = result.totals.purchase_count,
        purchase_value = result.totals.purchase_value,
        economy = result.totals.economy(),
        "plan computed"
    );
    result
}
