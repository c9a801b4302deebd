//! Promotion buying suggestions.

use crate::analysis::cycles::CYCLE_DAYS;
use crate::model::{MinimumStockRecommendation, PromotionRecommendation};
use crate::planning::catalog::Catalog;
use crate::planning::filters::PlanFilters;
use crate::utils::parse_number;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

static PROMO_CYCLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"20\d{4}").expect("valid promo cycle pattern"));
static PROMO_DISCOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+[.,]?\d*)\s*%").expect("valid promo discount pattern"));

/// Cycle and discount found in a free-text promotion cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PromoMeta {
    pub cycle: Option<i64>,
    pub discount_pct: Option<f64>,
}

pub fn parse_promotion(text: &str) -> PromoMeta {
    let cycle = PROMO_CYCLE
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok());
    let discount_pct = PROMO_DISCOUNT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()));
    PromoMeta {
        cycle,
        discount_pct,
    }
}

/// Uplift by sales curve, matched on the class prefix.
pub fn class_factor(class: &str) -> f64 {
    match class.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('A') => 1.5,
        Some('B') => 1.2,
        Some('C') => 1.0,
        _ => 0.8,
    }
}

pub fn discount_factor(discount_pct: f64) -> f64 {
    1.0 + discount_pct / 100.0
}

/// Promotion target, never below the regular minimum.
pub fn promo_target(base_minimum: u64, class: &str, discount_pct: f64) -> u64 {
    let uplifted = (base_minimum as f64 * class_factor(class) * discount_factor(discount_pct)).round();
    let uplifted = if uplifted > 0.0 { uplifted as u64 } else { 0 };
    uplifted.max(base_minimum)
}

/// One suggestion per SKU with promotion metadata whose global shortfall is
/// positive, ordered by total value descending.
///
/// Promotions that ended before `current_cycle` are ignored. With
/// `promo_cycle` set, only that promotion cycle is considered.
pub fn suggest_promotions(
    minimum: &BTreeMap<String, MinimumStockRecommendation>,
    catalog: &Catalog,
    filters: &PlanFilters,
    current_cycle: i64,
    promo_cycle: Option<i64>,
) -> Vec<PromotionRecommendation> {
    let mut out = Vec::new();

    for (sku, recommendation) in minimum {
        let Some(meta) = catalog.meta(sku) else {
            continue;
        };
        let (Some(cycle), Some(discount_pct)) = (meta.promo_cycle, meta.promo_discount_pct) else {
            continue;
        };
        if cycle < current_cycle || promo_cycle.is_some_and(|wanted| wanted != cycle) {
            continue;
        }
        if !filters.accepts_sku(meta, current_cycle) {
            continue;
        }

        let target = promo_target(recommendation.suggested, &meta.class, discount_pct);
        let available = catalog.global_available(sku);
        let shortfall = (target as f64 - available).ceil();
        if shortfall <= 0.0 {
            continue;
        }
        let suggested = shortfall as u64;
        let promo_unit_price = catalog.first_price(sku) * (1.0 - discount_pct / 100.0).max(0.0);

        out.push(PromotionRecommendation {
            sku: sku.clone(),
            description: meta.description.clone(),
            class: meta.class.clone(),
            promo_cycle: cycle,
            discount_pct,
            base_minimum: recommendation.suggested,
            target,
            available,
            suggested,
            promo_unit_price,
            total: suggested as f64 * promo_unit_price,
        });
    }

    out.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    tracing::info!(promotions = out.len(), "promotion suggestions computed");
    out
}

/// A promotion suggestion rescaled to a planning horizon for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionView {
    pub sku: String,
    pub description: String,
    pub class: String,
    pub promo_cycle: i64,
    pub discount_pct: f64,
    pub quantity: u64,
    pub promo_unit_price: f64,
    pub total: f64,
}

impl PromotionView {
    pub fn scaled(recommendation: &PromotionRecommendation, horizon_days: u32) -> Self {
        let quantity = (recommendation.suggested as f64 * horizon_days as f64 / CYCLE_DAYS).round();
        let quantity = if quantity > 0.0 { quantity as u64 } else { 0 };
        Self {
            sku: recommendation.sku.clone(),
            description: recommendation.description.clone(),
            class: recommendation.class.clone(),
            promo_cycle: recommendation.promo_cycle,
            discount_pct: recommendation.discount_pct,
            quantity,
            promo_unit_price: recommendation.promo_unit_price,
            total: quantity as f64 * recommendation.promo_unit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::minimum::MinimumStockMethod;
    use crate::planning::catalog::tests::stock_row;

    fn minimum(entries: &[(&str, u64)]) -> BTreeMap<String, MinimumStockRecommendation> {
        entries
            .iter()
            .map(|(sku, suggested)| {
                (
                    sku.to_string(),
                    MinimumStockRecommendation {
                        sku: sku.to_string(),
                        method: MinimumStockMethod::Mean,
                        coverage_factor: 1.0,
                        base: *suggested as f64,
                        suggested: *suggested,
                    },
                )
            })
            .collect()
    }

    fn promo_row(sku: &str, class: &str, text: &str, on_hand: f64, price: f64) -> crate::model::StockRow {
        let promo = parse_promotion(text);
        let mut row = stock_row(sku, "Curitiba", on_hand);
        row.class = class.into();
        row.promo_cycle = promo.cycle;
        row.promo_discount_pct = promo.discount_pct;
        row.unit_price = price;
        row
    }

    #[test]
    fn parses_cycle_and_discount_from_free_text() {
        assert_eq!(
            parse_promotion("Promo C06 202506 - 30% OFF"),
            PromoMeta {
                cycle: Some(202506),
                discount_pct: Some(30.0),
            }
        );
        assert_eq!(parse_promotion("desconto 12,5 %").discount_pct, Some(12.5));
        assert_eq!(parse_promotion("sem promo"), PromoMeta::default());
    }

    #[test]
    fn class_prefix_factors() {
        assert_eq!(class_factor("A+"), 1.5);
        assert_eq!(class_factor("b"), 1.2);
        assert_eq!(class_factor("C"), 1.0);
        assert_eq!(class_factor(""), 0.8);
        assert_eq!(class_factor("D"), 0.8);
    }

    #[test]
    fn class_a_with_forty_percent_off() {
        assert_eq!(promo_target(100, "A", 40.0), 210);
        let catalog = Catalog::build(&[promo_row("S", "A", "202506 40%", 50.0, 10.0)]);
        let out = suggest_promotions(
            &minimum(&[("S", 100)]),
            &catalog,
            &PlanFilters::default(),
            202505,
            None,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, 210);
        assert_eq!(out[0].suggested, 160);
        assert!((out[0].promo_unit_price - 6.0).abs() < 1e-9);
        assert!((out[0].total - 960.0).abs() < 1e-9);
    }

    #[test]
    fn low_uplift_never_drops_below_minimum() {
        assert_eq!(promo_target(10, "Z", 5.0), 10);
    }

    #[test]
    fn skips_covered_past_and_other_cycle_promotions() {
        let catalog = Catalog::build(&[
            promo_row("COVERED", "A", "202506 10%", 1000.0, 1.0),
            promo_row("PAST", "A", "202501 10%", 0.0, 1.0),
            promo_row("LATER", "A", "202509 10%", 0.0, 1.0),
            promo_row("NOPROMO", "A", "", 0.0, 1.0),
        ]);
        let min = minimum(&[("COVERED", 10), ("PAST", 10), ("LATER", 10), ("NOPROMO", 10)]);
        let filters = PlanFilters::default();
        let out = suggest_promotions(&min, &catalog, &filters, 202505, None);
        assert_eq!(out.iter().map(|p| p.sku.as_str()).collect::<Vec<_>>(), vec!["LATER"]);
        assert!(suggest_promotions(&min, &catalog, &filters, 202505, Some(202506)).is_empty());
    }

    #[test]
    fn sorted_by_total_descending() {
        let catalog = Catalog::build(&[
            promo_row("CHEAP", "C", "202506 0%", 0.0, 1.0),
            promo_row("PRICEY", "C", "202506 0%", 0.0, 50.0),
        ]);
        let out = suggest_promotions(
            &minimum(&[("CHEAP", 10), ("PRICEY", 10)]),
            &catalog,
            &PlanFilters::default(),
            202505,
            None,
        );
        assert_eq!(out[0].sku, "PRICEY");
        assert_eq!(out[1].sku, "CHEAP");
    }

    #[test]
    fn view_scales_quantity_and_total() {
        let rec = PromotionRecommendation {
            sku: "S".into(),
            description: "Perfume".into(),
            class: "A".into(),
            promo_cycle: 202506,
            discount_pct: 40.0,
            base_minimum: 100,
            target: 210,
            available: 50.0,
            suggested: 160,
            promo_unit_price: 6.0,
            total: 960.0,
        };
        let view = PromotionView::scaled(&rec, 43);
        assert_eq!(view.quantity, 320);
        assert_eq!(view.total, 1920.0);
    }
}
