//! Per-SKU lookups derived once from the stock rows: descriptive metadata,
//! per-city stock positions and prices.

use crate::model::StockRow;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkuMeta {
    pub brand: String,
    pub description: String,
    pub class: String,
    pub category: String,
    pub deactivation_cycle: Option<i64>,
    pub promo_cycle: Option<i64>,
    pub promo_discount_pct: Option<f64>,
}

impl SkuMeta {
    pub fn is_deactivated(&self, current_cycle: i64) -> bool {
        self.deactivation_cycle
            .map(|cycle| cycle <= current_cycle)
            .unwrap_or(false)
    }
}

/// Stock position of one SKU in one city, summed over every contributing row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CityStock {
    pub on_hand: f64,
    pub in_transit: f64,
    pub pending: f64,
    pub net_pending: f64,
    /// First non-zero price seen for this SKU in this city.
    pub unit_price: f64,
    pub smart_buy_next_cycle: f64,
    pub prior_cycle_sales: f64,
    pub current_cycle_sales: f64,
}

impl CityStock {
    pub fn available(&self) -> f64 {
        self.on_hand + self.in_transit - self.net_pending
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    meta: BTreeMap<String, SkuMeta>,
    stock: BTreeMap<String, IndexMap<String, CityStock>>,
}

impl Catalog {
    /// Cities keep the order in which they first appear in `rows`, which is
    /// sheet order followed by row order.
    pub fn build(rows: &[StockRow]) -> Self {
        let mut meta: BTreeMap<String, SkuMeta> = BTreeMap::new();
        let mut stock: BTreeMap<String, IndexMap<String, CityStock>> = BTreeMap::new();

        for row in rows {
            let entry = meta.entry(row.sku.clone()).or_default();
            fill_text(&mut entry.brand, &row.brand);
            fill_text(&mut entry.description, &row.description);
            fill_text(&mut entry.class, &row.class);
            fill_text(&mut entry.category, &row.category);
            entry.deactivation_cycle = entry.deactivation_cycle.or(row.deactivation_cycle);
            entry.promo_cycle = entry.promo_cycle.or(row.promo_cycle);
            entry.promo_discount_pct = entry.promo_discount_pct.or(row.promo_discount_pct);

            let city = stock
                .entry(row.sku.clone())
                .or_default()
                .entry(row.location().to_string())
                .or_default();
            city.on_hand += row.on_hand;
            city.in_transit += row.in_transit;
            city.pending += row.pending;
            city.net_pending += row.net_pending;
            if city.unit_price == 0.0 && row.unit_price > 0.0 {
                city.unit_price = row.unit_price;
            }
            city.smart_buy_next_cycle += row.smart_buy_next_cycle;
            city.prior_cycle_sales += row.prior_cycle_sales;
            city.current_cycle_sales += row.current_cycle_sales;
        }

        Self { meta, stock }
    }

    pub fn meta(&self, sku: &str) -> Option<&SkuMeta> {
        self.meta.get(sku)
    }

    pub fn cities(&self, sku: &str) -> Option<&IndexMap<String, CityStock>> {
        self.stock.get(sku)
    }

    /// City price, falling back to the SKU's first non-zero price elsewhere.
    pub fn price(&self, sku: &str, city: &str) -> f64 {
        self.stock
            .get(sku)
            .and_then(|cities| cities.get(city))
            .map(|c| c.unit_price)
            .filter(|p| *p > 0.0)
            .unwrap_or_else(|| self.first_price(sku))
    }

    /// First non-zero price across the SKU's cities, zero when none.
    pub fn first_price(&self, sku: &str) -> f64 {
        self.stock
            .get(sku)
            .and_then(|cities| cities.values().map(|c| c.unit_price).find(|p| *p > 0.0))
            .unwrap_or(0.0)
    }

    /// Available units summed over every city.
    pub fn global_available(&self, sku: &str) -> f64 {
        self.stock
            .get(sku)
            .map(|cities| cities.values().map(CityStock::available).sum())
            .unwrap_or(0.0)
    }
}

fn fill_text(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}
