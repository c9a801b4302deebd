use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct WorkbookId(pub String);

impl WorkbookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkbookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw spreadsheet cell as handed over by the workbook reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(String),
    Error(String),
}

impl CellValue {
    /// Trimmed textual rendering; numbers lose a trailing `.0` so SKU codes
    /// stored as numeric cells read back the way they were typed.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Date(s) | CellValue::Error(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

/// One (SKU, city, source sheet) stock position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub brand: String,
    pub sku: String,
    pub description: String,
    pub pdv: String,
    pub city: String,
    pub class: String,
    pub category: String,
    pub unit_price: f64,
    pub on_hand: f64,
    pub in_transit: f64,
    pub pending: f64,
    pub net_pending: f64,
    pub deactivation_cycle: Option<i64>,
    pub promo_cycle: Option<i64>,
    pub promo_discount_pct: Option<f64>,
    pub smart_buy_next_cycle: f64,
    pub prior_cycle_sales: f64,
    pub current_cycle_sales: f64,
}

impl StockRow {
    /// Location key used for grouping: city, else point of sale, else empty.
    pub fn location(&self) -> &str {
        if !self.city.is_empty() {
            &self.city
        } else {
            &self.pdv
        }
    }

    /// On-hand plus in-transit minus net pending.
    pub fn available(&self) -> f64 {
        self.on_hand + self.in_transit - self.net_pending
    }
}

/// One (SKU, cycle, city) sales quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub brand: String,
    pub sku: String,
    pub cycle: String,
    pub quantity: f64,
    pub city: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerSkuStats {
    pub n: usize,
    pub mean: f64,
    pub max: f64,
    pub p85: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumStockRecommendation {
    pub sku: String,
    pub method: crate::analysis::minimum::MinimumStockMethod,
    pub coverage_factor: f64,
    pub base: f64,
    pub suggested: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecommendation {
    pub sku: String,
    pub origin: String,
    pub destination: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BestMoment {
    pub cycle: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecommendation {
    pub sku: String,
    pub description: String,
    pub class: String,
    pub category: String,
    pub city: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub total_price: f64,
    pub window_sales: f64,
    pub prior_cycle_sales: f64,
    pub current_cycle_sales: f64,
    pub smart_buy_next_cycle: f64,
    pub best_moment: Option<BestMoment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecommendation {
    pub sku: String,
    pub description: String,
    pub class: String,
    pub promo_cycle: i64,
    pub discount_pct: f64,
    pub base_minimum: u64,
    pub target: u64,
    pub available: f64,
    pub suggested: u64,
    pub promo_unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanTotals {
    pub skus_planned: usize,
    pub transfer_count: usize,
    pub transfer_units: u64,
    pub purchase_count: usize,
    pub purchase_units: u64,
    pub purchase_value: f64,
    pub baseline_purchase_units: u64,
    pub baseline_purchase_value: f64,
}

impl PlanTotals {
    /// Purchase value avoided by moving stock between cities instead of buying.
    pub fn economy(&self) -> f64 {
        self.baseline_purchase_value - self.purchase_value
    }
}
