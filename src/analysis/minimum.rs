use crate::model::{MinimumStockRecommendation, PerSkuStats};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

pub const DEFAULT_COVERAGE_FACTOR: f64 = 1.0;

/// Statistic the minimum stock is based on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
pub enum MinimumStockMethod {
    #[default]
    #[serde(rename = "media17")]
    #[strum(serialize = "media17")]
    #[value(name = "media17")]
    Mean,
    #[serde(rename = "max17")]
    #[strum(serialize = "max17")]
    #[value(name = "max17")]
    Max,
    #[serde(rename = "p85")]
    #[strum(serialize = "p85")]
    #[value(name = "p85")]
    P85,
    #[serde(rename = "media+1sigma")]
    #[strum(serialize = "media+1sigma")]
    #[value(name = "media+1sigma")]
    MeanPlusSigma,
}

impl MinimumStockMethod {
    pub fn base(self, stats: &PerSkuStats) -> f64 {
        match self {
            MinimumStockMethod::Mean => stats.mean,
            MinimumStockMethod::Max => stats.max,
            MinimumStockMethod::P85 => stats.p85,
            MinimumStockMethod::MeanPlusSigma => stats.mean + stats.sigma,
        }
    }
}

/// Named method/coverage presets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scenario {
    Conservative,
    Neutral,
    Aggressive,
}

impl Scenario {
    pub fn parameters(self) -> (MinimumStockMethod, f64) {
        match self {
            Scenario::Conservative => (MinimumStockMethod::Max, 1.5),
            Scenario::Neutral => (MinimumStockMethod::Mean, 1.0),
            Scenario::Aggressive => (MinimumStockMethod::P85, 0.75),
        }
    }
}

/// `max(0, ceil(base * coverage_factor))`.
pub fn suggested_quantity(base: f64, coverage_factor: f64) -> u64 {
    let raw = (base * coverage_factor).ceil();
    if raw.is_finite() && raw > 0.0 {
        raw as u64
    } else {
        0
    }
}

pub fn suggest(
    stats: &BTreeMap<String, PerSkuStats>,
    method: MinimumStockMethod,
    coverage_factor: f64,
) -> BTreeMap<String, MinimumStockRecommendation> {
    stats
        .iter()
        .map(|(sku, s)| {
            let base = method.base(s);
            (
                sku.clone(),
                MinimumStockRecommendation {
                    sku: sku.clone(),
                    method,
                    coverage_factor,
                    base,
                    suggested: suggested_quantity(base, coverage_factor),
                },
            )
        })
        .collect()
}
