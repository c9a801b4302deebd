use crate::analysis::cycles::next_cycle;
use crate::planning::catalog::SkuMeta;
use crate::utils::normalize_text;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which SKUs take part in a plan, by deactivation status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeactivationFilter {
    #[default]
    All,
    /// No deactivation cycle, or one still in the future.
    OnlyActive,
    /// Deactivated at or before the current cycle.
    DeactivatingByCurrent,
    /// Deactivated at or before the cycle after the current one.
    DeactivatingByNext,
}

/// Whether deficits of deactivated SKUs still become purchases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeactivatedPurchaseMode {
    #[default]
    Exclude,
    Include,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanFilters {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub deactivation: DeactivationFilter,
}

fn matches_any(selected: &[String], value: &str) -> bool {
    if selected.is_empty() {
        return true;
    }
    let value = normalize_text(value);
    selected.iter().any(|s| normalize_text(s) == value)
}

impl PlanFilters {
    pub fn accepts_sku(&self, meta: &SkuMeta, current_cycle: i64) -> bool {
        matches_any(&self.classes, &meta.class)
            && matches_any(&self.categories, &meta.category)
            && self.accepts_deactivation(meta.deactivation_cycle, current_cycle)
    }

    pub fn accepts_deactivation(&self, deactivation: Option<i64>, current_cycle: i64) -> bool {
        match self.deactivation {
            DeactivationFilter::All => true,
            DeactivationFilter::OnlyActive => deactivation.map_or(true, |d| d > current_cycle),
            DeactivationFilter::DeactivatingByCurrent => {
                deactivation.is_some_and(|d| d <= current_cycle)
            }
            DeactivationFilter::DeactivatingByNext => {
                deactivation.is_some_and(|d| d <= next_cycle(current_cycle))
            }
        }
    }

    pub fn accepts_city(&self, city: &str) -> bool {
        matches_any(&self.cities, city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(class: &str, deactivation: Option<i64>) -> SkuMeta {
        SkuMeta {
            class: class.into(),
            category: "PERFUMARIA".into(),
            deactivation_cycle: deactivation,
            ..Default::default()
        }
    }

    #[test]
    fn empty_filters_accept_everything() {
        let filters = PlanFilters::default();
        assert!(filters.accepts_sku(&meta("", Some(202401)), 202505));
        assert!(filters.accepts_city("qualquer"));
    }

    #[test]
    fn class_and_city_filters_ignore_case_and_accents() {
        let filters = PlanFilters {
            classes: vec!["a".into()],
            cities: vec!["Maringa".into()],
            ..Default::default()
        };
        assert!(filters.accepts_sku(&meta("A", None), 202505));
        assert!(!filters.accepts_sku(&meta("B", None), 202505));
        assert!(filters.accepts_city("MARINGÁ"));
        assert!(!filters.accepts_city("Londrina"));
    }

    #[test]
    fn deactivation_modes() {
        let current = 202505;
        let mut filters = PlanFilters::default();

        filters.deactivation = DeactivationFilter::OnlyActive;
        assert!(filters.accepts_deactivation(None, current));
        assert!(filters.accepts_deactivation(Some(202506), current));
        assert!(!filters.accepts_deactivation(Some(202505), current));

        filters.deactivation = DeactivationFilter::DeactivatingByCurrent;
        assert!(!filters.accepts_deactivation(None, current));
        assert!(filters.accepts_deactivation(Some(202505), current));
        assert!(!filters.accepts_deactivation(Some(202506), current));

        filters.deactivation = DeactivationFilter::DeactivatingByNext;
        assert!(filters.accepts_deactivation(Some(202506), current));
        assert!(!filters.accepts_deactivation(Some(202507), current));
        assert!(filters.accepts_deactivation(Some(202601), 202517));
    }

    #[test]
    fn option_spellings() {
        assert_eq!(
            "deactivating-by-next".parse::<DeactivationFilter>().unwrap(),
            DeactivationFilter::DeactivatingByNext
        );
        assert_eq!(DeactivatedPurchaseMode::Include.to_string(), "include");
    }
}
