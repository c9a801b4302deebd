pub mod catalog;
pub mod filters;
pub mod promotion;
pub mod transfer;

pub use catalog::Catalog;
pub use filters::{DeactivatedPurchaseMode, DeactivationFilter, PlanFilters};
pub use transfer::{PlanInputs, PlanOptions, PlanResult, plan};
