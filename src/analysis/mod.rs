//! Sales analysis: cycle windows, per-SKU statistics, minimum stock,
//! per-city sales shares and dashboard summaries.

pub mod cycles;
pub mod minimum;
pub mod share;
pub mod stats;
pub mod summary;

pub use cycles::{ciclo_key, next_cycle, select_window};
pub use minimum::{MinimumStockMethod, Scenario};
