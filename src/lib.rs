pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod planning;
pub mod utils;
pub mod workbook;

pub use config::{CliArgs, OutputFormat, PlannerConfig};
pub use error::{ErrorCode, PlannerError, SkipReason};
pub use logging::{LoggingConfig, init_logging};

use analysis::cycles::{resolve_current_cycle, select_window};
use analysis::minimum::{self, MinimumStockMethod};
use analysis::share::{CityShares, sales_by_city, share_by_city};
use analysis::stats::{best_moments, compute_stats, cycle_totals, rows_in_window};
use analysis::summary::{CycleSales, StockSummary, sales_history, stock_summary};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use ingest::{IngestReport, MappedRows, PdvLookup, map_workbook};
use model::{
    MinimumStockRecommendation, PerSkuStats, PlanTotals, PromotionRecommendation,
    PurchaseRecommendation, TransferRecommendation, WorkbookId,
};
use planning::promotion::{PromotionView, suggest_promotions};
use planning::{Catalog, DeactivatedPurchaseMode, PlanFilters, PlanInputs, PlanOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use workbook::LoadedWorkbook;

/// One input workbook as it was read.
#[derive(Debug, Clone, Serialize)]
pub struct InputFingerprint {
    pub id: WorkbookId,
    pub path: PathBuf,
    pub sheets: Vec<String>,
}

/// Settings a plan was computed with, after presets and fallbacks.
#[derive(Debug, Clone, Serialize)]
pub struct PlanParameters {
    pub method: MinimumStockMethod,
    pub coverage_factor: f64,
    pub scenario: Option<minimum::Scenario>,
    pub horizon_days: u32,
    pub current_cycle: i64,
    pub window: Vec<String>,
    pub filters: PlanFilters,
    pub deactivated_purchases: DeactivatedPurchaseMode,
    pub transfers_enabled: bool,
    pub promo_cycle: Option<i64>,
}

/// Everything a run produces; the unit of export.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub parameters: PlanParameters,
    pub inputs: Vec<InputFingerprint>,
    pub ingest: IngestReport,
    pub stats: BTreeMap<String, PerSkuStats>,
    pub minimum_stock: Vec<MinimumStockRecommendation>,
    pub transfers: Vec<TransferRecommendation>,
    pub purchases: Vec<PurchaseRecommendation>,
    pub promotions: Vec<PromotionRecommendation>,
    pub promotion_view: Vec<PromotionView>,
    pub totals: PlanTotals,
    pub stock_summary: StockSummary,
    pub sales_history: Vec<CycleSales>,
}

/// Loads every configured workbook and runs the whole pipeline.
pub fn run_plan(config: &PlannerConfig) -> Result<PlanReport> {
    config.check_parameters()?;

    let pdv = match config.pdv_lookup.as_deref() {
        Some(path) => PdvLookup::from_path(path),
        None => PdvLookup::empty(),
    };

    let mut mapped = MappedRows::default();
    let mut inputs = Vec::with_capacity(config.workbooks.len());
    for path in &config.workbooks {
        let loaded = LoadedWorkbook::load(path)?;
        let _span = logging::workbook_span(loaded.id.as_str()).entered();
        mapped.extend(map_workbook(&loaded.workbook, &pdv));
        inputs.push(InputFingerprint {
            id: loaded.id.clone(),
            path: loaded.path.clone(),
            sheets: loaded
                .workbook
                .sheet_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    }

    if mapped.is_empty() {
        return Err(PlannerError::NoValidRows {
            workbooks: config.workbooks.len(),
        }
        .into());
    }

    tracing::info!(
        workbooks = inputs.len(),
        stock_rows = mapped.stock_rows.len(),
        sales_rows = mapped.sales_rows.len(),
        skipped_sheets = mapped.report.skipped().count(),
        "inputs mapped"
    );

    Ok(plan_rows(config, mapped, inputs, Local::now().date_naive()))
}

/// Pipeline from mapped rows to a report; `today` only matters when neither
/// the configuration nor the sales name a current cycle.
pub fn plan_rows(
    config: &PlannerConfig,
    mapped: MappedRows,
    inputs: Vec<InputFingerprint>,
    today: NaiveDate,
) -> PlanReport {
    let MappedRows {
        stock_rows,
        sales_rows,
        report: ingest,
    } = mapped;

    let analysis_span = logging::operation_span("analysis").entered();
    let window = select_window(sales_rows.iter().map(|r| r.cycle.as_str()));
    let windowed = rows_in_window(&sales_rows, &window);
    let stats = compute_stats(windowed.iter().copied());
    let minimum_stock = minimum::suggest(&stats, config.method, config.coverage_factor);
    let shares: BTreeMap<String, CityShares> = share_by_city(windowed.iter().copied());
    let window_sales = sales_by_city(windowed.iter().copied());
    let best = best_moments(&cycle_totals(windowed.iter().copied()));
    let current_cycle = resolve_current_cycle(
        config.current_cycle.as_deref(),
        sales_rows.iter().map(|r| r.cycle.as_str()),
        today,
    );
    tracing::info!(
        window = window.len(),
        skus = stats.len(),
        current_cycle,
        "sales analysed"
    );
    drop(analysis_span);

    let _planning_span = logging::operation_span("planning").entered();
    let catalog = Catalog::build(&stock_rows);
    let options = PlanOptions {
        horizon_days: config.horizon_days,
        filters: config.filters.clone(),
        deactivated_purchases: config.deactivated_purchases,
        transfers_enabled: config.transfers_enabled,
        current_cycle,
    };
    let result = planning::plan(
        &minimum_stock,
        PlanInputs {
            catalog: &catalog,
            shares: &shares,
            window_sales: &window_sales,
            best_moments: &best,
        },
        &options,
    );
    let promotions = suggest_promotions(
        &minimum_stock,
        &catalog,
        &config.filters,
        current_cycle,
        config.promo_cycle,
    );
    let promotion_view = promotions
        .iter()
        .map(|p| PromotionView::scaled(p, config.horizon_days))
        .collect();

    PlanReport {
        parameters: PlanParameters {
            method: config.method,
            coverage_factor: config.coverage_factor,
            scenario: config.scenario,
            horizon_days: config.horizon_days,
            current_cycle,
            window: window.clone(),
            filters: config.filters.clone(),
            deactivated_purchases: config.deactivated_purchases,
            transfers_enabled: config.transfers_enabled,
            promo_cycle: config.promo_cycle,
        },
        inputs,
        ingest,
        stats,
        minimum_stock: minimum_stock.into_values().collect(),
        transfers: result.transfers,
        purchases: result.purchases,
        promotions,
        promotion_view,
        totals: result.totals,
        stock_summary: stock_summary(&stock_rows),
        sales_history: sales_history(&sales_rows, &window),
    }
}
