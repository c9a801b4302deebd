use crate::analysis::cycles::ciclo_key;
use crate::analysis::minimum::{DEFAULT_COVERAGE_FACTOR, MinimumStockMethod, Scenario};
use crate::error::PlannerError;
use crate::planning::filters::{DeactivatedPurchaseMode, DeactivationFilter, PlanFilters};
use crate::planning::transfer::DEFAULT_HORIZON_DAYS;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

/// How the plan is rendered on stdout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannerConfig {
    pub workbooks: Vec<PathBuf>,
    pub pdv_lookup: Option<PathBuf>,
    pub method: MinimumStockMethod,
    pub coverage_factor: f64,
    pub scenario: Option<Scenario>,
    pub horizon_days: u32,
    pub deactivated_purchases: DeactivatedPurchaseMode,
    pub transfers_enabled: bool,
    pub filters: PlanFilters,
    pub current_cycle: Option<String>,
    pub promo_cycle: Option<i64>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            workbooks: Vec::new(),
            pdv_lookup: None,
            method: MinimumStockMethod::default(),
            coverage_factor: DEFAULT_COVERAGE_FACTOR,
            scenario: None,
            horizon_days: DEFAULT_HORIZON_DAYS,
            deactivated_purchases: DeactivatedPurchaseMode::default(),
            transfers_enabled: true,
            filters: PlanFilters::default(),
            current_cycle: None,
            promo_cycle: None,
            output: None,
            format: OutputFormat::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            workbooks: cli_workbooks,
            pdv_lookup: cli_pdv_lookup,
            method: cli_method,
            coverage_factor: cli_coverage_factor,
            scenario: cli_scenario,
            horizon_days: cli_horizon_days,
            deactivation_filter: cli_deactivation_filter,
            deactivated_purchases: cli_deactivated_purchases,
            no_transfers,
            classes: cli_classes,
            categories: cli_categories,
            cities: cli_cities,
            current_cycle: cli_current_cycle,
            promo_cycle: cli_promo_cycle,
            output: cli_output,
            format: cli_format,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            workbooks: file_workbooks,
            pdv_lookup: file_pdv_lookup,
            method: file_method,
            coverage_factor: file_coverage_factor,
            scenario: file_scenario,
            horizon_days: file_horizon_days,
            deactivation_filter: file_deactivation_filter,
            deactivated_purchases: file_deactivated_purchases,
            transfers_enabled: file_transfers_enabled,
            classes: file_classes,
            categories: file_categories,
            cities: file_cities,
            current_cycle: file_current_cycle,
            promo_cycle: file_promo_cycle,
            output: file_output,
            format: file_format,
        } = file_config;

        let workbooks = if cli_workbooks.is_empty() {
            file_workbooks.unwrap_or_default()
        } else {
            cli_workbooks
        };

        let scenario = cli_scenario.or(file_scenario);
        let (method, coverage_factor) = match scenario {
            Some(scenario) => scenario.parameters(),
            None => (
                cli_method.or(file_method).unwrap_or_default(),
                cli_coverage_factor
                    .or(file_coverage_factor)
                    .unwrap_or(DEFAULT_COVERAGE_FACTOR),
            ),
        };

        let transfers_enabled = if no_transfers {
            false
        } else {
            file_transfers_enabled.unwrap_or(true)
        };

        let filters = PlanFilters {
            classes: clean_list(cli_classes.or(file_classes)),
            categories: clean_list(cli_categories.or(file_categories)),
            cities: clean_list(cli_cities.or(file_cities)),
            deactivation: cli_deactivation_filter
                .or(file_deactivation_filter)
                .unwrap_or_default(),
        };

        let current_cycle = cli_current_cycle
            .or(file_current_cycle)
            .map(|cycle| cycle.trim().to_string())
            .filter(|cycle| !cycle.is_empty());

        Ok(Self {
            workbooks,
            pdv_lookup: cli_pdv_lookup.or(file_pdv_lookup),
            method,
            coverage_factor,
            scenario,
            horizon_days: cli_horizon_days
                .or(file_horizon_days)
                .unwrap_or(DEFAULT_HORIZON_DAYS),
            deactivated_purchases: cli_deactivated_purchases
                .or(file_deactivated_purchases)
                .unwrap_or_default(),
            transfers_enabled,
            filters,
            current_cycle,
            promo_cycle: cli_promo_cycle.or(file_promo_cycle),
            output: cli_output.or(file_output),
            format: cli_format.or(file_format).unwrap_or_default(),
        })
    }

    /// Fails fast on settings no plan can be computed with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.workbooks.is_empty(),
            "at least one input workbook must be provided"
        );
        for workbook in &self.workbooks {
            anyhow::ensure!(
                workbook.exists(),
                "input workbook {:?} does not exist",
                workbook
            );
            anyhow::ensure!(
                workbook.is_file(),
                "input workbook {:?} is not a file",
                workbook
            );
        }
        self.check_parameters()?;
        Ok(())
    }

    /// Range checks on the numeric and cycle settings, independent of the
    /// filesystem.
    pub fn check_parameters(&self) -> Result<(), PlannerError> {
        if !(self.coverage_factor.is_finite() && self.coverage_factor > 0.0) {
            return Err(PlannerError::invalid_parameter(
                "coverage_factor",
                format!("must be positive, got {}", self.coverage_factor),
            ));
        }
        if self.horizon_days == 0 {
            return Err(PlannerError::invalid_parameter(
                "horizon_days",
                "must be at least one day",
            ));
        }
        if let Some(cycle) = self.current_cycle.as_deref() {
            if ciclo_key(cycle).is_none() {
                return Err(PlannerError::invalid_parameter(
                    "current_cycle",
                    format!("{cycle:?} is not a recognizable cycle"),
                ));
            }
        }
        Ok(())
    }
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "stock-planner",
    about = "Minimum stock, transfer and purchase planning from retail spreadsheets",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        value_name = "WORKBOOK",
        env = "STOCK_PLANNER_WORKBOOKS",
        value_delimiter = ',',
        help = "Input workbooks; rows of all workbooks are combined in order"
    )]
    pub workbooks: Vec<PathBuf>,

    #[arg(
        long,
        env = "STOCK_PLANNER_PDV_LOOKUP",
        value_name = "FILE",
        help = "Delimited file mapping point-of-sale codes to cities"
    )]
    pub pdv_lookup: Option<PathBuf>,

    #[arg(
        long,
        env = "STOCK_PLANNER_METHOD",
        value_enum,
        value_name = "METHOD",
        help = "Statistic the minimum stock is based on"
    )]
    pub method: Option<MinimumStockMethod>,

    #[arg(
        long,
        env = "STOCK_PLANNER_COVERAGE_FACTOR",
        value_name = "FACTOR",
        help = "Multiplier applied to the base statistic",
        value_parser = clap::value_parser!(f64)
    )]
    pub coverage_factor: Option<f64>,

    #[arg(
        long,
        env = "STOCK_PLANNER_SCENARIO",
        value_enum,
        value_name = "SCENARIO",
        help = "Preset that overrides method and coverage factor"
    )]
    pub scenario: Option<Scenario>,

    #[arg(
        long,
        env = "STOCK_PLANNER_HORIZON_DAYS",
        value_name = "DAYS",
        help = "Planning horizon in days",
        value_parser = clap::value_parser!(u32)
    )]
    pub horizon_days: Option<u32>,

    #[arg(
        long,
        env = "STOCK_PLANNER_DEACTIVATION_FILTER",
        value_enum,
        value_name = "FILTER",
        help = "Restrict the plan by deactivation status"
    )]
    pub deactivation_filter: Option<DeactivationFilter>,

    #[arg(
        long,
        env = "STOCK_PLANNER_DEACTIVATED_PURCHASES",
        value_enum,
        value_name = "MODE",
        help = "Whether deactivated SKUs may still generate purchases"
    )]
    pub deactivated_purchases: Option<DeactivatedPurchaseMode>,

    #[arg(
        long,
        env = "STOCK_PLANNER_NO_TRANSFERS",
        help = "Cover every deficit with purchases instead of transfers"
    )]
    pub no_transfers: bool,

    #[arg(
        long = "class",
        env = "STOCK_PLANNER_CLASSES",
        value_name = "CLASS",
        value_delimiter = ',',
        help = "Comma-separated classes to plan"
    )]
    pub classes: Option<Vec<String>>,

    #[arg(
        long = "category",
        env = "STOCK_PLANNER_CATEGORIES",
        value_name = "CATEGORY",
        value_delimiter = ',',
        help = "Comma-separated categories to plan"
    )]
    pub categories: Option<Vec<String>>,

    #[arg(
        long = "city",
        env = "STOCK_PLANNER_CITIES",
        value_name = "CITY",
        value_delimiter = ',',
        help = "Comma-separated cities to report"
    )]
    pub cities: Option<Vec<String>>,

    #[arg(
        long,
        env = "STOCK_PLANNER_CURRENT_CYCLE",
        value_name = "CYCLE",
        help = "Current cycle (e.g. 202505); defaults to the latest sales cycle"
    )]
    pub current_cycle: Option<String>,

    #[arg(
        long,
        env = "STOCK_PLANNER_PROMO_CYCLE",
        value_name = "CYCLE",
        help = "Only suggest purchases for this promotion cycle",
        value_parser = clap::value_parser!(i64)
    )]
    pub promo_cycle: Option<i64>,

    #[arg(
        long,
        short = 'o',
        env = "STOCK_PLANNER_OUTPUT",
        value_name = "FILE",
        help = "Write the plan to this xlsx file"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        env = "STOCK_PLANNER_FORMAT",
        value_enum,
        value_name = "FORMAT",
        help = "Stdout rendering (table or json)"
    )]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    workbooks: Option<Vec<PathBuf>>,
    pdv_lookup: Option<PathBuf>,
    method: Option<MinimumStockMethod>,
    coverage_factor: Option<f64>,
    scenario: Option<Scenario>,
    horizon_days: Option<u32>,
    deactivation_filter: Option<DeactivationFilter>,
    deactivated_purchases: Option<DeactivatedPurchaseMode>,
    transfers_enabled: Option<bool>,
    classes: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    cities: Option<Vec<String>>,
    current_cycle: Option<String>,
    promo_cycle: Option<i64>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
