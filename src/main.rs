use anyhow::Context;
use clap::Parser;
use stock_planner::{
    CliArgs, LoggingConfig, OutputFormat, PlannerConfig, export, init_logging, run_plan,
};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = PlannerConfig::from_args(cli)?;

    // Fail before touching any workbook.
    config.validate()?;

    let report = run_plan(&config)?;

    if let Some(path) = config.output.as_deref() {
        export::write_xlsx(path, &report)
            .with_context(|| format!("failed to write plan to {:?}", path))?;
    }

    match config.format {
        OutputFormat::Json => println!("{}", export::to_json(&report)?),
        OutputFormat::Table => print!("{}", export::render_table(&report)),
    }

    Ok(())
}
