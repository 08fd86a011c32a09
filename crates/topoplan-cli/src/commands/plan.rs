use crate::{commands::read_deployment, config::Config, display::display_plan, Result};
use clap::{Args, ValueEnum};
use log::debug;
use std::path::PathBuf;
use topoplan_core::derive_plan;

/// How `plan` renders its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// The full plan as JSON, suitable for piping into other tools
    Json,
}

/// Command-line arguments for the `plan` command.
///
/// Derives the complete topology for a deployment file without touching any
/// backend. The same input always yields the same plan.
///
/// # Examples
/// ```bash
/// topoplan plan
/// topoplan plan -f staging.toml --output json
/// ```
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Deployment file (JSON, or TOML by extension)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

pub async fn handle(args: PlanArgs, config: &Config) -> Result<()> {
    let settings = read_deployment(args.file, config)?;
    let plan = derive_plan(&settings)?;

    debug!(
        "Derived plan with {} tenants and {} rules",
        plan.tenant_count(),
        plan.rule_count()
    );

    match args.output {
        OutputFormat::Table => display_plan(&plan),
        OutputFormat::Json => println!("{}", plan.to_json_pretty()?),
    }

    Ok(())
}
