use crate::{
    commands::read_validated_deployment,
    config::Config,
    display::{print_info, print_success},
    Result,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Deployment file (JSON, or TOML by extension)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Check a deployment file without deriving anything. Any problem rejects
/// the whole file.
pub async fn handle(args: ValidateArgs, config: &Config) -> Result<()> {
    let settings = read_validated_deployment(args.file, config)?;

    print_success(&format!(
        "Deployment '{}' is valid: {} tenant(s) under {}",
        settings.prefix,
        settings.sub_domains.len(),
        settings.domain
    ));

    if settings.sub_domains.is_empty() {
        print_info("No subdomains listed; only shared resources would be planned");
    }

    Ok(())
}
