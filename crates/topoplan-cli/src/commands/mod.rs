pub mod apply;
pub mod config;
pub mod plan;
pub mod validate;

use crate::{config::Config, Result};
use std::path::PathBuf;
use topoplan_core::DeploymentSettings;

/// Deployment file from `-f`, falling back to the configured default
pub fn resolve_deployment_path(file: Option<PathBuf>, config: &Config) -> PathBuf {
    file.unwrap_or_else(|| config.deployment_file())
}

/// Read and parse the deployment file. Validation is left to the caller.
pub fn read_deployment(file: Option<PathBuf>, config: &Config) -> Result<DeploymentSettings> {
    let path = resolve_deployment_path(file, config);
    log::debug!("Reading deployment file {}", path.display());
    Ok(topoplan_utils::load_deployment(&path)?)
}

/// Read the deployment file and reject it unless every setting validates
pub fn read_validated_deployment(
    file: Option<PathBuf>,
    config: &Config,
) -> Result<DeploymentSettings> {
    let path = resolve_deployment_path(file, config);
    log::debug!("Validating deployment file {}", path.display());
    Ok(topoplan_utils::load_validated_deployment(&path)?)
}
