use crate::errors::{ParseError, Result};
use std::path::Path;
use topoplan_core::DeploymentSettings;

/// Deployment file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentFormat {
    Json,
    Toml,
}

impl DeploymentFormat {
    /// Pick the format from a file extension; anything other than `.toml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DeploymentFormat::Toml,
            _ => DeploymentFormat::Json,
        }
    }
}

/// Parse deployment settings from file content
pub fn parse_deployment(content: &str, format: DeploymentFormat) -> Result<DeploymentSettings> {
    let settings = match format {
        DeploymentFormat::Json => serde_json::from_str(content)
            .map_err(|e| ParseError::InvalidFormat(format!("deployment JSON: {}", e)))?,
        DeploymentFormat::Toml => toml::from_str(content)
            .map_err(|e| ParseError::InvalidFormat(format!("deployment TOML: {}", e)))?,
    };

    Ok(settings)
}
