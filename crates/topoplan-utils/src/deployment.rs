use crate::errors::{ParseError, Result, UtilsError};
use crate::parsers::{parse_deployment, DeploymentFormat};
use std::fs;
use std::path::Path;
use topoplan_core::DeploymentSettings;

/// Default deployment file name, looked up in the working directory
pub const DEFAULT_DEPLOYMENT_FILE: &str = "env.json";

/// Read and parse a deployment file. The format follows the extension.
pub fn load_deployment(path: &Path) -> Result<DeploymentSettings> {
    if !path.exists() {
        return Err(UtilsError::Parse(ParseError::MissingField(format!(
            "deployment file {} not found",
            path.display()
        ))));
    }

    let content = fs::read_to_string(path)?;
    parse_deployment(&content, DeploymentFormat::from_path(path))
}

/// Load a deployment file and reject it unless it validates
pub fn load_validated_deployment(path: &Path) -> Result<DeploymentSettings> {
    let settings = load_deployment(path)?;
    topoplan_core::validate_settings(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_deployment_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"prefix": "demo", "domain": "example.com",
                 "subDomains": ["a"], "instanceCount": 1}}"#
        )
        .unwrap();

        let settings = load_deployment(file.path()).unwrap();
        assert_eq!(settings.sub_domains, vec!["a"]);
    }

    #[test]
    fn test_missing_deployment_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_deployment(&dir.path().join("env.json"));
        assert!(matches!(result, Err(UtilsError::Parse(_))));
    }

    #[test]
    fn test_validated_load_rejects_duplicates() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "prefix = \"demo\"\ndomain = \"example.com\"\n\
             subDomains = [\"a\", \"a\"]\ninstanceCount = 1"
        )
        .unwrap();

        let result = load_validated_deployment(file.path());
        assert!(matches!(result, Err(UtilsError::Plan(_))));
    }
}
