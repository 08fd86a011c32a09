use crate::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use topoplan_utils::{mask_secret, DEFAULT_DEPLOYMENT_FILE};

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "TOPOPLAN_API_KEY";

/// Keys accepted by `config get` and `config set`
pub const CONFIG_KEYS: [&str; 3] = ["backend.api_key", "backend.base_url", "deployment.file"];

/// Configuration-specific errors that can occur during config operations
///
/// # Variants
/// * `MissingField` - A required configuration field is missing
/// * `InvalidValue` - A configuration value is invalid for its field
/// * `UnknownKey` - The key is not one of [`CONFIG_KEYS`]
/// * `DirectoryCreationFailed` - Failed to create the config directory
/// * `TomlError` - Error parsing or serializing TOML data
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error(
        "Unknown config key '{0}' (expected one of: backend.api_key, backend.base_url, \
         deployment.file)"
    )]
    UnknownKey(String),

    #[error("Config directory creation failed: {0}")]
    DirectoryCreationFailed(String),

    #[error("TOML parsing error: {0}")]
    TomlError(String),
}

/// Provisioning backend section
///
/// # Fields
/// * `api_key` - Optional API key sent as a bearer token
/// * `base_url` - Optional base URL of the provisioning API
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BackendSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Deployment section
///
/// # Fields
/// * `file` - Deployment file used when `-f` is not given
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DeploymentSection {
    pub file: Option<String>,
}

/// Main configuration structure containing all configuration sections
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigData {
    pub backend: Option<BackendSection>,
    pub deployment: Option<DeploymentSection>,
}

/// Lets the provisioning client read its settings straight from the config
impl topoplan_api::BackendConfig for Config {
    type Error = CliError;

    /// Get the API key, returning an error if it's missing
    fn get_api_key(&self) -> std::result::Result<String, Self::Error> {
        self.get_api_key()?.ok_or_else(|| {
            CliError::Config(ConfigError::MissingField(format!(
                "backend.api_key (or set {})",
                API_KEY_ENV
            )))
        })
    }

    fn get_base_url(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(self.data.backend.as_ref().and_then(|b| b.base_url.clone()))
    }
}

/// Configuration manager that handles loading, saving, and accessing configuration
///
/// # Fields
/// * `config_path` - Path to the configuration file
/// * `data` - The configuration data structure
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub data: ConfigData,
}

impl Config {
    /// Load the config from `~/.topoplan/config.toml`, or start from defaults
    /// if it does not exist yet. Nothing is written until [`Config::save`].
    pub fn new() -> Result<Self> {
        Self::load_from(get_config_dir()?.join("config.toml"))
    }

    /// Load the config from an explicit path
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        let data = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(CliError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?
        } else {
            ConfigData::default()
        };

        log::debug!("Loaded config from {}", config_path.display());

        Ok(Config { config_path, data })
    }

    /// Save the configuration to file with atomic write
    ///
    /// # Errors
    /// * `ConfigError::TomlError` - If TOML serialization fails
    /// * `ConfigError::DirectoryCreationFailed` - If directory creation fails
    /// * `CliError::Io` - If file operations fail
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&self.data)
            .map_err(|e| ConfigError::TomlError(e.to_string()))?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::DirectoryCreationFailed(e.to_string()))?;
            }
        }

        // Write to a temporary file first, then rename
        let temp_path = self.config_path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(CliError::Io)?;
        fs::rename(&temp_path, &self.config_path).map_err(CliError::Io)?;

        Ok(())
    }

    /// Get the API key, checking the environment variable first
    pub fn get_api_key(&self) -> Result<Option<String>> {
        Ok(resolve_api_key(
            std::env::var(API_KEY_ENV).ok(),
            self.data.backend.as_ref().and_then(|b| b.api_key.clone()),
        ))
    }

    pub fn set_api_key(&mut self, api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backend.api_key".to_string(),
                value: "<empty>".to_string(),
            }
            .into());
        }

        self.data
            .backend
            .get_or_insert_with(BackendSection::default)
            .api_key = Some(api_key.trim().to_string());
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        let base_url = base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url".to_string(),
                value: base_url.to_string(),
            }
            .into());
        }

        self.data
            .backend
            .get_or_insert_with(BackendSection::default)
            .base_url = Some(base_url.to_string());
        Ok(())
    }

    /// Deployment file to read when none is given on the command line
    pub fn deployment_file(&self) -> PathBuf {
        self.data
            .deployment
            .as_ref()
            .and_then(|d| d.file.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOYMENT_FILE))
    }

    pub fn set_deployment_file(&mut self, file: &str) -> Result<()> {
        if file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "deployment.file".to_string(),
                value: "<empty>".to_string(),
            }
            .into());
        }

        self.data
            .deployment
            .get_or_insert_with(DeploymentSection::default)
            .file = Some(file.trim().to_string());
        Ok(())
    }

    /// Get a value by dotted key. The API key comes back masked.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        match key {
            "backend.api_key" => Ok(self.get_api_key()?.map(|k| mask_secret(&k))),
            "backend.base_url" => Ok(self.data.backend.as_ref().and_then(|b| b.base_url.clone())),
            "deployment.file" => Ok(self.data.deployment.as_ref().and_then(|d| d.file.clone())),
            other => Err(ConfigError::UnknownKey(other.to_string()).into()),
        }
    }

    /// Set a value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend.api_key" => self.set_api_key(value),
            "backend.base_url" => self.set_base_url(value),
            "deployment.file" => self.set_deployment_file(value),
            other => Err(ConfigError::UnknownKey(other.to_string()).into()),
        }
    }

    /// Show all configuration as a formatted string, with the API key masked
    pub fn show_config(&self) -> String {
        let mut shown = self.data.clone();
        if let Some(key) = shown.backend.as_mut().and_then(|b| b.api_key.as_mut()) {
            *key = mask_secret(key);
        }
        toml::to_string_pretty(&shown).unwrap_or_else(|_| "Error formatting config".to_string())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Environment wins over the stored key; blank values count as unset
fn resolve_api_key(from_env: Option<String>, stored: Option<String>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or(stored.filter(|k| !k.trim().is_empty()))
}

fn get_config_dir() -> Result<PathBuf> {
    let home_dir = home::home_dir().ok_or_else(|| {
        ConfigError::DirectoryCreationFailed("Could not find home directory".to_string())
    })?;

    Ok(home_dir.join(".topoplan"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("nested").join("config.toml")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (_dir, config) = temp_config();
        assert_eq!(config.data, ConfigData::default());
        assert_eq!(config.deployment_file(), PathBuf::from("env.json"));
    }

    #[test]
    fn test_save_and_reload() {
        let (_dir, mut config) = temp_config();
        config.set_value("backend.base_url", "https://provision.example.com").unwrap();
        config.set_value("deployment.file", "prod.toml").unwrap();
        config.set_value("backend.api_key", "abcd1234efgh5678").unwrap();
        config.save().unwrap();

        assert!(!config.config_path.with_extension("tmp").exists());

        let reloaded = Config::load_from(config.config_path.clone()).unwrap();
        assert_eq!(reloaded.data, config.data);
        assert_eq!(reloaded.deployment_file(), PathBuf::from("prod.toml"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let (_dir, mut config) = temp_config();

        assert!(matches!(
            config.set_value("backend.base_url", "provision.example.com"),
            Err(CliError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(matches!(
            config.set_value("ssh.user", "root"),
            Err(CliError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(config.get_value("nope").is_err());
    }

    #[test]
    fn test_show_masks_api_key() {
        let (_dir, mut config) = temp_config();
        config.set_api_key("abcd1234efgh5678").unwrap();

        let shown = config.show_config();
        assert!(shown.contains("abcd****5678"));
        assert!(!shown.contains("abcd1234efgh5678"));
    }

    #[test]
    fn test_env_overrides_stored_key() {
        assert_eq!(
            resolve_api_key(Some("from-env".to_string()), Some("stored".to_string())),
            Some("from-env".to_string())
        );
        assert_eq!(
            resolve_api_key(Some("  ".to_string()), Some("stored".to_string())),
            Some("stored".to_string())
        );
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend = 3").unwrap();

        assert!(matches!(
            Config::load_from(path),
            Err(CliError::Config(ConfigError::TomlError(_)))
        ));
    }
}
