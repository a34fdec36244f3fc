use crate::core::address::{Address, OriginConfig};
use crate::providers::taxjar::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TaxJarProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TaxJarProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TaxJarProviderConfig {
    fn default() -> Self {
        TaxJarProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub taxjar: TaxJarProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub api_token: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    /// Address used by the `test` command.
    pub test_address: Option<Address>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "taxrate", "taxrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
api_token: "secret"
origin:
  use_extended_method: true
  use_standard_rate: false
  from_country: "US"
  from_state: "CA"
  from_zip: "90002"
test_address:
  country_code: "US"
  city: "New York"
  zip: "10001"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api_token, "secret");
        assert!(config.origin.use_extended_method);
        assert!(!config.origin.use_standard_rate);
        assert_eq!(config.origin.from_zip, "90002");
        assert_eq!(config.providers.taxjar.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.providers.taxjar.timeout(), Duration::from_secs(30));

        let address = config.test_address.expect("Expected a test address");
        assert_eq!(address.zip, "10001");
        assert!(address.state_code.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let yaml_str = r#"
api_token: "secret"
providers:
  taxjar:
    base_url: "http://example.com/v2"
    timeout_secs: 5
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.providers.taxjar.base_url, "http://example.com/v2");
        assert_eq!(config.providers.taxjar.timeout(), Duration::from_secs(5));
        assert_eq!(config.origin, OriginConfig::default());
        assert!(config.test_address.is_none());
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let result = serde_yaml::from_str::<AppConfig>("origin: {}");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "api_token: \"abc\"\n")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.api_token, "abc");

        let missing = AppConfig::load_from_path(file.path().with_extension("missing"));
        assert!(missing.unwrap_err().to_string().contains("Failed to read config file"));
        Ok(())
    }
}
