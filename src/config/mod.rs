use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::client::ClientConfig;
use crate::api::ApiType;
use crate::error::{Result, WarpError};

const CONFIG_DIR_NAME: &str = ".pyhub/warp";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Keys accepted by [`Config::set`] and [`Config::get`]
pub const CONFIG_KEYS: &[&str] = &[
    "law.key",
    "law.nlic.key",
    "law.elis.key",
    "law.prec.key",
    "law.admrul.key",
    "law.expc.key",
    "api.timeout",
    "api.max_retries",
    "api.retry_base_delay",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub law: LawConfig,

    /// Transport overrides applied to every backend
    #[serde(default, skip_serializing_if = "ApiSettings::is_empty")]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LawConfig {
    /// Shared key, used by any backend without its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default)]
    pub nlic: BackendConfig,

    #[serde(default)]
    pub elis: BackendConfig,

    #[serde(default)]
    pub prec: BackendConfig,

    #[serde(default)]
    pub admrul: BackendConfig,

    #[serde(default)]
    pub expc: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Backend-specific key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ApiSettings {
    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Attempts per request, including the first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Initial backoff delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_delay: Option<u64>,
}

impl ApiSettings {
    fn is_empty(&self) -> bool {
        self.timeout.is_none() && self.max_retries.is_none() && self.retry_base_delay.is_none()
    }

    /// Overlay the configured values onto a client configuration
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_base_delay {
            config.retry_base_delay = delay;
        }
        config
    }
}

fn non_empty(key: &Option<String>) -> Option<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| WarpError::Config(format!("{} expects a non-negative integer, got '{}'", key, value)))
}

#[cfg(unix)]
fn restrict(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| WarpError::Config(format!("Failed to set permissions on {}: {}", path.display(), e)))
}

#[cfg(not(unix))]
fn restrict(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

impl Config {
    /// Get the configuration directory
    pub fn config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| WarpError::Config("Could not determine home directory".to_string()))?;

        Ok(home_dir.join(CONFIG_DIR_NAME))
    }

    /// Get the configuration file full path
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_path()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location, creating it on first use
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| WarpError::Config(format!("Failed to read config file: {}", e)))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents)
            .map_err(|e| WarpError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit file; the file is readable by the owner only
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| WarpError::Config(format!("Failed to create config directory: {}", e)))?;
                restrict(dir, 0o700)?;
            }
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| WarpError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, yaml)
            .map_err(|e| WarpError::Config(format!("Failed to write config file: {}", e)))?;
        restrict(path, 0o600)
    }

    fn backend(&self, api_type: ApiType) -> Option<&BackendConfig> {
        match api_type {
            ApiType::Nlic => Some(&self.law.nlic),
            ApiType::Elis => Some(&self.law.elis),
            ApiType::Prec => Some(&self.law.prec),
            ApiType::Admrul => Some(&self.law.admrul),
            ApiType::Expc => Some(&self.law.expc),
            ApiType::All => None,
        }
    }

    /// API key for a backend, falling back to the shared `law.key`.
    /// Blank keys count as missing.
    pub fn get_api_key(&self, api_type: ApiType) -> Option<String> {
        self.backend(api_type)
            .and_then(|backend| non_empty(&backend.key))
            .or_else(|| non_empty(&self.law.key))
    }

    /// Client configuration for a backend with the `api.*` overrides applied
    pub fn client_config(&self, api_type: ApiType) -> Option<ClientConfig> {
        self.get_api_key(api_type)
            .map(|key| self.api.apply(ClientConfig::with_key(key)))
    }

    /// Set a configuration value by key path. The caller persists the change.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "law.key" => self.law.key = Some(value.to_string()),
            "law.nlic.key" => self.law.nlic.key = Some(value.to_string()),
            "law.elis.key" => self.law.elis.key = Some(value.to_string()),
            "law.prec.key" => self.law.prec.key = Some(value.to_string()),
            "law.admrul.key" => self.law.admrul.key = Some(value.to_string()),
            "law.expc.key" => self.law.expc.key = Some(value.to_string()),
            "api.timeout" => self.api.timeout = Some(parse_number(key, value)?),
            "api.max_retries" => self.api.max_retries = Some(parse_number(key, value)?),
            "api.retry_base_delay" => self.api.retry_base_delay = Some(parse_number(key, value)?),
            _ => {
                return Err(WarpError::Config(format!("Unknown configuration key: {}", key)));
            }
        }
        Ok(())
    }

    /// Get a configuration value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "law.key" => self.law.key.clone(),
            "law.nlic.key" => self.law.nlic.key.clone(),
            "law.elis.key" => self.law.elis.key.clone(),
            "law.prec.key" => self.law.prec.key.clone(),
            "law.admrul.key" => self.law.admrul.key.clone(),
            "law.expc.key" => self.law.expc.key.clone(),
            "api.timeout" => self.api.timeout.map(|v| v.to_string()),
            "api.max_retries" => self.api.max_retries.map(|v| v.to_string()),
            "api.retry_base_delay" => self.api.retry_base_delay.map(|v| v.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_backend_key_overrides_shared_key() {
        let mut config = Config::default();
        config.law.key = Some("shared".to_string());
        config.law.prec.key = Some("prec-only".to_string());

        assert_eq!(config.get_api_key(ApiType::Prec).as_deref(), Some("prec-only"));
        assert_eq!(config.get_api_key(ApiType::Nlic).as_deref(), Some("shared"));
        assert_eq!(config.get_api_key(ApiType::All).as_deref(), Some("shared"));
    }

    #[test]
    fn test_blank_keys_are_missing() {
        let mut config = Config::default();
        config.law.nlic.key = Some("  ".to_string());
        assert_eq!(config.get_api_key(ApiType::Nlic), None);

        config.law.key = Some("shared".to_string());
        assert_eq!(config.get_api_key(ApiType::Nlic).as_deref(), Some("shared"));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("law.elis.key", " abc ").unwrap();
        config.set("api.max_retries", "5").unwrap();

        assert_eq!(config.get("law.elis.key").as_deref(), Some("abc"));
        assert_eq!(config.get("api.max_retries").as_deref(), Some("5"));
        assert_eq!(config.get("api.timeout"), None);
        assert!(config.set("api.timeout", "soon").is_err());
        assert!(config.set("law.unknown.key", "x").is_err());
    }

    #[test]
    fn test_api_settings_apply() {
        let mut config = Config::default();
        config.law.key = Some("k".to_string());
        config.api.timeout = Some(5);
        config.api.retry_base_delay = Some(10);

        let client = config.client_config(ApiType::Admrul).unwrap();
        assert_eq!(client.api_key, "k");
        assert_eq!(client.timeout, 5);
        assert_eq!(client.retry_base_delay, 10);
        assert_eq!(client.max_retries, ClientConfig::default().max_retries);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.set("law.key", "shared").unwrap();
        config.set("api.timeout", "12").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_load_legacy_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "law:\n  key: legacy\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.get_api_key(ApiType::Expc).as_deref(), Some("legacy"));
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
