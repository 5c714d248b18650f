//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/gex.toml structure.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::schwab::SchwabConfig;
use crate::adapters::store::DEFAULT_STORE_FILE;
use crate::analytics::{EngineParams, DEFAULT_ATM_STRIKE_WINDOW, DEFAULT_WALL_BAND_PCT};
use crate::application::HistorySettings;
use crate::domain::{PutGammaPolicy, DEFAULT_HISTORY_CAP, DEFAULT_HISTORY_TTL_SECS};

/// Upper bound on records kept per (symbol, day)
pub const MAX_HISTORY_CAP: usize = 1000;

/// Main configuration structure matching config/gex.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub store: StoreSection,
}

/// Market data provider section
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    /// Market data API base URL
    pub api_url: String,
    /// OAuth bearer token (prefer GEX_ACCESS_TOKEN in .env)
    #[serde(default)]
    pub access_token: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Strikes requested around the money; omit for the full chain
    #[serde(default)]
    pub strike_count: Option<u32>,
}

/// GEX engine section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// "native" (chain already signs put gamma negative) or "negate"
    #[serde(default)]
    pub put_gamma_policy: PutGammaPolicy,
    /// Wall search band as a fraction of spot; 0 searches every strike
    #[serde(default = "default_wall_band_pct")]
    pub wall_band_pct: f64,
    /// Strikes nearest spot averaged for ATM IV
    #[serde(default = "default_atm_strike_window")]
    pub atm_strike_window: usize,
    /// Drop expirations further out than this many days
    #[serde(default)]
    pub max_dte: Option<u32>,
}

/// Intraday IV history section
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySection {
    /// Record a sample on every profile computation
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Records kept per (symbol, day)
    #[serde(default = "default_history_cap")]
    pub cap: usize,
    /// Store expiry for a day's log
    #[serde(default = "default_history_ttl")]
    pub ttl_seconds: u64,
    /// IANA zone that defines the exchange calendar day
    #[serde(default = "default_exchange_timezone")]
    pub exchange_timezone: String,
}

/// Key-value store section
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// JSON store file (`~` is expanded)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_wall_band_pct() -> f64 {
    DEFAULT_WALL_BAND_PCT
}

fn default_atm_strike_window() -> usize {
    DEFAULT_ATM_STRIKE_WINDOW
}

fn default_true() -> bool {
    true
}

fn default_history_cap() -> usize {
    DEFAULT_HISTORY_CAP
}

fn default_history_ttl() -> u64 {
    DEFAULT_HISTORY_TTL_SECS
}

fn default_exchange_timezone() -> String {
    "America/New_York".to_string()
}

fn default_store_path() -> String {
    format!("~/.gex/{}", DEFAULT_STORE_FILE)
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            put_gamma_policy: PutGammaPolicy::default(),
            wall_band_pct: default_wall_band_pct(),
            atm_strike_window: default_atm_strike_window(),
            max_dte: None,
        }
    }
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            enabled: true,
            cap: default_history_cap(),
            ttl_seconds: default_history_ttl(),
            exchange_timezone: default_exchange_timezone(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if matches!(self.provider.strike_count, Some(0)) {
            return Err(ConfigError::ValidationError(
                "strike_count must be > 0 when set".to_string(),
            ));
        }

        if !self.engine.wall_band_pct.is_finite() || self.engine.wall_band_pct < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "wall_band_pct must be >= 0, got {}",
                self.engine.wall_band_pct
            )));
        }

        self.engine
            .params()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.history.cap == 0 || self.history.cap > MAX_HISTORY_CAP {
            return Err(ConfigError::ValidationError(format!(
                "history cap must be 1-{}, got {}",
                MAX_HISTORY_CAP, self.history.cap
            )));
        }

        if self.history.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "history ttl_seconds must be > 0".to_string(),
            ));
        }

        self.history.timezone()?;

        if self.store.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl ProviderSection {
    /// Get API URL with environment variable override
    /// Checks GEX_PROVIDER_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var("GEX_PROVIDER_URL").unwrap_or_else(|_| self.api_url.clone())
    }

    /// Get access token with environment variable override
    /// Checks GEX_ACCESS_TOKEN env var first, falls back to a non-empty config value
    pub fn get_access_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("GEX_ACCESS_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }
        self.access_token.clone().filter(|t| !t.is_empty())
    }

    pub fn client_config(&self) -> SchwabConfig {
        SchwabConfig {
            api_base_url: self.get_api_url().trim_end_matches('/').to_string(),
            access_token: self.get_access_token(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            strike_count: self.strike_count,
        }
    }
}

impl EngineSection {
    /// Engine parameters; a zero band disables the wall band
    pub fn params(&self) -> EngineParams {
        let band = (self.wall_band_pct > 0.0).then_some(self.wall_band_pct);
        EngineParams::default()
            .with_put_gamma_policy(self.put_gamma_policy)
            .with_wall_band(band)
            .with_atm_window(self.atm_strike_window)
            .with_max_dte(self.max_dte)
    }
}

impl HistorySection {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.exchange_timezone.parse::<Tz>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "unknown exchange_timezone '{}'",
                self.exchange_timezone
            ))
        })
    }

    pub fn settings(&self) -> Result<HistorySettings, ConfigError> {
        Ok(HistorySettings {
            cap: self.cap,
            ttl_seconds: self.ttl_seconds,
            timezone: self.timezone()?,
        })
    }
}

impl StoreSection {
    /// Get store path with environment variable override and `~` expansion
    /// Checks GEX_STORE_PATH env var first, falls back to config value
    pub fn get_path(&self) -> PathBuf {
        let raw = std::env::var("GEX_STORE_PATH").unwrap_or_else(|_| self.path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[provider]
api_url = "https://api.schwabapi.com/marketdata/v1"
timeout_secs = 10
max_retries = 2
strike_count = 60

[engine]
put_gamma_policy = "negate"
wall_band_pct = 0.25
atm_strike_window = 7
max_dte = 45

[history]
enabled = true
cap = 50
ttl_seconds = 86400
exchange_timezone = "America/Chicago"

[store]
path = "/tmp/gex/store.json"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.provider.strike_count, Some(60));
        assert_eq!(config.engine.put_gamma_policy, PutGammaPolicy::Negate);
        assert_eq!(config.engine.atm_strike_window, 7);
        assert_eq!(config.history.cap, 50);
        assert_eq!(config.history.timezone().unwrap(), chrono_tz::America::Chicago);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/gex.toml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_optional_sections_default() {
        let file = write_config(
            r#"
[provider]
api_url = "http://localhost:8080"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.provider.max_retries, 3);
        assert!(config.provider.strike_count.is_none());
        assert_eq!(config.engine.params(), EngineParams::default());
        assert!(config.history.enabled);
        assert_eq!(config.history.settings().unwrap(), HistorySettings::default());
        assert!(config.store.path.ends_with(DEFAULT_STORE_FILE));
    }

    #[test]
    fn test_provider_section_required() {
        let file = write_config("[engine]\natm_strike_window = 3\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_history_cap() {
        for cap in ["0", "1001"] {
            let content = create_valid_config().replace("cap = 50", &format!("cap = {}", cap));
            let file = write_config(&content);
            assert!(matches!(
                load_config(file.path()),
                Err(ConfigError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_invalid_timezone() {
        let content = create_valid_config().replace("America/Chicago", "Mars/Olympus_Mons");
        let file = write_config(&content);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_invalid_engine_values() {
        let content = create_valid_config().replace("atm_strike_window = 7", "atm_strike_window = 0");
        let file = write_config(&content);
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));

        let content = create_valid_config().replace("wall_band_pct = 0.25", "wall_band_pct = -0.1");
        let file = write_config(&content);
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));

        let content = create_valid_config().replace("put_gamma_policy = \"negate\"", "put_gamma_policy = \"flip\"");
        let file = write_config(&content);
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_band_disables_wall_band() {
        let content = create_valid_config().replace("wall_band_pct = 0.25", "wall_band_pct = 0.0");
        let file = write_config(&content);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.params().wall_band_pct, None);
    }

    #[test]
    fn test_config_to_engine_params() {
        let file = write_config(&create_valid_config());
        let params = load_config(file.path()).unwrap().engine.params();

        assert_eq!(params.put_gamma_policy, PutGammaPolicy::Negate);
        assert_eq!(params.wall_band_pct, Some(0.25));
        assert_eq!(params.atm_strike_window, 7);
        assert_eq!(params.max_dte, Some(45));
    }

    #[test]
    fn test_client_config_from_provider() {
        let provider = ProviderSection {
            api_url: "http://localhost:9000/v1/".to_string(),
            access_token: Some(String::new()),
            timeout_secs: 5,
            max_retries: 1,
            strike_count: Some(20),
        };
        let client = provider.client_config();

        if std::env::var("GEX_PROVIDER_URL").is_err() {
            assert_eq!(client.api_base_url, "http://localhost:9000/v1");
        }
        if std::env::var("GEX_ACCESS_TOKEN").is_err() {
            assert!(client.access_token.is_none());
        }
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.strike_count, Some(20));
    }
}
