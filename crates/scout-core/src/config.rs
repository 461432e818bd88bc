//! Configuration management for Walletscout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/walletscout/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Result filter thresholds
    pub filters: FilterConfig,
    /// Scanning engine settings
    pub scanning: ScanningConfig,
    /// Upstream API discovery settings
    pub discovery: DiscoveryConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCOUT_CONCURRENCY`: Override scanning worker count
    /// - `SCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `SCOUT_MORALIS_API_KEY`: Override the primary Moralis key
    /// - `SCOUT_BIRDEYE_API_KEY`: Override the Birdeye key
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("SCOUT_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                config.scanning.concurrency = n;
                tracing::debug!("Override scanning.concurrency from env: {}", n);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_MORALIS_API_KEY") {
            config.discovery.moralis_api_key = val;
            tracing::debug!("Override discovery.moralis_api_key from env");
        }

        if let Ok(val) = std::env::var("SCOUT_BIRDEYE_API_KEY") {
            config.discovery.birdeye_api_key = val;
            tracing::debug!("Override discovery.birdeye_api_key from env");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default config path.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        tracing::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scanning.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.concurrency".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        if self.discovery.max_retries > 10 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.max_retries".to_string(),
                reason: "backoff past 10 retries exceeds any useful scan window".to_string(),
            });
        }

        Ok(())
    }

    /// Get the config file path.
    ///
    /// Uses XDG base directories: `~/.config/walletscout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "walletscout", "walletscout")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Result filter thresholds applied to every extracted wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum win rate percentage
    pub min_win_rate: f64,
    /// Minimum realized PnL percentage
    pub min_realized_pnl: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_win_rate: 50.0,
            min_realized_pnl: 0.0,
        }
    }
}

/// Scanning engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Number of parallel workers, each owning one browser session
    pub concurrency: usize,
    /// Navigation timeout in milliseconds
    pub page_timeout_ms: u64,
    /// Marker-wait timeout in milliseconds
    pub selector_timeout_ms: u64,
    /// Advisory network-idle timeout in milliseconds
    pub load_state_timeout_ms: u64,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            page_timeout_ms: 30_000,
            selector_timeout_ms: 10_000,
            load_state_timeout_ms: 15_000,
        }
    }
}

/// Which upstream supplies the seed token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// Birdeye trending token list filtered by liquidity
    Birdeye,
    /// Moralis graduated pump.fun token list
    Moralis,
}

/// Upstream API discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Primary Moralis API key
    pub moralis_api_key: String,
    /// Fallback Moralis API keys, tried in order on 401
    pub moralis_fallback_keys: Vec<String>,
    /// Birdeye API key
    pub birdeye_api_key: String,
    /// Maximum retry attempts for transient upstream failures
    pub max_retries: u32,
    /// How many seed tokens to fetch
    pub token_limit: usize,
    /// Which upstream supplies the token list
    pub token_source: TokenSource,
    /// Discover wallets via top traders (true) or top holders (false)
    pub fetch_traders: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            moralis_api_key: String::new(),
            moralis_fallback_keys: Vec::new(),
            birdeye_api_key: String::new(),
            max_retries: 3,
            token_limit: 10,
            token_source: TokenSource::Birdeye,
            fetch_traders: true,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scanning.concurrency, 3);
        assert_eq!(config.filters.min_win_rate, 50.0);
        assert_eq!(config.discovery.max_retries, 3);
        assert_eq!(config.discovery.token_source, TokenSource::Birdeye);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[filters]"));
        assert!(toml_str.contains("[scanning]"));
        assert!(toml_str.contains("[discovery]"));
        assert!(toml_str.contains("[browser]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.scanning.concurrency, config.scanning.concurrency);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            [scanning]
            concurrency = 8

            [discovery]
            token_source = "moralis"
        "#;

        let parsed: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(parsed.scanning.concurrency, 8);
        assert_eq!(parsed.discovery.token_source, TokenSource::Moralis);
        // Untouched sections fall back to defaults
        assert_eq!(parsed.scanning.page_timeout_ms, 30_000);
        assert_eq!(parsed.filters.min_win_rate, 50.0);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.scanning.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.filters.min_win_rate = 72.5;
        config.discovery.moralis_fallback_keys = vec!["k1".to_string(), "k2".to_string()];

        let contents = toml::to_string_pretty(&config).expect("serialize");
        std::fs::write(&path, contents).expect("write config");

        let loaded: AppConfig =
            toml::from_str(&std::fs::read_to_string(&path).expect("read config"))
                .expect("parse config");
        assert_eq!(loaded.filters.min_win_rate, 72.5);
        assert_eq!(loaded.discovery.moralis_fallback_keys.len(), 2);
    }
}
