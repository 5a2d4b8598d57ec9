//! # Loyalty Configuration
//!
//! Configuration for the store, the pass service client, visit registration,
//! and the scanner.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LEU_DEPLOYMENT_MODE=production                                     │
//! │     LEU_PASS_BASE_URL=https://staging.example.com                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/leu-loyalty/loyalty.toml (Linux)                         │
//! │     ~/Library/Application Support/com.leubeautylab.loyalty/ (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     DeploymentMode::Development, collection "clientes"                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # loyalty.toml
//! [store]
//! database_path = "leu.db"
//! collection = "clientes"
//! max_connections = 5
//!
//! [pass]
//! mode = "production"      # development | production
//! # base_url = "https://api.leubeautylab.com"
//! pass_type_identifier = "pass.com.salondenails.loyalty"
//! request_timeout_secs = 15
//!
//! [visits]
//! max_conflict_retries = 3
//!
//! [scanner]
//! cooldown_ms = 3000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{LoyaltyError, LoyaltyResult};

/// Pass service base URL used in development.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:3001";

/// Pass service base URL used in production.
pub const PRODUCTION_BASE_URL: &str = "https://api.leubeautylab.com";

// =============================================================================
// Deployment Mode
// =============================================================================

/// Which pass service deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Local pass service on port 3001.
    #[default]
    Development,

    /// Hosted pass service.
    Production,
}

impl DeploymentMode {
    /// Base URL of the pass service for this mode.
    pub fn base_url(&self) -> &'static str {
        match self {
            DeploymentMode::Development => DEVELOPMENT_BASE_URL,
            DeploymentMode::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Development => write!(f, "development"),
            DeploymentMode::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            other => Err(LoyaltyError::InvalidConfig(format!(
                "Unknown deployment mode: '{}'. Valid options: development, production",
                other
            ))),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Where customer documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file holding the documents.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Collection name for customers.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("leu.db")
}

fn default_collection() -> String {
    leu_core::CUSTOMERS_COLLECTION.to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            collection: default_collection(),
            max_connections: default_max_connections(),
        }
    }
}

impl StoreSettings {
    /// Builds the pool configuration for these settings.
    pub fn db_config(&self) -> leu_db::DbConfig {
        leu_db::DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .collection(&self.collection)
    }
}

// =============================================================================
// Pass Service Settings
// =============================================================================

/// How to reach the pass service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassSettings {
    /// Deployment the base URL is picked from.
    #[serde(default)]
    pub mode: DeploymentMode,

    /// Explicit base URL; overrides the mode's URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Pass type identifier sent with generation requests.
    #[serde(default = "default_pass_type_identifier")]
    pub pass_type_identifier: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_pass_type_identifier() -> String {
    leu_core::DEFAULT_PASS_TYPE_IDENTIFIER.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for PassSettings {
    fn default() -> Self {
        PassSettings {
            mode: DeploymentMode::default(),
            base_url: None,
            pass_type_identifier: default_pass_type_identifier(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl PassSettings {
    /// The base URL requests are sent to, without a trailing slash.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.mode.base_url())
            .trim_end_matches('/')
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Visit Settings
// =============================================================================

/// Visit registration tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitSettings {
    /// Re-reads allowed after a concurrent write beat ours.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// First pause before a re-read (milliseconds).
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,

    /// Longest pause before a re-read (milliseconds).
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_retry_initial_ms() -> u64 {
    20
}

fn default_retry_max_ms() -> u64 {
    250
}

impl Default for VisitSettings {
    fn default() -> Self {
        VisitSettings {
            max_conflict_retries: default_max_conflict_retries(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_max_ms: default_retry_max_ms(),
        }
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Scanner behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Window in which a repeat of the same code is ignored (milliseconds).
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_cooldown_ms() -> u64 {
    3000
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl ScannerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete loyalty configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub pass: PassSettings,

    #[serde(default)]
    pub visits: VisitSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,
}

impl LoyaltyConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (loyalty.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> LoyaltyResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading loyalty config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load loyalty config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> LoyaltyResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| LoyaltyError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LoyaltyError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| LoyaltyError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Loyalty config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LoyaltyResult<()> {
        let base = Url::parse(self.pass.effective_base_url())?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(LoyaltyError::InvalidConfig(format!(
                "Pass service URL must start with http:// or https://, got: {}",
                base
            )));
        }

        if self.store.collection.trim().is_empty() {
            return Err(LoyaltyError::InvalidConfig(
                "collection must not be empty".into(),
            ));
        }

        if self.store.max_connections == 0 {
            return Err(LoyaltyError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.pass.pass_type_identifier.trim().is_empty() {
            return Err(LoyaltyError::InvalidConfig(
                "pass_type_identifier must not be empty".into(),
            ));
        }

        if self.pass.request_timeout_secs == 0 {
            return Err(LoyaltyError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `LEU_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(mode) = lookup("LEU_DEPLOYMENT_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding deployment mode from environment");
                    self.pass.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown deployment mode in environment"),
            }
        }

        if let Some(url) = lookup("LEU_PASS_BASE_URL") {
            debug!(url = %url, "Overriding pass service URL from environment");
            self.pass.base_url = Some(url);
        }

        if let Some(id) = lookup("LEU_PASS_TYPE_ID") {
            self.pass.pass_type_identifier = id;
        }

        if let Some(path) = lookup("LEU_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Some(collection) = lookup("LEU_COLLECTION") {
            self.store.collection = collection;
        }

        if let Some(timeout) = lookup("LEU_REQUEST_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => {
                    debug!(secs, "Overriding request timeout from environment");
                    self.pass.request_timeout_secs = secs;
                }
                Err(_) => warn!(timeout = %timeout, "Invalid request timeout in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "leubeautylab", "loyalty")
            .map(|dirs| dirs.config_dir().join("loyalty.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pass service base URL in effect.
    pub fn pass_base_url(&self) -> &str {
        self.pass.effective_base_url()
    }

    /// Returns the deployment mode.
    pub fn mode(&self) -> DeploymentMode {
        self.pass.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "production".parse::<DeploymentMode>().unwrap(),
            DeploymentMode::Production
        );
        assert_eq!(
            "DEV".parse::<DeploymentMode>().unwrap(),
            DeploymentMode::Development
        );
        assert!("staging".parse::<DeploymentMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LoyaltyConfig::default();
        assert_eq!(config.mode(), DeploymentMode::Development);
        assert_eq!(config.pass_base_url(), "http://localhost:3001");
        assert_eq!(config.store.collection, "clientes");
        assert_eq!(config.visits.max_conflict_retries, 3);
        assert_eq!(config.scanner.cooldown(), Duration::from_millis(3000));
        assert!(config.validate().is_ok());
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LoyaltyConfig::default();
        config.apply_overrides(env(&[
            ("LEU_DEPLOYMENT_MODE", "production"),
            ("LEU_PASS_BASE_URL", "http://10.0.0.5:3001"),
            ("LEU_PASS_TYPE_ID", "pass.test"),
            ("LEU_DATABASE_PATH", "/tmp/leu.db"),
            ("LEU_COLLECTION", "clientes_qa"),
            ("LEU_REQUEST_TIMEOUT_SECS", " 30 "),
        ]));

        assert_eq!(config.mode(), DeploymentMode::Production);
        assert_eq!(config.pass_base_url(), "http://10.0.0.5:3001");
        assert_eq!(config.pass.pass_type_identifier, "pass.test");
        assert_eq!(config.store.database_path, PathBuf::from("/tmp/leu.db"));
        assert_eq!(config.store.collection, "clientes_qa");
        assert_eq!(config.pass.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_env_overrides_keep_current_values() {
        let mut config = LoyaltyConfig::default();
        config.apply_overrides(env(&[
            ("LEU_DEPLOYMENT_MODE", "staging"),
            ("LEU_REQUEST_TIMEOUT_SECS", "soon"),
        ]));

        assert_eq!(config.mode(), DeploymentMode::Development);
        assert_eq!(
            config.pass.request_timeout_secs,
            PassSettings::default().request_timeout_secs
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_selection() {
        let mut config = LoyaltyConfig::default();
        config.pass.mode = DeploymentMode::Production;
        assert_eq!(config.pass_base_url(), "https://api.leubeautylab.com");

        config.pass.base_url = Some("http://10.0.0.5:3001/".to_string());
        assert_eq!(config.pass_base_url(), "http://10.0.0.5:3001");
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoyaltyConfig::default();

        config.pass.base_url = Some("not a url".to_string());
        assert!(config.validate().unwrap_err().is_config_error());

        config.pass.base_url = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        config.pass.base_url = None;
        config.store.collection = " ".to_string();
        assert!(config.validate().is_err());

        config.store.collection = "clientes".to_string();
        config.pass.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: LoyaltyConfig = toml::from_str(
            r#"
            [pass]
            mode = "production"

            [scanner]
            cooldown_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.mode(), DeploymentMode::Production);
        assert_eq!(config.scanner.cooldown_ms, 500);
        assert_eq!(config.visits.max_conflict_retries, 3);
        assert_eq!(config.pass.pass_type_identifier, "pass.com.salondenails.loyalty");
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "leu-loyalty-test-{}.toml",
            std::process::id()
        ));

        let mut config = LoyaltyConfig::default();
        config.scanner.cooldown_ms = 1234;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[scanner]"));

        let loaded: LoyaltyConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.scanner.cooldown_ms, 1234);

        std::fs::remove_file(&path).unwrap();
    }
}
