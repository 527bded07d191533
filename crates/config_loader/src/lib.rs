//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Build `NodeConfig` from environment variables (primary source)
//! - Parse TOML/JSON configuration files (alternative source)
//! - Apply fallbacks and validate configuration legality
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("seller.toml")).unwrap();
//! println!("Seller: {}", config.seller.seller_id);
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::NodeConfig;
pub use env::parse_bool;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from the environment,
/// files or strings. Every entry point returns a validated config with
/// defaults applied.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    /// - Missing required variable
    /// - Unparseable latitude / longitude
    /// - Validation failure
    pub fn from_env() -> Result<NodeConfig, ContractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<NodeConfig, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = env::from_lookup(lookup)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<NodeConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<NodeConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-built configuration
    pub fn validate(config: &NodeConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize NodeConfig to TOML string
    pub fn to_toml(config: &NodeConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize NodeConfig to JSON string
    pub fn to_json(config: &NodeConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<NodeConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
