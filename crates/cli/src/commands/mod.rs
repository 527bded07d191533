//! Command implementations.

mod run;
mod validate;

pub use run::run_node;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use contracts::NodeConfig;

/// Load configuration from a file, or from the environment when no file is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<NodeConfig> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration file");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            info!("Loading configuration from environment");
            config_loader::ConfigLoader::from_env()
                .context("Failed to load config from environment")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SELLER_TOML: &str = r#"
[seller]
seller_id = "pi-1"
label = "Kitchen"
lat = 52.5
lon = 13.4

[sensor]
base_url = "http://127.0.0.1:8000"
"#;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SELLER_TOML.as_bytes()).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.seller.seller_id, "pi-1");
        assert!(!config.broadcast.enabled);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/seller.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
