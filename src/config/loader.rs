//! Configuration file loader
//! Reads a `LedgerConfig` from TOML or YAML, falling back to defaults for missing fields.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::LedgerConfig;
use crate::error::LedgerError;

impl LedgerConfig {
    /// Load configuration from a `.toml`, `.yml` or `.yaml` file
    pub fn from_file(path: &Path) -> Result<Self, LedgerError> {
        info!("Loading ledger configuration from: {:?}", path);

        if !path.exists() {
            return Err(LedgerError::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {:?}: {}", path, e))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: LedgerConfig = match extension.as_str() {
            "toml" => parse_toml(&contents),
            "yml" | "yaml" => parse_yaml(&contents),
            other => Err(format!("unsupported configuration format '{}'", other)),
        }
        .map_err(|e| LedgerError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would produce unlabeled blocks
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.chain_name.trim().is_empty() {
            return Err(LedgerError::Config("chain_name must not be empty".to_string()));
        }
        if self.signing_authority.trim().is_empty() {
            return Err(LedgerError::Config(
                "signing_authority must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_toml<T: for<'de> Deserialize<'de>>(contents: &str) -> Result<T, String> {
    toml::from_str(contents).map_err(|e| e.to_string())
}

fn parse_yaml<T: for<'de> Deserialize<'de>>(contents: &str) -> Result<T, String> {
    serde_yaml::from_str(contents).map_err(|e| e.to_string())
}
