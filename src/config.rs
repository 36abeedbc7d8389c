pub mod loader;

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::LedgerError;

/// Settings for a single evidence chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub chain_name: String,
    pub signing_authority: String,
    pub collecting_officer: String,
    pub genesis: GenesisConfig,
}

/// Descriptive payload stored in block 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub description: String,
    pub case_id: String,
    pub agency: String,
    pub purpose: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_name: "SENTINEL-X_EVIDENCE_CHAIN".to_string(),
            signing_authority: "SENTINEL-X Digital Evidence System".to_string(),
            collecting_officer: "SENTINEL-X AI System".to_string(),
            genesis: GenesisConfig::default(),
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            description: "Genesis Block - SENTINEL-X Evidence Chain Initialization".to_string(),
            case_id: "GENESIS-2024-001".to_string(),
            agency: "National Cyber Security Coordinator".to_string(),
            purpose: "Initialize tamper-proof evidence ledger".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `EVIDENCE_*` environment variables, then validated.
    pub fn load() -> Result<Self, LedgerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for each `EVIDENCE_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LedgerError> {
        let defaults = Self::default();

        let chain_name = lookup("EVIDENCE_CHAIN_NAME").unwrap_or(defaults.chain_name);

        let signing_authority =
            lookup("EVIDENCE_SIGNING_AUTHORITY").unwrap_or(defaults.signing_authority);

        let collecting_officer =
            lookup("EVIDENCE_COLLECTING_OFFICER").unwrap_or(defaults.collecting_officer);

        let config = LedgerConfig {
            chain_name,
            signing_authority,
            collecting_officer,
            genesis: defaults.genesis,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_chain_name(mut self, chain_name: impl Into<String>) -> Self {
        self.chain_name = chain_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.chain_name, "SENTINEL-X_EVIDENCE_CHAIN");
        assert_eq!(config.genesis.case_id, "GENESIS-2024-001");
    }

    #[test]
    fn test_with_chain_name() {
        let config = LedgerConfig::default().with_chain_name("CYBER-CASES");
        assert_eq!(config.chain_name, "CYBER-CASES");
        assert_eq!(config.signing_authority, LedgerConfig::default().signing_authority);
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = LedgerConfig::from_lookup(lookup_in(&[
            ("EVIDENCE_CHAIN_NAME", "CYBER-CASES"),
            ("EVIDENCE_COLLECTING_OFFICER", "Inspector Rao"),
        ]))
        .unwrap();

        assert_eq!(config.chain_name, "CYBER-CASES");
        assert_eq!(config.collecting_officer, "Inspector Rao");
        assert_eq!(config.signing_authority, LedgerConfig::default().signing_authority);
    }

    #[test]
    fn test_lookup_rejects_empty_signing_authority() {
        let err = LedgerConfig::from_lookup(lookup_in(&[("EVIDENCE_SIGNING_AUTHORITY", "")]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_lookup_rejects_empty_chain_name() {
        let err = LedgerConfig::from_lookup(lookup_in(&[("EVIDENCE_CHAIN_NAME", "")])).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
