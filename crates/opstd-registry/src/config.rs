//! # Contract Configuration
//!
//! Genesis settings for a registry deployment: the owner identity, an
//! optional initial manager set, the reported contract version and the
//! existence/authorization check order.
//!
//! ```yaml
//! owner: ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM
//! managers:
//!   - ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG
//! contract_version: 100
//! check_order: existence_first
//! ```
//!
//! Files ending in `.json` are parsed as JSON, everything else as YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use opstd_core::Principal;

use crate::contract::{CheckOrder, DEFAULT_CONTRACT_VERSION};

/// Errors loading a [`ContractConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing failed.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Genesis configuration of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// The single owner identity.
    pub owner: Principal,
    /// Managers authorized from genesis.
    #[serde(default)]
    pub managers: Vec<Principal>,
    /// Version the contract reports.
    #[serde(default = "default_contract_version")]
    pub contract_version: u32,
    /// Existence/authorization check order.
    #[serde(default)]
    pub check_order: CheckOrder,
}

fn default_contract_version() -> u32 {
    DEFAULT_CONTRACT_VERSION
}

impl ContractConfig {
    /// Defaults for everything except the owner.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            managers: Vec::new(),
            contract_version: DEFAULT_CONTRACT_VERSION,
            check_order: CheckOrder::default(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        tracing::debug!(
            path = %path.display(),
            owner = %config.owner,
            managers = config.managers.len(),
            contract_version = config.contract_version,
            "loaded contract config"
        );
        Ok(config)
    }

    /// Reject configurations that cannot describe a deployment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_version == 0 {
            return Err(ConfigError::Invalid(
                "contract_version must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    #[test]
    fn minimal_yaml_uses_defaults() {
        let config = ContractConfig::from_yaml_str(&format!("owner: {OWNER}\n")).unwrap();
        assert_eq!(config.owner.as_str(), OWNER);
        assert!(config.managers.is_empty());
        assert_eq!(config.contract_version, 100);
        assert_eq!(config.check_order, CheckOrder::ExistenceFirst);
    }

    #[test]
    fn full_yaml() {
        let yaml = format!(
            "owner: {OWNER}\nmanagers:\n  - mgr-a\n  - mgr-b\ncontract_version: 101\ncheck_order: authorization_first\n"
        );
        let config = ContractConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.managers.len(), 2);
        assert_eq!(config.contract_version, 101);
        assert_eq!(config.check_order, CheckOrder::AuthorizationFirst);
    }

    #[test]
    fn unknown_fields_rejected() {
        let yaml = format!("owner: {OWNER}\nfee_schedule: 10\n");
        assert!(matches!(
            ContractConfig::from_yaml_str(&yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn blank_owner_rejected() {
        assert!(ContractConfig::from_yaml_str("owner: \"  \"\n").is_err());
        assert!(ContractConfig::from_json_str(r#"{"owner": ""}"#).is_err());
    }

    #[test]
    fn zero_version_rejected() {
        let json = format!(r#"{{"owner": "{OWNER}", "contract_version": 0}}"#);
        assert!(matches!(
            ContractConfig::from_json_str(&json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn loads_json_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"owner": "{OWNER}", "managers": ["mgr"]}}"#).unwrap();
        let config = ContractConfig::from_path(file.path()).unwrap();
        assert_eq!(config.managers[0].as_str(), "mgr");
    }

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "owner: {OWNER}").unwrap();
        let config = ContractConfig::from_path(file.path()).unwrap();
        assert_eq!(config, ContractConfig::new(Principal::new(OWNER).unwrap()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContractConfig::from_path(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
