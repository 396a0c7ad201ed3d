//! Engine limits.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! max_call_depth: 32
//! step_budget: 50000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse the configuration YAML.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A limit was zero.
    #[error("'{0}' must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Resource limits applied to every execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Deepest allowed chain of nested prog executions
    pub max_call_depth: usize,
    /// Statements and loop iterations allowed per top-level execution
    pub step_budget: u64,
    /// Largest collection a prog may build
    pub max_collection_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            step_budget: 100_000,
            max_collection_size: 10_000,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = if yaml.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::ZeroLimit("max_call_depth"));
        }
        if self.step_budget == 0 {
            return Err(ConfigError::ZeroLimit("step_budget"));
        }
        if self.max_collection_size == 0 {
            return Err(ConfigError::ZeroLimit("max_collection_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("step_budget: 500\n").unwrap();
        assert_eq!(config.step_budget, 500);
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.max_collection_size, 10_000);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_rejects_unknown_and_zero_fields() {
        assert!(matches!(
            EngineConfig::from_yaml_str("max_depth: 3\n"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("max_call_depth: 0\n"),
            Err(ConfigError::ZeroLimit("max_call_depth"))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_call_depth: 8").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_call_depth, 8);

        let missing = EngineConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
