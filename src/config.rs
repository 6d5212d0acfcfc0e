//! Configuration loaded from `coopflow.toml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! The `COOPFLOW_LOG` environment variable takes precedence over `log_filter`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::workflow::JoinResetPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "coopflow.toml";
pub const LOG_ENV_VAR: &str = "COOPFLOW_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoopflowConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or `coopflow=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// What a revision loop taken after the signing fork does to the join barrier.
    #[serde(default)]
    pub join_reset: JoinResetPolicy,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for CoopflowConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            join_reset: JoinResetPolicy::default(),
        }
    }
}

impl CoopflowConfig {
    /// Loads `path` if given, else `coopflow.toml` in the working directory
    /// when present, else the defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(filter) = std::env::var(LOG_ENV_VAR)
            && !filter.trim().is_empty()
        {
            config.log_filter = filter;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = CoopflowConfig::default();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.join_reset, JoinResetPolicy::ResetOnRevision);
    }

    #[test]
    fn deserialize_partial_toml() {
        let config: CoopflowConfig = toml::from_str(r#"join_reset = "preserve""#).unwrap();
        assert_eq!(config.join_reset, JoinResetPolicy::Preserve);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn unknown_policy_is_an_error() {
        assert!(toml::from_str::<CoopflowConfig>(r#"join_reset = "sometimes""#).is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_filter = \"coopflow=debug\"").unwrap();
        writeln!(file, "join_reset = \"reset_on_revision\"").unwrap();
        let config = CoopflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_filter, "coopflow=debug");
        assert_eq!(config.join_reset, JoinResetPolicy::ResetOnRevision);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(CoopflowConfig::load(Some(&missing)).is_err());
    }
}
