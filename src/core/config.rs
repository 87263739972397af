//! Inspector configuration
//!
//! Loaded from YAML, e.g.:
//!
//! ```yaml
//! remote: origin
//! base_branch: main
//! diff_byte_limit: 65536
//! max_ancestors: 1000
//! git_metadata:
//!   collect: selected
//!   fields: [commit, branch, dirty]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::settings::GitMetadataSettings;
use crate::util::DEFAULT_BYTE_LIMIT;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Configuration for a [`RepoInspector`](crate::git::RepoInspector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorConfig {
    /// Remote whose branches are used to find the base-branch ancestor
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Base branch override; detected from the remote HEAD when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    /// Maximum encoded size of the attached working-tree diff
    #[serde(default = "default_diff_byte_limit")]
    pub diff_byte_limit: usize,
    /// Number of ancestors walked by `default_ancestors`
    #[serde(default = "default_max_ancestors")]
    pub max_ancestors: usize,
    /// Which metadata fields to collect
    #[serde(default)]
    pub git_metadata: GitMetadataSettings,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_diff_byte_limit() -> usize {
    DEFAULT_BYTE_LIMIT
}

fn default_max_ancestors() -> usize {
    1000
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            base_branch: None,
            diff_byte_limit: default_diff_byte_limit(),
            max_ancestors: default_max_ancestors(),
            git_metadata: GitMetadataSettings::default(),
        }
    }
}

impl InspectorConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: InspectorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "remote must not be empty".to_string(),
            ));
        }

        if let Some(ref base) = self.base_branch {
            if base.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "base_branch must not be empty when set".to_string(),
                ));
            }
        }

        if self.diff_byte_limit == 0 {
            return Err(ConfigError::ValidationError(
                "diff_byte_limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
