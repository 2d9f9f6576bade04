use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::path_compiler::QueryCacheConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Route compiler configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Render property values as `$var` placeholders. Only parameterized
    /// statements are cached.
    pub use_params: bool,

    /// Append `;` to every statement
    pub terminate: bool,

    #[validate(nested)]
    pub cache: QueryCacheConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            use_params: true,
            terminate: false,
            cache: QueryCacheConfig::default(),
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            use_params: parse_env_var("PATHCYPHER_USE_PARAMS", "true")?,
            terminate: parse_env_var("PATHCYPHER_TERMINATE", "false")?,
            cache: QueryCacheConfig {
                enabled: parse_env_var("PATHCYPHER_QUERY_CACHE_ENABLED", "true")?,
                max_entries: parse_env_var("PATHCYPHER_QUERY_CACHE_MAX_ENTRIES", "1000")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
