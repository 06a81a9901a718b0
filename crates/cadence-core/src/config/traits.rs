//! Core configuration traits

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

use super::validation::{into_config_error, ValidationResult};
use crate::CadenceError;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CADENCE_";

/// Core trait for Cadence configuration types
pub trait CadenceConfig: Clone + Default + DeserializeOwned + Send + Sync + 'static {
    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> Result<Self, CadenceError> {
        debug!(path = %path.display(), "reading configuration file");
        let content = std::fs::read_to_string(path).map_err(|e| {
            CadenceError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| CadenceError::config(format!("Invalid TOML in {}: {e}", path.display())))
    }

    /// Apply a `section.key = value` override (as found in the environment)
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), CadenceError>;

    /// Merge `CADENCE_SECTION_KEY` environment variables
    fn merge_with_env(&mut self) -> Result<(), CadenceError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge overrides from an explicit variable list
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), CadenceError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase();
                debug!(key = %config_key, "applying configuration override");
                self.set_from_string(&config_key, &value)?;
            }
        }
        Ok(())
    }

    /// Validate the configuration
    fn validate(&self) -> ValidationResult;

    /// Load, apply environment overrides and validate in one step
    fn load(path: Option<&Path>) -> Result<Self, CadenceError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            _ => Self::default(),
        };
        config.merge_with_env()?;
        config.validate().map_err(into_config_error)?;
        Ok(config)
    }
}

/// Parse a configuration override value, naming the key on failure
pub fn parse_value<T>(key: &str, value: &str) -> Result<T, CadenceError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| CadenceError::config(format!("Invalid value '{value}' for {key}: {e}")))
}
