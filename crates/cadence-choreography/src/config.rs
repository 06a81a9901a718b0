//! Engine configuration
//!
//! Loaded from `.cadence/config.toml` (when present) and overridden by
//! `CADENCE_<SECTION>_<KEY>` environment variables:
//!
//! ```toml
//! [validation]
//! non_strict_by_default = false
//! continuity_across_gaps = false
//!
//! [scheduler]
//! max_tick_ms = 50
//! report_history = 16
//! lease_check = "every_tick"
//!
//! [catalog]
//! path = "moves.toml"
//! move_params_config_path = "move_params.json"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use cadence_core::config::{parse_value, CadenceConfig, ConfigValidator, ValidationResult};
use cadence_core::{CadenceError, CadenceResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::MoveCatalog;
use crate::scheduler::{LeaseCheckPolicy, SchedulerConfig};
use crate::validation::ValidationOptions;

/// Default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".cadence/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    pub validation: ValidationSection,
    pub scheduler: SchedulerSection,
    pub catalog: CatalogSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    /// Strictness applied when a caller does not choose one
    pub non_strict_by_default: bool,
    pub continuity_across_gaps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Cap on the sleep between dispatch ticks, in milliseconds
    pub max_tick_ms: Option<u64>,
    pub report_history: usize,
    pub lease_check: LeaseCheckPolicy,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            max_tick_ms: None,
            report_history: defaults.report_history,
            lease_check: defaults.lease_check,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// TOML catalog file; the builtin catalog is used when unset
    pub path: Option<PathBuf>,
    /// File whose raw text is returned by `ListAllMoves`
    pub move_params_config_path: Option<PathBuf>,
}

impl ChoreographyConfig {
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            continuity_across_gaps: self.validation.continuity_across_gaps,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_tick_interval: self.scheduler.max_tick_ms.map(Duration::from_millis),
            report_history: self.scheduler.report_history,
            lease_check: self.scheduler.lease_check,
        }
    }

    /// Load the configured catalog, or the builtin one
    pub fn load_catalog(&self) -> CadenceResult<MoveCatalog> {
        let catalog = match &self.catalog.path {
            Some(path) => MoveCatalog::load(path)?,
            None => MoveCatalog::builtin()?,
        };
        match &self.catalog.move_params_config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    CadenceError::config(format!(
                        "Failed to read move parameter config {}: {e}",
                        path.display()
                    ))
                })?;
                debug!(path = %path.display(), bytes = raw.len(), "loaded move parameter config");
                Ok(catalog.with_move_params_config(raw))
            }
            None => Ok(catalog),
        }
    }
}

impl CadenceConfig for ChoreographyConfig {
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), CadenceError> {
        match key {
            "validation_non_strict_by_default" => {
                self.validation.non_strict_by_default = parse_value(key, value)?;
            }
            "validation_continuity_across_gaps" => {
                self.validation.continuity_across_gaps = parse_value(key, value)?;
            }
            "scheduler_max_tick_ms" => {
                self.scheduler.max_tick_ms = if value.is_empty() {
                    None
                } else {
                    Some(parse_value(key, value)?)
                };
            }
            "scheduler_report_history" => {
                self.scheduler.report_history = parse_value(key, value)?;
            }
            "scheduler_lease_check" => {
                self.scheduler.lease_check = match value {
                    "every_tick" => LeaseCheckPolicy::EveryTick,
                    "on_revocation" => LeaseCheckPolicy::OnRevocation,
                    other => {
                        return Err(CadenceError::config(format!(
                            "Invalid value '{other}' for {key}: expected every_tick or on_revocation"
                        )))
                    }
                };
            }
            "catalog_path" => self.catalog.path = Some(PathBuf::from(value)),
            "catalog_move_params_config_path" => {
                self.catalog.move_params_config_path = Some(PathBuf::from(value));
            }
            // Unrelated CADENCE_* variables (log level, etc.) are not ours.
            _ => {}
        }
        Ok(())
    }

    fn validate(&self) -> ValidationResult {
        let mut validator = ConfigValidator::new();

        let mut scheduler = validator.for_field("scheduler");
        if let Some(max_tick_ms) = self.scheduler.max_tick_ms {
            scheduler.range("max_tick_ms", max_tick_ms as f64, Some(1.0), Some(60_000.0));
        }
        scheduler.range(
            "report_history",
            self.scheduler.report_history as f64,
            Some(1.0),
            Some(10_000.0),
        );
        validator.merge(scheduler);

        let mut catalog = validator.for_field("catalog");
        for (field, path) in [
            ("path", &self.catalog.path),
            ("move_params_config_path", &self.catalog.move_params_config_path),
        ] {
            if let Some(path) = path {
                catalog.custom(field, path, |p| p.is_file(), "file does not exist");
            }
        }
        validator.merge(catalog);

        validator.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ChoreographyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler_config(), SchedulerConfig::default());
        assert_eq!(config.load_catalog().unwrap().len(), 21);
    }

    #[test]
    fn loads_file_and_applies_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[validation]\ncontinuity_across_gaps = true\n\n[scheduler]\nmax_tick_ms = 20\n"
        )
        .unwrap();

        let mut config = ChoreographyConfig::load_from_file(&path).unwrap();
        config
            .merge_with_vars([
                ("CADENCE_SCHEDULER_MAX_TICK_MS".to_string(), "5".to_string()),
                ("CADENCE_SCHEDULER_LEASE_CHECK".to_string(), "on_revocation".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();

        assert!(config.validation_options().continuity_across_gaps);
        assert_eq!(
            config.scheduler_config().max_tick_interval,
            Some(Duration::from_millis(5))
        );
        assert_eq!(config.scheduler.lease_check, LeaseCheckPolicy::OnRevocation);
    }

    #[test]
    fn invalid_values_are_all_reported() {
        let mut config = ChoreographyConfig::default();
        config.scheduler.max_tick_ms = Some(0);
        config.scheduler.report_history = 0;
        config.catalog.path = Some(PathBuf::from("/nonexistent/moves.toml"));

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(config
            .clone()
            .set_from_string("scheduler_report_history", "lots")
            .is_err());
    }

    #[test]
    fn raw_move_params_config_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "{ \"opaque\": true }").unwrap();

        let mut config = ChoreographyConfig::default();
        config.catalog.move_params_config_path = Some(path);
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.move_params_config(), "{ \"opaque\": true }");
    }
}
