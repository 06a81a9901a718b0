//! Shared helpers for command handlers

use anyhow::{Context, Result};
use cadence_choreography::{ChoreographyConfig, Diagnostic};
use cadence_core::config::CadenceConfig;
use cadence_core::ChoreographySequenceRecord;
use std::path::Path;
use tracing::debug;

/// Load the engine configuration, falling back to defaults when the file is absent
pub fn load_config(path: &Path) -> Result<ChoreographyConfig> {
    debug!(path = %path.display(), "loading configuration");
    ChoreographyConfig::load(Some(path))
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Read a JSON sequence file in upload form
pub async fn read_sequence(path: &Path) -> Result<ChoreographySequenceRecord> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a valid sequence", path.display()))
}

/// Strictness chosen on the command line, or the configured default
pub fn non_strict(strict: bool, lenient: bool, config: &ChoreographyConfig) -> bool {
    if strict {
        false
    } else {
        lenient || config.validation.non_strict_by_default
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("  error: {diagnostic}");
    }
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("  warning: {warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_demo_sequence() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/scenario.json");
        let record = read_sequence(&path).await.unwrap();
        assert_eq!(record.name, "scenario");
        assert_eq!(record.moves.len(), 3);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ChoreographyConfig::default());
    }

    #[test]
    fn strict_flag_wins() {
        let mut config = ChoreographyConfig::default();
        config.validation.non_strict_by_default = true;
        assert!(!non_strict(true, true, &config));
        assert!(non_strict(false, false, &config));
        assert!(!non_strict(false, false, &ChoreographyConfig::default()));
    }
}
