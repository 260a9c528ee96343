//! Configuration for the VEON memory system.
//!
//! Maps directly to `veon.toml`. Every section and field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [memory]
//! floor = 0.1
//! context_limit = 5
//! display_limit = 20
//!
//! [persistence]
//! path = "veon.db"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VeonError};
use crate::importance::DEFAULT_IMPORTANCE_MULTIPLIER;

/// Top-level VEON configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VeonConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Retention, retrieval and pruning behaviour.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// SQLite store settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl VeonConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `VeonError::Config` if the TOML is invalid or a value is out of
    /// range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| VeonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `VeonError::Config` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.memory.validate()
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level or `EnvFilter` directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Retention, retrieval and pruning behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Strength threshold: above is live, below is prunable.
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Confidence → importance multiplier.
    #[serde(default = "default_importance_multiplier")]
    pub importance_multiplier: f64,
    /// Records rendered into the generation context.
    #[serde(default = "default_5_usize")]
    pub context_limit: usize,
    /// Records returned for display.
    #[serde(default = "default_20_usize")]
    pub display_limit: usize,
    /// Attempts per record when a conditional write conflicts.
    #[serde(default = "default_3")]
    pub max_update_retries: u32,
    /// Run the pruning sweeper right after every global decay pass.
    #[serde(default)]
    pub prune_after_decay: bool,
    /// Longest accepted utterance, in characters.
    #[serde(default = "default_4000")]
    pub max_content_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            floor: 0.1,
            importance_multiplier: DEFAULT_IMPORTANCE_MULTIPLIER,
            context_limit: 5,
            display_limit: 20,
            max_update_retries: 3,
            prune_after_decay: false,
            max_content_chars: 4000,
        }
    }
}

impl MemoryConfig {
    /// Check the retention settings.
    ///
    /// # Errors
    /// Returns `VeonError::Config` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.floor) {
            return Err(VeonError::Config(format!(
                "memory.floor must be in [0, 1), got {}",
                self.floor
            )));
        }
        if !self.importance_multiplier.is_finite() || self.importance_multiplier < 0.0 {
            return Err(VeonError::Config(format!(
                "memory.importance_multiplier must be a non-negative number, got {}",
                self.importance_multiplier
            )));
        }
        if self.max_update_retries == 0 {
            return Err(VeonError::Config(
                "memory.max_update_retries must be at least 1".into(),
            ));
        }
        if self.max_content_chars == 0 {
            return Err(VeonError::Config(
                "memory.max_content_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// How long SQLite waits on a locked database before failing (ms).
    #[serde(default = "default_5000")]
    pub busy_timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> PathBuf { PathBuf::from("veon.db") }
fn default_floor() -> f64 { 0.1 }
fn default_importance_multiplier() -> f64 { DEFAULT_IMPORTANCE_MULTIPLIER }
fn default_3() -> u32 { 3 }
fn default_5_usize() -> usize { 5 }
fn default_20_usize() -> usize { 20 }
fn default_4000() -> usize { 4000 }
fn default_5000() -> u64 { 5000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = VeonConfig::from_toml("").expect("parse");
        assert!((config.memory.floor - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.memory.context_limit, 5);
        assert_eq!(config.memory.display_limit, 20);
        assert!(config.persistence.wal_mode);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = VeonConfig::from_toml(
            r#"
            [memory]
            display_limit = 50
            prune_after_decay = true

            [persistence]
            path = "/tmp/veon-test.db"
            "#,
        )
        .expect("parse");
        assert_eq!(config.memory.display_limit, 50);
        assert!(config.memory.prune_after_decay);
        assert_eq!(config.memory.context_limit, 5);
        assert_eq!(config.persistence.path, PathBuf::from("/tmp/veon-test.db"));
    }

    #[test]
    fn rejects_out_of_range_floor() {
        let err = VeonConfig::from_toml("[memory]\nfloor = 1.5\n").expect_err("invalid");
        assert!(matches!(err, VeonError::Config(_)));
    }

    #[test]
    fn rejects_zero_retries() {
        assert!(VeonConfig::from_toml("[memory]\nmax_update_retries = 0\n").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            VeonConfig::from_toml("[memory\nfloor ="),
            Err(VeonError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("veon.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").expect("write");
        let config = VeonConfig::from_file(&path).expect("load");
        assert_eq!(config.general.log_level, "debug");
    }
}
