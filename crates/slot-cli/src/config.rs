//! Configuration for the `slot` CLI, read from TOML.
//!
//! ```toml
//! [store]
//! path = "events.json"
//!
//! [log]
//! level = "info"
//!
//! [ui]
//! default_duration_minutes = 30
//! duration_presets = [15, 30, 45, 60, 90, 120]
//! conflict_message = "This time slot conflicts with an existing event"
//! failure_message = "Failed to create event. Please try again."
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use slot_engine::error::{CONFLICT_MESSAGE, PERSISTENCE_FAILURE_MESSAGE};

/// File name looked up in the working directory.
const LOCAL_CONFIG: &str = "slot.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub store: StoreConfig,
    pub log: LogConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the event array.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("events.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub default_duration_minutes: i64,
    /// Suggested durations. Any positive duration is still accepted.
    pub duration_presets: Vec<i64>,
    pub conflict_message: String,
    pub failure_message: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 30,
            duration_presets: vec![15, 30, 45, 60, 90, 120],
            conflict_message: CONFLICT_MESSAGE.to_string(),
            failure_message: PERSISTENCE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl SlotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: SlotConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Use `explicit` if given, otherwise the first config file found, otherwise
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [
            Some(PathBuf::from(LOCAL_CONFIG)),
            dirs::config_dir().map(|p| p.join("slot").join("config.toml")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            bail!("store.path must not be empty");
        }
        if self.ui.default_duration_minutes <= 0 {
            bail!(
                "ui.default_duration_minutes must be > 0 (got {})",
                self.ui.default_duration_minutes
            );
        }
        if let Some(bad) = self.ui.duration_presets.iter().find(|&&m| m <= 0) {
            bail!("ui.duration_presets must all be > 0 (got {})", bad);
        }
        Ok(())
    }
}
