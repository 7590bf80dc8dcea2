//! Configuration system
//!
//! Serializable configuration for the mixer core. Files are read and written
//! as TOML or RON depending on their extension.

use std::path::Path;
use std::time::Duration;

pub use serde::{Deserialize, Serialize};

use crate::audio::state::TogglePolicy;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is out of its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// # Mixer Configuration
///
/// Tunables for the sound mixer core: toggle behaviour, dynamic modulation
/// timing and persistence batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Key under which the mixer snapshot is stored
    pub store_name: String,
    /// What `toggle` does to an already active sound
    pub toggle_policy: TogglePolicy,
    /// Minimum volume a sound is raised to when toggled on
    pub toggle_floor: u8,
    /// Period of the dynamic modulator in milliseconds
    pub modulation_interval_ms: u64,
    /// Relative perturbation depth of the dynamic modulator (0.1 = ±10%)
    pub modulation_depth: f64,
    /// Window in which successive snapshots are coalesced into one write
    pub persist_debounce_ms: u64,
}

impl MixerConfig {
    /// Default snapshot key
    pub const DEFAULT_STORE_NAME: &'static str = "SoundStore";

    /// Modulator period as a `Duration`
    pub const fn modulation_interval(&self) -> Duration {
        Duration::from_millis(self.modulation_interval_ms)
    }

    /// Persistence debounce window as a `Duration`
    pub const fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    /// Set the toggle policy
    pub const fn with_toggle_policy(mut self, policy: TogglePolicy) -> Self {
        self.toggle_policy = policy;
        self
    }

    /// Set the modulator period
    pub const fn with_modulation_interval(mut self, interval: Duration) -> Self {
        self.modulation_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the persistence debounce window
    pub const fn with_persist_debounce(mut self, window: Duration) -> Self {
        self.persist_debounce_ms = window.as_millis() as u64;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.toggle_floor == 0 || self.toggle_floor > 100 {
            return Err(ConfigError::Invalid {
                field: "toggle_floor",
                reason: format!("{} is outside 1..=100", self.toggle_floor),
            });
        }
        if self.modulation_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "modulation_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.modulation_depth) {
            return Err(ConfigError::Invalid {
                field: "modulation_depth",
                reason: format!("{} is outside 0.0..=1.0", self.modulation_depth),
            });
        }
        Ok(())
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            store_name: Self::DEFAULT_STORE_NAME.to_string(),
            toggle_policy: TogglePolicy::ActivateOnly,
            toggle_floor: 10,
            modulation_interval_ms: 5_000,
            modulation_depth: 0.1,
            persist_debounce_ms: 250,
        }
    }
}

impl Config for MixerConfig {}
