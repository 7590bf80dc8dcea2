//! Console app configuration

use std::path::PathBuf;

use ambient_engine::audio::{AudioError, MixerError, SoundCatalog, SoundCategory};
use ambient_engine::config::{Config, ConfigError, MixerConfig};
use serde::{Deserialize, Serialize};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "ambient.toml";

/// Top-level configuration for the `ambient` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding persisted state
    pub storage_dir: PathBuf,
    /// Replacement for the built-in sound catalog
    pub catalog: Option<Vec<SoundCategory>>,
    /// Mixer tunables
    pub mixer: MixerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data"),
            catalog: None,
            mixer: MixerConfig::default(),
        }
    }
}

impl Config for AppConfig {}

impl AppConfig {
    /// Catalog to build the mixer from
    pub fn catalog(&self) -> SoundCatalog {
        match &self.catalog {
            Some(categories) => SoundCatalog::new(categories.iter().cloned()),
            None => SoundCatalog::builtin(),
        }
    }
}

/// Errors that end the app
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Config file problem
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Mixer could not be built
    #[error(transparent)]
    Mixer(#[from] MixerError),

    /// Audio output could not be opened
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Console I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
