//! # Ambient Engine
//!
//! State engine for an ambient sound mixer: a fixed catalog of looping
//! sounds, each with an on/off flag and a volume, plus a global pause, a
//! random mix and a "dynamic" mode that gently drifts volumes over time.
//!
//! ## Features
//!
//! - **Serialized mutations**: UI calls and timer ticks go through one dispatch
//! - **Change sets**: every mutation reports exactly which sounds changed
//! - **Debounced persistence**: state survives restarts without blocking callers
//! - **Pluggable playback**: a logging player by default, Rodio behind a feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ambient_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mixer = SoundMixer::builder(SoundCatalog::builtin())
//!         .with_storage(std::sync::Arc::new(FileStorage::new("data")))
//!         .build()?;
//!     mixer.hydrate();
//!
//!     mixer.toggle("rain");
//!     mixer.set_volume("rain", 55);
//!     mixer.toggle_dynamic_mode();
//!
//!     mixer.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod audio;
pub mod config;
pub mod events;
pub mod foundation;
pub mod persistence;
pub mod settings;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{
            AudioError, AudioPlayer, Hydration, LogPlayer, MixerAction, MixerError, MixerState,
            SoundCatalog, SoundCategory, SoundMixer, SoundState, TogglePolicy,
        },
        config::{Config, ConfigError, MixerConfig},
        events::{ChangeCause, ChangeSet, MixerListener, SoundChange},
        persistence::{FileStorage, MemoryStorage, Storage, StorageError},
        settings::{Choice, Settings, SettingsStore},
    };
}
