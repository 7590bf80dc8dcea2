//! Ambient sound mixer
//!
//! Keeps track of which looping ambient sounds are playing and at what
//! volume, and drives an [`AudioPlayer`](backend::AudioPlayer) to match.
//!
//! - [`catalog`]: the fixed set of sounds
//! - [`state`]: pure mixer state and its transitions
//! - [`mixer`]: the shared, thread-safe [`SoundMixer`] handle
//! - [`modulator`]: the dynamic-mode timer
//! - [`forward`]: translation of changes into player commands
//! - [`backend`]: player implementations

pub mod backend;
pub mod catalog;
pub mod forward;
pub mod mixer;
pub mod modulator;
pub mod random;
pub mod state;

#[cfg(test)]
mod tests;

pub use backend::{AudioPlayer, LogPlayer, PlayerCommand, RecordingPlayer};
pub use catalog::{SoundCatalog, SoundCategory, SoundId};
pub use mixer::{Hydration, MixerError, SoundMixer, SoundMixerBuilder};
pub use random::{RandomSource, SequenceRandom, StdRandom};
pub use state::{MixerAction, MixerState, SoundState, TogglePolicy, MAX_VOLUME};

use thiserror::Error;

/// Audio playback errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Output device could not be opened
    #[error("Audio backend not initialized: {0}")]
    BackendNotInitialized(String),

    /// Player thread is gone or could not start
    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Source reference the player cannot open
    #[error("Unsupported audio source: {0}")]
    UnsupportedSource(String),

    /// Loading or decoding a source failed
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}
