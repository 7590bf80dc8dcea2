//! Stored layout of the mixer state
//!
//! ```text
//! { "sounds": { "<id>": { "isPlaying": bool, "volume": number,
//!                         "wasPlayingBeforePause": bool } },
//!   "allPaused": bool, "isDynamicMode": bool }
//! ```
//!
//! `wasPlayingBeforePause` is only written while it is true.
//!
//! Missing fields decode to their defaults so snapshots written by older
//! builds still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::audio::catalog::SoundId;
use crate::audio::state::{MixerState, MAX_VOLUME};

/// Persisted state of one sound
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSound {
    /// Whether the sound was audible
    pub is_playing: bool,
    /// Nominal volume; older builds may have stored fractions
    pub volume: f64,
    /// Pause marker, only written while a global pause is in effect
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub was_playing_before_pause: bool,
}

impl StoredSound {
    /// Stored volume rounded and clamped to 0-100
    pub fn volume_percent(&self) -> u8 {
        if self.volume.is_nan() {
            return 0;
        }
        self.volume.round().clamp(0.0, f64::from(MAX_VOLUME)) as u8
    }
}

/// Persisted mixer state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixerSnapshot {
    /// Per-sound state keyed by sound id
    pub sounds: BTreeMap<SoundId, StoredSound>,
    /// Global pause flag
    pub all_paused: bool,
    /// Dynamic-mode flag
    pub is_dynamic_mode: bool,
}

impl MixerSnapshot {
    /// Encode as JSON bytes
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from JSON bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<&MixerState> for MixerSnapshot {
    fn from(state: &MixerState) -> Self {
        let sounds = state
            .iter()
            .map(|(id, sound)| {
                let stored = StoredSound {
                    is_playing: sound.active,
                    volume: f64::from(sound.volume),
                    was_playing_before_pause: sound.was_active_before_pause,
                };
                (id.to_owned(), stored)
            })
            .collect();

        Self {
            sounds,
            all_paused: state.all_paused(),
            is_dynamic_mode: state.dynamic_mode_enabled(),
        }
    }
}
