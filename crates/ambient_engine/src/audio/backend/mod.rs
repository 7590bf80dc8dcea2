//! Audio player implementations
//!
//! The mixer never decodes or plays audio itself. It forwards per-sound
//! commands to an [`AudioPlayer`], which owns one playback handle per sound
//! id and is free to load, loop and release sources as it sees fit.

#[cfg(feature = "rodio")]
pub mod rodio_backend;

use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::AudioError;

/// One command for the audio player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Start (or resume) playback of a sound's source
    Play {
        /// Sound id
        sound_id: String,
        /// Source reference from the catalog
        source_url: String,
        /// Loop the source forever
        looping: bool,
    },
    /// Set playback volume in percent (0-100)
    SetVolume {
        /// Sound id
        sound_id: String,
        /// Volume percent
        percent: u8,
    },
    /// Pause playback, keeping the handle
    Pause {
        /// Sound id
        sound_id: String,
    },
    /// Stop playback and release the handle
    Unload {
        /// Sound id
        sound_id: String,
    },
}

impl PlayerCommand {
    /// Sound the command targets
    pub fn sound_id(&self) -> &str {
        match self {
            Self::Play { sound_id, .. }
            | Self::SetVolume { sound_id, .. }
            | Self::Pause { sound_id }
            | Self::Unload { sound_id } => sound_id,
        }
    }
}

/// Playback collaborator driven by the mixer
///
/// Methods are called with the mixer locked and should return quickly;
/// slow work belongs on the player's own thread.
pub trait AudioPlayer: Send {
    /// Start or resume playback of `source_url` for `sound_id`
    fn play(&mut self, sound_id: &str, source_url: &str, looping: bool) -> Result<(), AudioError>;

    /// Set playback volume in percent
    fn set_volume(&mut self, sound_id: &str, percent: u8) -> Result<(), AudioError>;

    /// Pause playback
    fn pause(&mut self, sound_id: &str) -> Result<(), AudioError>;

    /// Stop playback and free the handle
    fn unload(&mut self, sound_id: &str) -> Result<(), AudioError>;

    /// Dispatch a command to the matching method
    fn execute(&mut self, command: &PlayerCommand) -> Result<(), AudioError> {
        match command {
            PlayerCommand::Play {
                sound_id,
                source_url,
                looping,
            } => self.play(sound_id, source_url, *looping),
            PlayerCommand::SetVolume { sound_id, percent } => self.set_volume(sound_id, *percent),
            PlayerCommand::Pause { sound_id } => self.pause(sound_id),
            PlayerCommand::Unload { sound_id } => self.unload(sound_id),
        }
    }
}

impl<P: AudioPlayer + ?Sized> AudioPlayer for Box<P> {
    fn play(&mut self, sound_id: &str, source_url: &str, looping: bool) -> Result<(), AudioError> {
        (**self).play(sound_id, source_url, looping)
    }

    fn set_volume(&mut self, sound_id: &str, percent: u8) -> Result<(), AudioError> {
        (**self).set_volume(sound_id, percent)
    }

    fn pause(&mut self, sound_id: &str) -> Result<(), AudioError> {
        (**self).pause(sound_id)
    }

    fn unload(&mut self, sound_id: &str) -> Result<(), AudioError> {
        (**self).unload(sound_id)
    }
}

/// Player that only logs what it is asked to do
#[derive(Debug, Default)]
pub struct LogPlayer;

impl AudioPlayer for LogPlayer {
    fn play(&mut self, sound_id: &str, source_url: &str, looping: bool) -> Result<(), AudioError> {
        log::info!("play {sound_id} from {source_url} (loop: {looping})");
        Ok(())
    }

    fn set_volume(&mut self, sound_id: &str, percent: u8) -> Result<(), AudioError> {
        log::info!("volume {sound_id} -> {percent}%");
        Ok(())
    }

    fn pause(&mut self, sound_id: &str) -> Result<(), AudioError> {
        log::info!("pause {sound_id}");
        Ok(())
    }

    fn unload(&mut self, sound_id: &str) -> Result<(), AudioError> {
        log::info!("unload {sound_id}");
        Ok(())
    }
}

/// Player that records every command; clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    commands: Arc<Mutex<Vec<PlayerCommand>>>,
}

impl RecordingPlayer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain and return the commands received so far
    pub fn take(&self) -> Vec<PlayerCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, command: PlayerCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl AudioPlayer for RecordingPlayer {
    fn play(&mut self, sound_id: &str, source_url: &str, looping: bool) -> Result<(), AudioError> {
        self.record(PlayerCommand::Play {
            sound_id: sound_id.to_string(),
            source_url: source_url.to_string(),
            looping,
        });
        Ok(())
    }

    fn set_volume(&mut self, sound_id: &str, percent: u8) -> Result<(), AudioError> {
        self.record(PlayerCommand::SetVolume {
            sound_id: sound_id.to_string(),
            percent,
        });
        Ok(())
    }

    fn pause(&mut self, sound_id: &str) -> Result<(), AudioError> {
        self.record(PlayerCommand::Pause {
            sound_id: sound_id.to_string(),
        });
        Ok(())
    }

    fn unload(&mut self, sound_id: &str) -> Result<(), AudioError> {
        self.record(PlayerCommand::Unload {
            sound_id: sound_id.to_string(),
        });
        Ok(())
    }
}
