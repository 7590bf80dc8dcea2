//! Forwarding of mixer changes to the audio player
//!
//! Each changed sound yields at most one short command sequence, derived
//! from its before/after states:
//!
//! | transition                              | commands              |
//! |-----------------------------------------|-----------------------|
//! | inactive → active                       | `play`, `set_volume`  |
//! | active → inactive, by reset             | `unload`              |
//! | active → inactive, otherwise            | `pause`               |
//! | active → active, new effective volume   | `set_volume`          |
//! | paused sound loses its pause marker     | `unload`              |

use crate::audio::backend::{AudioPlayer, PlayerCommand};
use crate::audio::catalog::SoundCatalog;
use crate::events::{ChangeSet, SoundChange};

/// Player commands needed to realise `changes`
pub fn commands_for(changes: &ChangeSet, catalog: &SoundCatalog) -> Vec<PlayerCommand> {
    let mut commands = Vec::new();
    for change in &changes.sounds {
        commands_for_sound(change, changes, catalog, &mut commands);
    }
    commands
}

fn commands_for_sound(
    change: &SoundChange,
    changes: &ChangeSet,
    catalog: &SoundCatalog,
    out: &mut Vec<PlayerCommand>,
) {
    let sound_id = change.id.clone();
    let releases = changes.cause.releases_playback();

    if change.started() {
        let Some(category) = catalog.get(&change.id) else {
            log::warn!("Sound '{}' has no catalog entry, not playing", change.id);
            return;
        };
        out.push(PlayerCommand::Play {
            sound_id: sound_id.clone(),
            source_url: category.sound_url.clone(),
            looping: true,
        });
        out.push(PlayerCommand::SetVolume {
            sound_id,
            percent: change.after.effective_volume(),
        });
    } else if change.stopped() {
        if releases {
            out.push(PlayerCommand::Unload { sound_id });
        } else {
            out.push(PlayerCommand::Pause { sound_id });
        }
    } else if change.after.active {
        if change.volume_changed() {
            out.push(PlayerCommand::SetVolume {
                sound_id,
                percent: change.after.effective_volume(),
            });
        }
    } else if change.before.was_active_before_pause && !change.after.was_active_before_pause {
        // Paused handle that will never be resumed
        out.push(PlayerCommand::Unload { sound_id });
    }
}

/// Sends change-derived commands to an audio player
pub struct AudioForwarder {
    player: Box<dyn AudioPlayer>,
    catalog: SoundCatalog,
}

impl AudioForwarder {
    /// Create a forwarder for `catalog`
    pub fn new(player: Box<dyn AudioPlayer>, catalog: SoundCatalog) -> Self {
        Self { player, catalog }
    }

    /// Forward one change set. Player errors are logged and not retried.
    pub fn forward(&mut self, changes: &ChangeSet) {
        for command in commands_for(changes, &self.catalog) {
            if let Err(e) = self.player.execute(&command) {
                log::warn!("Audio player rejected {:?}: {}", command, e);
            }
        }
    }

    /// Release the playback handle of every listed sound
    pub fn unload_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for sound_id in ids {
            if let Err(e) = self.player.unload(sound_id) {
                log::warn!("Failed to unload '{sound_id}': {e}");
            }
        }
    }
}
