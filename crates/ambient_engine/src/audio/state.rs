//! Sound mixer state
//!
//! Per-sound activity and volume, the global pause flag and the dynamic-mode
//! flag. Everything here is plain data plus synchronous mutations; the
//! shared, thread-safe handle lives in [`crate::audio::mixer`].
//!
//! Every mutation can be expressed as a [`MixerAction`] and applied with
//! [`MixerState::apply`], which returns the [`ChangeSet`] describing what
//! actually changed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audio::catalog::{SoundCatalog, SoundId};
use crate::audio::random::RandomSource;
use crate::config::MixerConfig;
use crate::events::{ChangeCause, ChangeSet, SoundChange};
use crate::persistence::MixerSnapshot;

/// Highest nominal volume
pub const MAX_VOLUME: u8 = 100;

/// State of one sound category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundState {
    /// Whether the sound should currently be audible
    pub active: bool,
    /// User-set nominal volume (0-100)
    pub volume: u8,
    /// Set while a global pause is in effect for sounds it silenced
    pub was_active_before_pause: bool,
    /// Perturbed volume while dynamic mode runs; `None` means use `volume`
    pub dynamic_volume: Option<u8>,
}

impl SoundState {
    /// Inactive sound at volume 0
    pub const SILENT: Self = Self {
        active: false,
        volume: 0,
        was_active_before_pause: false,
        dynamic_volume: None,
    };

    /// Active sound at the given volume
    pub const fn playing(volume: u8) -> Self {
        Self {
            active: true,
            volume,
            was_active_before_pause: false,
            dynamic_volume: None,
        }
    }

    /// Volume actually sent to playback
    pub fn effective_volume(&self) -> u8 {
        self.dynamic_volume.unwrap_or(self.volume)
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.dynamic_volume = None;
    }
}

/// What `toggle` does to a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TogglePolicy {
    /// Toggle only turns sounds on; use `set_volume(id, 0)` to turn off
    #[default]
    ActivateOnly,
    /// Toggle turns an active sound off, keeping its volume for next time
    Flip,
}

impl TogglePolicy {
    /// Compute the toggled state of `sound`. An activated sound is raised to
    /// at least `floor`.
    pub fn apply(self, sound: &SoundState, floor: u8) -> SoundState {
        let mut next = *sound;
        if sound.active {
            if self == Self::Flip {
                next.deactivate();
            }
        } else {
            next.active = true;
            next.volume = sound.volume.max(floor).min(MAX_VOLUME);
        }
        next
    }
}

/// A mutation of the mixer state
#[derive(Debug, Clone, PartialEq)]
pub enum MixerAction {
    /// Toggle one sound according to the configured policy
    Toggle(SoundId),
    /// Set one sound's nominal volume (clamped to 0-100)
    SetVolume(SoundId, i32),
    /// Silence and zero one sound
    Reset(SoundId),
    /// Reset every sound and clear the global pause
    ResetAll,
    /// Pause every active sound, or resume the paused ones
    PauseAll,
    /// Draw a random mix
    Randomize,
    /// Flip dynamic mode
    ToggleDynamicMode,
    /// One dynamic modulator step
    DynamicTick,
    /// Replace state with a persisted snapshot
    Restore(MixerSnapshot),
}

/// Mixer state for every catalog sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerState {
    order: Vec<SoundId>,
    sounds: HashMap<SoundId, SoundState>,
    all_paused: bool,
    dynamic_mode_enabled: bool,
}

impl MixerState {
    /// Seed one silent entry per catalog id
    pub fn new(catalog: &SoundCatalog) -> Self {
        let order: Vec<SoundId> = catalog.ids().map(str::to_owned).collect();
        let sounds = order.iter().map(|id| (id.clone(), SoundState::SILENT)).collect();
        Self {
            order,
            sounds,
            all_paused: false,
            dynamic_mode_enabled: false,
        }
    }

    /// State of one sound
    pub fn sound(&self, id: &str) -> Option<&SoundState> {
        self.sounds.get(id)
    }

    /// Sounds in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SoundState)> {
        self.order
            .iter()
            .filter_map(|id| self.sounds.get(id).map(|s| (id.as_str(), s)))
    }

    /// Ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Ids of currently active sounds, in catalog order
    pub fn active_ids(&self) -> Vec<SoundId> {
        self.iter()
            .filter(|(_, s)| s.active)
            .map(|(id, _)| id.to_owned())
            .collect()
    }

    /// Whether a sound is active; false for unknown ids
    pub fn is_active(&self, id: &str) -> bool {
        self.sound(id).is_some_and(|s| s.active)
    }

    /// Effective volume of a sound; 0 for unknown ids
    pub fn effective_volume(&self, id: &str) -> u8 {
        self.sound(id).map_or(0, SoundState::effective_volume)
    }

    /// True while a global pause is in effect
    pub const fn all_paused(&self) -> bool {
        self.all_paused
    }

    /// True while dynamic mode is on
    pub const fn dynamic_mode_enabled(&self) -> bool {
        self.dynamic_mode_enabled
    }

    /// Toggle one sound. Ignored for unknown ids and while globally paused.
    pub fn toggle(&mut self, id: &str, policy: TogglePolicy, floor: u8) {
        if self.all_paused {
            return;
        }
        if let Some(sound) = self.sounds.get_mut(id) {
            *sound = policy.apply(sound, floor);
        }
    }

    /// Set a sound's nominal volume, clamped to 0-100. The sound is active
    /// exactly when the new volume is above zero.
    pub fn set_volume(&mut self, id: &str, volume: i32) {
        let dynamic = self.dynamic_mode_enabled;
        if let Some(sound) = self.sounds.get_mut(id) {
            let volume = clamp_volume(volume);
            sound.volume = volume;
            sound.active = volume > 0;
            sound.dynamic_volume = (dynamic && sound.active).then_some(volume);
        }
    }

    /// Silence and zero one sound
    pub fn reset(&mut self, id: &str) {
        if let Some(sound) = self.sounds.get_mut(id) {
            *sound = SoundState::SILENT;
        }
    }

    /// Reset every sound and clear the global pause
    pub fn reset_all(&mut self) {
        for sound in self.sounds.values_mut() {
            *sound = SoundState::SILENT;
        }
        self.all_paused = false;
    }

    /// Pause every active sound, or resume the ones the last pause silenced
    pub fn pause_all(&mut self) {
        if self.all_paused {
            for sound in self.sounds.values_mut() {
                if sound.was_active_before_pause {
                    sound.was_active_before_pause = false;
                    sound.active = sound.volume > 0;
                }
            }
            self.all_paused = false;
        } else {
            for sound in self.sounds.values_mut() {
                if sound.active {
                    sound.deactivate();
                    sound.was_active_before_pause = true;
                }
            }
            self.all_paused = true;
        }
    }

    /// Draw a random mix: each sound is active with probability 0.5 and, if
    /// active, gets a uniform volume in 0-100
    pub fn randomize(&mut self, rng: &mut dyn RandomSource) {
        let dynamic = self.dynamic_mode_enabled;
        for id in &self.order {
            let Some(sound) = self.sounds.get_mut(id) else {
                continue;
            };
            let active = rng.next_unit() < 0.5;
            let volume = if active { rng.next_percent(MAX_VOLUME) } else { 0 };
            *sound = SoundState {
                active: volume > 0,
                volume,
                was_active_before_pause: false,
                dynamic_volume: (dynamic && volume > 0).then_some(volume),
            };
        }
        self.all_paused = false;
    }

    /// Turn dynamic mode on or off. Turning it off drops every dynamic volume.
    pub fn set_dynamic_mode(&mut self, enabled: bool) {
        self.dynamic_mode_enabled = enabled;
        if !enabled {
            for sound in self.sounds.values_mut() {
                sound.dynamic_volume = None;
            }
        }
    }

    /// Perturb every active sound around its nominal volume by up to
    /// `depth` (relative). No-op while dynamic mode is off.
    pub fn modulate(&mut self, rng: &mut dyn RandomSource, depth: f64) {
        if !self.dynamic_mode_enabled {
            return;
        }
        for id in &self.order {
            let Some(sound) = self.sounds.get_mut(id) else {
                continue;
            };
            if !sound.active {
                sound.dynamic_volume = None;
                continue;
            }
            sound.dynamic_volume = Some(perturb(sound.volume, rng.next_symmetric(depth)));
        }
    }

    /// Overwrite state with a persisted snapshot. Catalog ids missing from
    /// the snapshot keep their current state; unknown snapshot ids are
    /// ignored.
    pub fn restore(&mut self, snapshot: &MixerSnapshot) {
        for (id, stored) in &snapshot.sounds {
            let Some(sound) = self.sounds.get_mut(id) else {
                log::debug!("Ignoring stored sound '{id}' not in catalog");
                continue;
            };
            let volume = stored.volume_percent();
            *sound = SoundState {
                active: stored.is_playing && volume > 0,
                volume,
                was_active_before_pause: snapshot.all_paused && stored.was_playing_before_pause,
                dynamic_volume: None,
            };
        }
        self.all_paused = snapshot.all_paused;
        self.dynamic_mode_enabled = snapshot.is_dynamic_mode;
    }

    /// Apply an action and report what changed
    pub fn apply(
        &mut self,
        action: &MixerAction,
        config: &MixerConfig,
        rng: &mut dyn RandomSource,
    ) -> ChangeSet {
        let before = self.clone();
        let cause = match action {
            MixerAction::Toggle(id) => {
                self.toggle(id, config.toggle_policy, config.toggle_floor);
                ChangeCause::Toggle
            }
            MixerAction::SetVolume(id, volume) => {
                self.set_volume(id, *volume);
                ChangeCause::SetVolume
            }
            MixerAction::Reset(id) => {
                self.reset(id);
                ChangeCause::Reset
            }
            MixerAction::ResetAll => {
                self.reset_all();
                ChangeCause::Reset
            }
            MixerAction::PauseAll => {
                let cause = if self.all_paused {
                    ChangeCause::ResumeAll
                } else {
                    ChangeCause::PauseAll
                };
                self.pause_all();
                cause
            }
            MixerAction::Randomize => {
                self.randomize(rng);
                ChangeCause::Randomize
            }
            MixerAction::ToggleDynamicMode => {
                self.set_dynamic_mode(!self.dynamic_mode_enabled);
                ChangeCause::DynamicMode
            }
            MixerAction::DynamicTick => {
                self.modulate(rng, config.modulation_depth);
                ChangeCause::DynamicTick
            }
            MixerAction::Restore(snapshot) => {
                self.restore(snapshot);
                ChangeCause::Hydrate
            }
        };
        self.diff(&before, cause)
    }

    fn diff(&self, before: &Self, cause: ChangeCause) -> ChangeSet {
        let sounds = self
            .iter()
            .filter_map(|(id, after)| {
                let prior = before.sounds.get(id).copied().unwrap_or_default();
                (prior != *after).then(|| SoundChange {
                    id: id.to_owned(),
                    before: prior,
                    after: *after,
                })
            })
            .collect();

        ChangeSet {
            cause,
            sounds,
            all_paused: (before.all_paused != self.all_paused).then_some(self.all_paused),
            dynamic_mode: (before.dynamic_mode_enabled != self.dynamic_mode_enabled)
                .then_some(self.dynamic_mode_enabled),
        }
    }
}

/// Clamp any integer into the 0-100 volume range
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, i32::from(MAX_VOLUME)) as u8
}

/// `volume + volume * offset`, rounded and clamped to 0-100
pub fn perturb(volume: u8, offset: f64) -> u8 {
    let base = f64::from(volume);
    let value = base.mul_add(offset, base).round();
    value.clamp(0.0, f64::from(MAX_VOLUME)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::random::SequenceRandom;

    fn rain_wind() -> MixerState {
        MixerState::new(&SoundCatalog::from_ids(["rain", "wind"]))
    }

    fn apply(state: &mut MixerState, action: MixerAction) -> ChangeSet {
        let mut rng = SequenceRandom::new([0.5]);
        state.apply(&action, &MixerConfig::default(), &mut rng)
    }

    #[test]
    fn test_seeded_silent() {
        let state = rain_wind();
        assert_eq!(state.sound("rain"), Some(&SoundState::SILENT));
        assert_eq!(state.sound("wind"), Some(&SoundState::SILENT));
        assert!(!state.all_paused());
        assert!(!state.dynamic_mode_enabled());
    }

    #[test]
    fn test_toggle_policies() {
        let silent = SoundState::SILENT;
        assert_eq!(TogglePolicy::ActivateOnly.apply(&silent, 10), SoundState::playing(10));

        let quiet = SoundState { volume: 4, ..SoundState::SILENT };
        assert_eq!(TogglePolicy::ActivateOnly.apply(&quiet, 10).volume, 10);

        let remembered = SoundState { volume: 70, ..SoundState::SILENT };
        assert_eq!(TogglePolicy::ActivateOnly.apply(&remembered, 10), SoundState::playing(70));

        let playing = SoundState::playing(40);
        assert_eq!(TogglePolicy::ActivateOnly.apply(&playing, 10), playing);

        let off = TogglePolicy::Flip.apply(&playing, 10);
        assert!(!off.active);
        assert_eq!(off.volume, 40);
        assert_eq!(TogglePolicy::Flip.apply(&off, 10), playing);
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let mut state = rain_wind();
        let before = state.clone();
        let changes = apply(&mut state, MixerAction::Toggle("lava".into()));
        assert!(changes.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_toggle_ignored_while_paused() {
        let mut state = rain_wind();
        state.set_volume("rain", 30);
        state.pause_all();
        state.toggle("wind", TogglePolicy::ActivateOnly, 10);
        assert!(!state.is_active("wind"));
    }

    #[test]
    fn test_set_volume_clamps() {
        let mut state = rain_wind();
        state.set_volume("rain", 250);
        assert_eq!(state.sound("rain"), Some(&SoundState::playing(100)));

        state.set_volume("rain", -5);
        assert_eq!(state.sound("rain"), Some(&SoundState::SILENT));
    }

    #[test]
    fn test_set_volume_in_dynamic_mode_resets_baseline() {
        let mut state = rain_wind();
        state.set_dynamic_mode(true);
        state.set_volume("rain", 60);
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, Some(60));

        state.set_volume("rain", 0);
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, None);
    }

    #[test]
    fn test_reset_all() {
        let mut state = rain_wind();
        state.set_volume("rain", 30);
        state.set_volume("wind", 80);
        state.pause_all();
        state.reset_all();
        assert!(!state.all_paused());
        assert!(state.iter().all(|(_, s)| *s == SoundState::SILENT));
    }

    #[test]
    fn test_pause_round_trip() {
        let mut state = rain_wind();
        state.set_volume("rain", 35);
        let before = state.clone();

        state.pause_all();
        assert!(state.all_paused());
        let rain = state.sound("rain").unwrap();
        assert!(!rain.active);
        assert!(rain.was_active_before_pause);
        assert!(!state.sound("wind").unwrap().was_active_before_pause);

        state.pause_all();
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset_during_pause_loses_marker() {
        let mut state = rain_wind();
        state.set_volume("rain", 35);
        state.pause_all();
        state.reset("rain");
        state.pause_all();
        assert_eq!(state.sound("rain"), Some(&SoundState::SILENT));
    }

    #[test]
    fn test_resume_skips_zeroed_sound() {
        let mut state = rain_wind();
        state.set_volume("rain", 35);
        state.pause_all();
        state.set_volume("rain", 0);
        state.pause_all();
        assert!(!state.is_active("rain"));
        assert!(!state.sound("rain").unwrap().was_active_before_pause);
    }

    #[test]
    fn test_randomize_with_sequence() {
        let mut state = rain_wind();
        // rain: active (0.2 < 0.5), volume floor(0.5 * 101) = 50
        // wind: inactive (0.9)
        let mut rng = SequenceRandom::new([0.2, 0.5, 0.9]);
        state.randomize(&mut rng);
        assert_eq!(state.sound("rain"), Some(&SoundState::playing(50)));
        assert_eq!(state.sound("wind"), Some(&SoundState::SILENT));
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn test_randomize_zero_volume_stays_inactive() {
        let mut state = rain_wind();
        let mut rng = SequenceRandom::new([0.1, 0.0, 0.7]);
        state.randomize(&mut rng);
        assert_eq!(state.sound("rain"), Some(&SoundState::SILENT));
    }

    #[test]
    fn test_modulate_relative_to_nominal() {
        let mut state = rain_wind();
        state.set_dynamic_mode(true);
        state.set_volume("rain", 50);

        // 0.0 maps to -10%, 1.0 (clamped just below) to almost +10%
        let mut rng = SequenceRandom::new([0.0]);
        for _ in 0..20 {
            state.modulate(&mut rng, 0.1);
        }
        let rain = state.sound("rain").unwrap();
        assert_eq!(rain.dynamic_volume, Some(45));
        assert_eq!(rain.volume, 50);
        assert_eq!(state.sound("wind").unwrap().dynamic_volume, None);

        let mut rng = SequenceRandom::new([1.0]);
        state.modulate(&mut rng, 0.1);
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, Some(55));
    }

    #[test]
    fn test_modulate_off_is_noop() {
        let mut state = rain_wind();
        state.set_volume("rain", 50);
        state.modulate(&mut SequenceRandom::new([0.0]), 0.1);
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, None);
    }

    /// rain active at 50 with a dynamic volume, dynamic mode on
    fn modulated() -> MixerState {
        let mut state = rain_wind();
        state.set_dynamic_mode(true);
        state.set_volume("rain", 50);
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, Some(50));
        state
    }

    #[test]
    fn test_pause_drops_dynamic_volume() {
        let mut state = modulated();
        state.pause_all();
        assert_eq!(state.sound("rain").unwrap().dynamic_volume, None);
        state.pause_all();
        let rain = state.sound("rain").unwrap();
        assert!(rain.active);
        assert_eq!(rain.dynamic_volume, None);
    }

    #[test]
    fn test_reset_drops_dynamic_volume() {
        let mut state = modulated();
        state.reset("rain");
        assert_eq!(state.sound("rain"), Some(&SoundState::SILENT));
    }

    #[test]
    fn test_flip_off_drops_dynamic_volume() {
        let mut state = modulated();
        state.toggle("rain", TogglePolicy::Flip, 10);
        let rain = state.sound("rain").unwrap();
        assert!(!rain.active);
        assert_eq!(rain.volume, 50);
        assert_eq!(rain.dynamic_volume, None);
    }

    #[test]
    fn test_perturb_clamps() {
        assert_eq!(perturb(100, 0.1), 100);
        assert_eq!(perturb(0, -0.1), 0);
        assert_eq!(perturb(80, -0.1), 72);
    }

    #[test]
    fn test_dynamic_toggle_twice_restores() {
        let mut state = rain_wind();
        state.set_volume("rain", 42);
        let before = state.clone();
        apply(&mut state, MixerAction::ToggleDynamicMode);
        apply(&mut state, MixerAction::DynamicTick);
        apply(&mut state, MixerAction::ToggleDynamicMode);
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut state = rain_wind();
        let changes = apply(&mut state, MixerAction::SetVolume("rain".into(), 55));
        assert_eq!(changes.cause, ChangeCause::SetVolume);
        assert_eq!(changes.sounds.len(), 1);
        assert_eq!(changes.sounds[0].id, "rain");
        assert_eq!(changes.sounds[0].after, SoundState::playing(55));
        assert_eq!(changes.all_paused, None);

        let changes = apply(&mut state, MixerAction::PauseAll);
        assert_eq!(changes.cause, ChangeCause::PauseAll);
        assert_eq!(changes.all_paused, Some(true));

        let changes = apply(&mut state, MixerAction::PauseAll);
        assert_eq!(changes.cause, ChangeCause::ResumeAll);
        assert_eq!(changes.all_paused, Some(false));
    }

    #[test]
    fn test_effective_volume_bounds() {
        let mut state = rain_wind();
        let mut rng = SequenceRandom::new([0.0, 0.99, 0.3, 0.999, 0.7, 0.1]);
        state.set_dynamic_mode(true);
        for _ in 0..50 {
            state.randomize(&mut rng);
            state.modulate(&mut rng, 0.1);
            for id in ["rain", "wind", "lava"] {
                assert!(state.effective_volume(id) <= MAX_VOLUME);
            }
        }
        assert_eq!(state.effective_volume("lava"), 0);
    }
}
