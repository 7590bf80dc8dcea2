//! Change notification for the mixer
//!
//! Every applied mutation produces a [`ChangeSet`] listing the sounds whose
//! state differs and the global flags that flipped. Subscribers register a
//! [`MixerListener`] and receive each change set in mutation order.

use crate::audio::catalog::SoundId;
use crate::audio::state::{MixerState, SoundState};

/// What produced a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeCause {
    /// A sound was toggled
    Toggle,
    /// A sound's volume was set
    SetVolume,
    /// One or all sounds were reset
    Reset,
    /// A global pause started
    PauseAll,
    /// A global pause ended
    ResumeAll,
    /// A random mix was drawn
    Randomize,
    /// Dynamic mode was switched
    DynamicMode,
    /// The dynamic modulator stepped
    DynamicTick,
    /// State was restored from storage
    Hydrate,
}

impl ChangeCause {
    /// Whether changes with this cause alter persisted data. Modulator ticks
    /// only touch dynamic volumes, which are never stored.
    pub const fn persists(self) -> bool {
        !matches!(self, Self::DynamicTick | Self::Hydrate)
    }

    /// Whether a sound deactivated by this cause should release its
    /// playback handle instead of pausing it
    pub const fn releases_playback(self) -> bool {
        matches!(self, Self::Reset)
    }
}

/// State of one sound before and after a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundChange {
    /// Sound id
    pub id: SoundId,
    /// State before the mutation
    pub before: SoundState,
    /// State after the mutation
    pub after: SoundState,
}

impl SoundChange {
    /// Sound went from inactive to active
    pub const fn started(&self) -> bool {
        !self.before.active && self.after.active
    }

    /// Sound went from active to inactive
    pub const fn stopped(&self) -> bool {
        self.before.active && !self.after.active
    }

    /// Effective volume differs
    pub fn volume_changed(&self) -> bool {
        self.before.effective_volume() != self.after.effective_volume()
    }
}

/// Everything one mutation changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// What produced the change
    pub cause: ChangeCause,
    /// Changed sounds, in catalog order
    pub sounds: Vec<SoundChange>,
    /// New pause flag, if it flipped
    pub all_paused: Option<bool>,
    /// New dynamic-mode flag, if it flipped
    pub dynamic_mode: Option<bool>,
}

impl ChangeSet {
    /// Change set with nothing in it
    pub const fn empty(cause: ChangeCause) -> Self {
        Self {
            cause,
            sounds: Vec::new(),
            all_paused: None,
            dynamic_mode: None,
        }
    }

    /// True if nothing changed
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty() && self.all_paused.is_none() && self.dynamic_mode.is_none()
    }

    /// Ids of changed sounds
    pub fn changed_ids(&self) -> impl Iterator<Item = &str> {
        self.sounds.iter().map(|c| c.id.as_str())
    }

    /// Change for one sound, if it changed
    pub fn sound(&self, id: &str) -> Option<&SoundChange> {
        self.sounds.iter().find(|c| c.id == id)
    }
}

/// Subscriber to mixer changes
///
/// Listeners run on whichever thread applied the mutation (the caller's, or
/// the modulator thread for ticks) while the mixer is locked, so they must
/// not call mutating mixer operations.
pub trait MixerListener: Send {
    /// Called once per non-empty change set with the resulting state
    fn on_change(&mut self, changes: &ChangeSet, state: &MixerState);
}

impl<F> MixerListener for F
where
    F: FnMut(&ChangeSet, &MixerState) + Send,
{
    fn on_change(&mut self, changes: &ChangeSet, state: &MixerState) {
        self(changes, state);
    }
}

/// Handle returned by [`ListenerRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered list of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<(ListenerId, Box<dyn MixerListener>)>,
    next_id: u64,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it is notified after all earlier ones
    pub fn register(&mut self, listener: Box<dyn MixerListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver a change set to every listener. Empty sets are dropped.
    pub fn dispatch(&mut self, changes: &ChangeSet, state: &MixerState) {
        if changes.is_empty() {
            return;
        }
        for (_, listener) in &mut self.listeners {
            listener.on_change(changes, state);
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
