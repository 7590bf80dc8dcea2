//! Shared sound mixer
//!
//! [`SoundMixer`] is the handle the rest of the app talks to. It is cheap to
//! clone and safe to share between threads. Every mutation, whether it comes
//! from the UI or from the dynamic modulator's timer, goes through one
//! serialized dispatch under a single lock:
//!
//! 1. apply the [`MixerAction`] to the [`MixerState`]
//! 2. start or stop the modulator if dynamic mode flipped
//! 3. forward playback commands to the audio player
//! 4. notify listeners
//! 5. hand a snapshot to the persistence writer (never blocks on I/O)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::audio::backend::{AudioPlayer, LogPlayer};
use crate::audio::catalog::SoundCatalog;
use crate::audio::forward::AudioForwarder;
use crate::audio::modulator::DynamicModulator;
use crate::audio::random::{RandomSource, StdRandom};
use crate::audio::state::{MixerAction, MixerState, SoundState};
use crate::config::{ConfigError, MixerConfig};
use crate::events::{ChangeSet, ListenerId, ListenerRegistry, MixerListener};
use crate::persistence::{MixerSnapshot, PersistenceWriter, Storage, StorageError};

/// Errors building a [`SoundMixer`]
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// Configuration rejected by [`MixerConfig::validate`]
    #[error("Invalid mixer configuration: {0}")]
    Config(#[from] ConfigError),

    /// Persistence writer could not start
    #[error("Persistence unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// Result of [`SoundMixer::hydrate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// A stored snapshot was applied
    Restored,
    /// Nothing was stored yet
    Empty,
    /// No storage is configured
    NoStorage,
    /// Loading or decoding failed; defaults were kept
    Failed,
}

/// Builder for [`SoundMixer`]
pub struct SoundMixerBuilder {
    catalog: SoundCatalog,
    config: MixerConfig,
    player: Box<dyn AudioPlayer>,
    storage: Option<Arc<dyn Storage>>,
    random: Box<dyn RandomSource>,
}

impl SoundMixerBuilder {
    /// Use the given configuration
    pub fn with_config(mut self, config: MixerConfig) -> Self {
        self.config = config;
        self
    }

    /// Forward playback commands to `player`
    pub fn with_player(mut self, player: impl AudioPlayer + 'static) -> Self {
        self.player = Box::new(player);
        self
    }

    /// Persist to and hydrate from `storage`
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Draw randomness from `random`
    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    /// Build the mixer, seeding every catalog sound as silent. Spawns the
    /// persistence writer when storage is configured.
    pub fn build(self) -> Result<SoundMixer, MixerError> {
        self.config.validate()?;
        if self.catalog.is_empty() {
            log::warn!("Building a sound mixer with an empty catalog");
        }

        let writer = match &self.storage {
            Some(storage) => Some(Arc::new(PersistenceWriter::spawn(
                Arc::clone(storage),
                self.config.store_name.clone(),
                self.config.persist_debounce(),
            )?)),
            None => None,
        };

        let state = MixerState::new(&self.catalog);
        let forwarder = AudioForwarder::new(self.player, self.catalog.clone());
        let modulator = DynamicModulator::new(self.config.modulation_interval());

        let shared = Arc::new_cyclic(|weak| Shared {
            core: Mutex::new(MixerCore {
                state,
                random: self.random,
                listeners: ListenerRegistry::new(),
                forwarder,
                writer,
                modulator,
                weak: weak.clone(),
            }),
            catalog: self.catalog,
            config: self.config,
            storage: self.storage,
        });

        log::info!("Sound mixer ready with {} sounds", shared.catalog.len());
        Ok(SoundMixer { shared })
    }
}

struct Shared {
    core: Mutex<MixerCore>,
    catalog: SoundCatalog,
    config: MixerConfig,
    storage: Option<Arc<dyn Storage>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MixerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MixerCore {
    state: MixerState,
    random: Box<dyn RandomSource>,
    listeners: ListenerRegistry,
    forwarder: AudioForwarder,
    writer: Option<Arc<PersistenceWriter>>,
    modulator: DynamicModulator,
    weak: Weak<Shared>,
}

impl MixerCore {
    fn dispatch(&mut self, config: &MixerConfig, action: &MixerAction) -> ChangeSet {
        let changes = self.state.apply(action, config, self.random.as_mut());
        if changes.is_empty() {
            return changes;
        }
        log::debug!("{:?}: {} sound(s) changed", changes.cause, changes.sounds.len());

        if changes.dynamic_mode.is_some() {
            self.sync_modulator();
        }
        self.forwarder.forward(&changes);
        self.listeners.dispatch(&changes, &self.state);

        if changes.cause.persists() {
            if let Some(writer) = &self.writer {
                writer.submit(MixerSnapshot::from(&self.state));
            }
        }
        changes
    }

    /// Arm or disarm the timer to match the dynamic-mode flag
    fn sync_modulator(&mut self) {
        if !self.state.dynamic_mode_enabled() {
            self.modulator.stop();
            return;
        }
        let weak = self.weak.clone();
        if let Err(e) = self.modulator.start(move |epoch| timer_tick(&weak, epoch)) {
            log::warn!("Failed to start dynamic modulator: {e}");
        }
    }
}

/// Called from the modulator thread. Returns false to end the timer.
fn timer_tick(shared: &Weak<Shared>, epoch: u64) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };
    let mut core = shared.lock();
    if core.modulator.epoch() != epoch || !core.state.dynamic_mode_enabled() {
        return false;
    }
    core.dispatch(&shared.config, &MixerAction::DynamicTick);
    true
}

/// Thread-safe handle to the mixer state engine
#[derive(Clone)]
pub struct SoundMixer {
    shared: Arc<Shared>,
}

impl SoundMixer {
    /// Start building a mixer for `catalog`
    pub fn builder(catalog: SoundCatalog) -> SoundMixerBuilder {
        SoundMixerBuilder {
            catalog,
            config: MixerConfig::default(),
            player: Box::new(LogPlayer),
            storage: None,
            random: Box::new(StdRandom::from_entropy()),
        }
    }

    /// Apply any action through the serialized dispatch path
    pub fn dispatch(&self, action: MixerAction) -> ChangeSet {
        self.shared.lock().dispatch(&self.shared.config, &action)
    }

    /// Toggle a sound according to the configured policy
    pub fn toggle(&self, id: &str) -> ChangeSet {
        self.dispatch(MixerAction::Toggle(id.to_string()))
    }

    /// Set a sound's nominal volume; out-of-range values are clamped
    pub fn set_volume(&self, id: &str, volume: i32) -> ChangeSet {
        self.dispatch(MixerAction::SetVolume(id.to_string(), volume))
    }

    /// Silence and zero one sound
    pub fn reset(&self, id: &str) -> ChangeSet {
        self.dispatch(MixerAction::Reset(id.to_string()))
    }

    /// Reset every sound and clear the global pause
    pub fn reset_all(&self) -> ChangeSet {
        self.dispatch(MixerAction::ResetAll)
    }

    /// Pause all active sounds, or resume them if already paused
    pub fn pause_all(&self) -> ChangeSet {
        self.dispatch(MixerAction::PauseAll)
    }

    /// Draw a random mix
    pub fn randomize(&self) -> ChangeSet {
        self.dispatch(MixerAction::Randomize)
    }

    /// Flip dynamic mode, arming or cancelling the modulator
    pub fn toggle_dynamic_mode(&self) -> ChangeSet {
        self.dispatch(MixerAction::ToggleDynamicMode)
    }

    /// Apply one modulator step now. No-op while dynamic mode is off.
    pub fn tick_dynamic(&self) -> ChangeSet {
        self.dispatch(MixerAction::DynamicTick)
    }

    /// Load the stored snapshot once and apply it. Safe to call before any
    /// UI is attached; storage I/O happens outside the mixer lock.
    pub fn hydrate(&self) -> Hydration {
        let Some(storage) = &self.shared.storage else {
            return Hydration::NoStorage;
        };
        let name = &self.shared.config.store_name;

        let bytes = match storage.load(name) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No stored mixer state under '{name}'");
                return Hydration::Empty;
            }
            Err(e) => {
                log::warn!("Failed to load '{name}', keeping defaults: {e}");
                return Hydration::Failed;
            }
        };
        let snapshot = match MixerSnapshot::decode(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Stored mixer state '{name}' is unreadable, keeping defaults: {e}");
                return Hydration::Failed;
            }
        };

        let mut core = self.shared.lock();
        let changes = core.dispatch(&self.shared.config, &MixerAction::Restore(snapshot));
        if changes.dynamic_mode.is_none() && core.state.dynamic_mode_enabled() {
            core.sync_modulator();
        }
        log::info!(
            "Hydrated mixer state: {} active, paused: {}, dynamic: {}",
            core.state.active_ids().len(),
            core.state.all_paused(),
            core.state.dynamic_mode_enabled()
        );
        Hydration::Restored
    }

    /// Register a listener for every future change set
    pub fn subscribe(&self, listener: impl MixerListener + 'static) -> ListenerId {
        self.shared.lock().listeners.register(Box::new(listener))
    }

    /// Remove a listener
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.lock().listeners.unregister(id)
    }

    /// Block until every pending snapshot is stored
    pub fn flush(&self) {
        let writer = self.shared.lock().writer.clone();
        if let Some(writer) = writer {
            writer.flush();
        }
    }

    /// Stop the modulator, release every playback handle, including those
    /// held by a global pause, and write the final snapshot. The mixer stays
    /// usable but no longer persists.
    pub fn shutdown(&self) {
        let writer = {
            let mut core = self.shared.lock();
            core.modulator.stop();
            let held: Vec<String> = core
                .state
                .iter()
                .filter(|(_, sound)| sound.active || sound.was_active_before_pause)
                .map(|(id, _)| id.to_owned())
                .collect();
            core.forwarder.unload_all(held.iter().map(String::as_str));
            core.writer.take()
        };
        if let Some(writer) = writer {
            writer.flush();
        }
        log::info!("Sound mixer shut down");
    }

    /// Snapshot of one sound
    pub fn sound(&self, id: &str) -> Option<SoundState> {
        self.shared.lock().state.sound(id).copied()
    }

    /// Whether a sound is active
    pub fn is_active(&self, id: &str) -> bool {
        self.shared.lock().state.is_active(id)
    }

    /// Volume to apply for a sound; 0 for unknown ids
    pub fn effective_volume(&self, id: &str) -> u8 {
        self.shared.lock().state.effective_volume(id)
    }

    /// True while a global pause is in effect
    pub fn all_paused(&self) -> bool {
        self.shared.lock().state.all_paused()
    }

    /// True while dynamic mode is on
    pub fn dynamic_mode_enabled(&self) -> bool {
        self.shared.lock().state.dynamic_mode_enabled()
    }

    /// True while the modulator timer is armed
    pub fn is_modulating(&self) -> bool {
        self.shared.lock().modulator.is_running()
    }

    /// Ids of active sounds in catalog order
    pub fn active_ids(&self) -> Vec<String> {
        self.shared.lock().state.active_ids()
    }

    /// Copy of the whole state
    pub fn state(&self) -> MixerState {
        self.shared.lock().state.clone()
    }

    /// The catalog this mixer was built for
    pub fn catalog(&self) -> &SoundCatalog {
        &self.shared.catalog
    }

    /// The active configuration
    pub fn config(&self) -> &MixerConfig {
        &self.shared.config
    }
}
