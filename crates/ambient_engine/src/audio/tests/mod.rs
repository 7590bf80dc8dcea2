//! Multi-component mixer scenarios

mod mixer_scenarios;

use std::sync::Arc;
use std::time::Duration;

use crate::audio::{RecordingPlayer, SequenceRandom, SoundCatalog, SoundMixer};
use crate::config::MixerConfig;
use crate::persistence::Storage;

/// Config with no debounce so every change is written immediately
fn eager_config() -> MixerConfig {
    MixerConfig::default().with_persist_debounce(Duration::ZERO)
}

fn rain_wind() -> SoundCatalog {
    SoundCatalog::from_ids(["rain", "wind"])
}

/// Mixer over {rain, wind} with a recording player
fn recorded_mixer() -> (SoundMixer, RecordingPlayer) {
    let player = RecordingPlayer::new();
    let mixer = SoundMixer::builder(rain_wind())
        .with_player(player.clone())
        .with_random(SequenceRandom::new([0.5]))
        .build()
        .unwrap();
    (mixer, player)
}

fn stored_mixer(storage: Arc<dyn Storage>, config: MixerConfig) -> SoundMixer {
    SoundMixer::builder(rain_wind())
        .with_config(config)
        .with_storage(storage)
        .build()
        .unwrap()
}
