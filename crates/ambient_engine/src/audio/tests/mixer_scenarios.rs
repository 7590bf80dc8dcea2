//! Foreground operations through the shared mixer handle

use std::sync::{Arc, Mutex};

use super::{rain_wind, recorded_mixer};
use crate::audio::{
    MixerAction, PlayerCommand, SequenceRandom, SoundMixer, SoundState, TogglePolicy, MAX_VOLUME,
};
use crate::config::MixerConfig;
use crate::events::{ChangeCause, ChangeSet};

#[test]
fn test_rain_wind_pause_round_trip() {
    let (mixer, _) = recorded_mixer();
    assert_eq!(mixer.sound("rain"), Some(SoundState::SILENT));

    mixer.toggle("rain");
    assert_eq!(mixer.sound("rain"), Some(SoundState::playing(10)));
    assert_eq!(mixer.sound("wind"), Some(SoundState::SILENT));

    mixer.set_volume("rain", 55);
    assert_eq!(mixer.sound("rain"), Some(SoundState::playing(55)));

    let paused = mixer.pause_all();
    assert_eq!(paused.cause, ChangeCause::PauseAll);
    assert_eq!(paused.all_paused, Some(true));
    let rain = mixer.sound("rain").unwrap();
    assert!(!rain.active);
    assert!(rain.was_active_before_pause);
    assert!(mixer.all_paused());

    let resumed = mixer.pause_all();
    assert_eq!(resumed.cause, ChangeCause::ResumeAll);
    assert_eq!(mixer.sound("rain"), Some(SoundState::playing(55)));
    assert_eq!(mixer.sound("wind"), Some(SoundState::SILENT));
    assert!(!mixer.all_paused());
}

#[test]
fn test_forwarded_commands_follow_transitions() {
    let (mixer, player) = recorded_mixer();

    mixer.toggle("rain");
    mixer.set_volume("rain", 55);
    mixer.pause_all();
    mixer.pause_all();
    mixer.reset("rain");

    let commands = player.take();
    let rain_volume = |percent| PlayerCommand::SetVolume {
        sound_id: "rain".into(),
        percent,
    };
    let play = PlayerCommand::Play {
        sound_id: "rain".into(),
        source_url: "rain".into(),
        looping: true,
    };
    assert_eq!(
        commands,
        vec![
            play.clone(),
            rain_volume(10),
            rain_volume(55),
            PlayerCommand::Pause { sound_id: "rain".into() },
            play,
            rain_volume(55),
            PlayerCommand::Unload { sound_id: "rain".into() },
        ]
    );
}

fn unload(id: &str) -> PlayerCommand {
    PlayerCommand::Unload { sound_id: id.into() }
}

#[test]
fn test_resume_releases_handle_silenced_during_pause() {
    let (mixer, player) = recorded_mixer();
    mixer.set_volume("rain", 55);
    mixer.pause_all();
    mixer.set_volume("rain", 0);
    player.take();

    mixer.pause_all();
    assert!(!mixer.is_active("rain"));
    assert_eq!(player.take(), vec![unload("rain")]);

    mixer.shutdown();
    assert!(player.take().is_empty());
}

#[test]
fn test_shutdown_while_paused_releases_paused_handles() {
    let (mixer, player) = recorded_mixer();
    mixer.set_volume("rain", 55);
    mixer.set_volume("wind", 20);
    mixer.pause_all();
    player.take();

    mixer.shutdown();
    assert_eq!(player.take(), vec![unload("rain"), unload("wind")]);
}

#[test]
fn test_unknown_ids_never_fail() {
    let (mixer, player) = recorded_mixer();
    assert!(mixer.toggle("thunder").is_empty());
    assert!(mixer.set_volume("thunder", 50).is_empty());
    assert!(mixer.reset("thunder").is_empty());
    assert_eq!(mixer.effective_volume("thunder"), 0);
    assert!(!mixer.is_active("thunder"));
    assert!(player.commands().is_empty());
}

#[test]
fn test_set_volume_properties() {
    let (mixer, _) = recorded_mixer();
    for v in [1, 37, 100] {
        mixer.set_volume("wind", v);
        assert_eq!(i32::from(mixer.effective_volume("wind")), v);
        assert!(mixer.is_active("wind"));
    }
    mixer.set_volume("wind", 0);
    assert!(!mixer.is_active("wind"));

    mixer.set_volume("wind", 250);
    assert_eq!(mixer.effective_volume("wind"), MAX_VOLUME);
    mixer.set_volume("wind", -4);
    assert_eq!(mixer.effective_volume("wind"), 0);
    assert!(!mixer.is_active("wind"));
}

#[test]
fn test_reset_all_clears_everything() {
    let (mixer, _) = recorded_mixer();
    mixer.set_volume("rain", 40);
    mixer.set_volume("wind", 70);
    mixer.pause_all();

    let changes = mixer.reset_all();
    assert_eq!(changes.cause, ChangeCause::Reset);
    assert_eq!(changes.all_paused, Some(false));
    assert!(!mixer.all_paused());
    for (_, sound) in mixer.state().iter() {
        assert_eq!(*sound, SoundState::SILENT);
    }
}

#[test]
fn test_toggle_ignored_while_paused() {
    let (mixer, _) = recorded_mixer();
    mixer.set_volume("rain", 30);
    mixer.pause_all();
    assert!(mixer.toggle("wind").is_empty());
    assert!(!mixer.is_active("wind"));
}

#[test]
fn test_flip_policy_through_mixer() {
    let mixer = SoundMixer::builder(rain_wind())
        .with_config(MixerConfig::default().with_toggle_policy(TogglePolicy::Flip))
        .build()
        .unwrap();

    mixer.set_volume("rain", 60);
    mixer.toggle("rain");
    assert_eq!(
        mixer.sound("rain").map(|s| (s.active, s.volume)),
        Some((false, 60))
    );
    mixer.toggle("rain");
    assert_eq!(mixer.sound("rain"), Some(SoundState::playing(60)));
}

#[test]
fn test_randomize_is_predictable_with_sequence() {
    // rain: active (0.1 < 0.5), volume floor(0.42 * 101) = 42
    // wind: inactive (0.9 >= 0.5), no volume draw
    let mixer = SoundMixer::builder(rain_wind())
        .with_random(SequenceRandom::new([0.1, 0.42, 0.9]))
        .build()
        .unwrap();
    mixer.set_volume("wind", 80);
    mixer.pause_all();

    let changes = mixer.randomize();
    assert_eq!(changes.cause, ChangeCause::Randomize);
    assert_eq!(mixer.sound("rain"), Some(SoundState::playing(42)));
    assert_eq!(mixer.sound("wind"), Some(SoundState::SILENT));
    assert!(!mixer.all_paused());
}

#[test]
fn test_listeners_receive_changes_in_order() {
    let (mixer, _) = recorded_mixer();
    let seen: Arc<Mutex<Vec<(ChangeCause, Vec<String>)>>> = Arc::default();

    let sink = Arc::clone(&seen);
    let id = mixer.subscribe(move |changes: &ChangeSet, _: &crate::audio::MixerState| {
        let ids = changes.changed_ids().map(str::to_owned).collect();
        sink.lock().unwrap().push((changes.cause, ids));
    });

    mixer.toggle("rain");
    mixer.set_volume("rain", 10);
    mixer.dispatch(MixerAction::SetVolume("wind".into(), 20));
    assert!(mixer.unsubscribe(id));
    mixer.reset_all();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (ChangeCause::Toggle, vec!["rain".to_string()]),
            (ChangeCause::SetVolume, vec!["wind".to_string()]),
        ]
    );
}

#[test]
fn test_concurrent_mutations_stay_in_bounds() {
    let (mixer, _) = recorded_mixer();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let mixer = mixer.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let id = if (i + t) % 2 == 0 { "rain" } else { "wind" };
                    mixer.set_volume(id, i * 7 - 300);
                    mixer.toggle(id);
                    if i % 50 == 0 {
                        mixer.pause_all();
                    }
                    assert!(mixer.effective_volume(id) <= MAX_VOLUME);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    for (_, sound) in mixer.state().iter() {
        assert!(sound.effective_volume() <= MAX_VOLUME);
        assert!(!sound.active || sound.volume > 0);
    }
}
