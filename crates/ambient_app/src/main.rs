//! # Ambient
//!
//! Console front end for the ambient sound mixer. Reads commands from stdin,
//! applies them to a [`SoundMixer`] and persists the mix between runs.
//!
//! ```text
//! ambient [config.toml]
//! ```

#![warn(missing_docs)]

mod commands;
mod config;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use ambient_engine::audio::{AudioPlayer, MixerState, SoundCatalog, SoundMixer};
use ambient_engine::config::Config;
use ambient_engine::events::{ChangeCause, ChangeSet};
use ambient_engine::foundation::logging;
use ambient_engine::persistence::{FileStorage, Storage};
use ambient_engine::settings::{Choice, SettingsStore};

use crate::commands::{Command, HELP};
use crate::config::{AppConfig, AppError, DEFAULT_CONFIG_PATH};

fn main() -> Result<(), AppError> {
    logging::init();
    log::info!("Starting ambient mixer");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_or_default(&config_path)?;

    std::fs::create_dir_all(&config.storage_dir)?;
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.storage_dir));

    let catalog = config.catalog();
    let player = open_player(&catalog)?;
    let mixer = SoundMixer::builder(catalog)
        .with_config(config.mixer.clone())
        .with_player(player)
        .with_storage(Arc::clone(&storage))
        .build()?;
    mixer.hydrate();

    let mut settings = SettingsStore::new().with_storage(storage);
    settings.hydrate();

    mixer.subscribe(|changes: &ChangeSet, _: &MixerState| {
        if changes.cause != ChangeCause::DynamicTick {
            let ids: Vec<_> = changes.changed_ids().collect();
            log::debug!("{:?} changed {:?}", changes.cause, ids);
        }
    });

    let result = run_console(&mixer, &mut settings);
    mixer.shutdown();
    log::info!("Ambient mixer finished");
    result
}

#[cfg(feature = "rodio")]
fn open_player(catalog: &SoundCatalog) -> Result<Box<dyn AudioPlayer>, AppError> {
    use ambient_engine::audio::backend::rodio_backend::{playable_count, RodioPlayer};

    let player = RodioPlayer::spawn()?;
    if !catalog.is_empty() && playable_count(catalog) == 0 {
        log::info!(
            "Every catalog source is remote and the Rodio player only opens local files; \
             add [[catalog]] entries with local sound_url paths to the config to hear audio"
        );
    }
    Ok(Box::new(player))
}

#[cfg(not(feature = "rodio"))]
fn open_player(_catalog: &SoundCatalog) -> Result<Box<dyn AudioPlayer>, AppError> {
    Ok(Box::new(ambient_engine::audio::LogPlayer))
}

fn run_console(mixer: &SoundMixer, settings: &mut SettingsStore) -> Result<(), AppError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut draft = settings.draft();

    print_status(mixer, settings);
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(commands::ParseError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Toggle(id) => report(mixer, &mixer.toggle(&id)),
            Command::Volume(id, volume) => report(mixer, &mixer.set_volume(&id, volume)),
            Command::Reset(id) => report(mixer, &mixer.reset(&id)),
            Command::ResetAll => report(mixer, &mixer.reset_all()),
            Command::Pause => report(mixer, &mixer.pause_all()),
            Command::Random => report(mixer, &mixer.randomize()),
            Command::Dynamic => {
                mixer.toggle_dynamic_mode();
                println!("dynamic mode {}", on_off(mixer.dynamic_mode_enabled()));
            }
            Command::Status => print_status(mixer, settings),
            Command::Time(time) => draft.time = time,
            Command::Season(season) => draft.season = season,
            Command::Weather(weather) => draft.weather = weather,
            Command::Save => match settings.commit(draft) {
                Ok(true) => println!("saved, background: {}", settings.background_video()),
                Ok(false) => println!("nothing to save"),
                Err(e) => log::warn!("Failed to save settings: {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(()),
        }

        if settings.has_unsaved_changes(&draft) {
            println!("(unsaved scene changes, 'save' to keep them)");
        }
    }
}

fn report(mixer: &SoundMixer, changes: &ChangeSet) {
    if changes.is_empty() {
        println!("no change");
        return;
    }
    for change in &changes.sounds {
        println!(
            "{:<8} {:>3}% {}",
            change.id,
            mixer.effective_volume(&change.id),
            on_off(change.after.active)
        );
    }
}

fn print_status(mixer: &SoundMixer, settings: &SettingsStore) {
    let state = mixer.state();
    for category in mixer.catalog() {
        let Some(sound) = state.sound(&category.id) else {
            continue;
        };
        println!(
            "{:<8} {:<4} {:>3}% {}",
            category.id,
            category.title,
            sound.effective_volume(),
            on_off(sound.active)
        );
    }
    let scene = settings.current();
    println!(
        "paused: {}  dynamic: {}  scene: {} {} {} ({})",
        on_off(state.all_paused()),
        on_off(state.dynamic_mode_enabled()),
        scene.time.label(),
        scene.season.label(),
        scene.weather.label(),
        settings.background_video()
    );
}

const fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
