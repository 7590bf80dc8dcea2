//! Rodio audio player
//!
//! Plays local audio files (WAV, OGG Vorbis, MP3, FLAC) through Rodio.
//! Rodio's output stream cannot leave the thread that opened it, so the
//! player owns a dedicated audio thread and the [`RodioPlayer`] handle only
//! sends it commands.
//!
//! Remote sources (`http://`, `https://`) are rejected; fetching assets is
//! left to whoever prepares the catalog.
//!
//! # Example
//!
//! ```no_run
//! use ambient_engine::audio::backend::AudioPlayer;
//! use ambient_engine::audio::backend::rodio_backend::RodioPlayer;
//!
//! let mut player = RodioPlayer::spawn().unwrap();
//! player.play("rain", "sounds/rain.ogg", true).unwrap();
//! player.set_volume("rain", 40).unwrap();
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioPlayer, PlayerCommand};
use crate::audio::{AudioError, SoundCatalog};

enum EngineMessage {
    Command(PlayerCommand),
    Shutdown,
}

/// Handle to the Rodio audio thread
pub struct RodioPlayer {
    tx: Sender<EngineMessage>,
    handle: Option<JoinHandle<()>>,
}

impl RodioPlayer {
    /// Open the default output device on a new audio thread
    pub fn spawn() -> Result<Self, AudioError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);

        let handle = std::thread::Builder::new()
            .name("rodio-player".into())
            .spawn(move || {
                let (stream, stream_handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let error = AudioError::BackendNotInitialized(e.to_string());
                        let _ = ready_tx.send(Err(error));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut engine = RodioEngine {
                    _stream: stream,
                    stream_handle,
                    sinks: HashMap::new(),
                };
                engine.run(&rx);
            })
            .map_err(|e| AudioError::BackendUnavailable(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| AudioError::BackendUnavailable("audio thread exited".to_string()))??;

        log::info!("Rodio player started");
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    fn send(&self, command: PlayerCommand) -> Result<(), AudioError> {
        self.tx
            .send(EngineMessage::Command(command))
            .map_err(|_| AudioError::BackendUnavailable("audio thread stopped".to_string()))
    }
}

impl AudioPlayer for RodioPlayer {
    fn play(&mut self, sound_id: &str, source_url: &str, looping: bool) -> Result<(), AudioError> {
        if is_remote(source_url) {
            return Err(AudioError::UnsupportedSource(source_url.to_string()));
        }
        self.send(PlayerCommand::Play {
            sound_id: sound_id.to_string(),
            source_url: source_url.to_string(),
            looping,
        })
    }

    fn set_volume(&mut self, sound_id: &str, percent: u8) -> Result<(), AudioError> {
        self.send(PlayerCommand::SetVolume {
            sound_id: sound_id.to_string(),
            percent,
        })
    }

    fn pause(&mut self, sound_id: &str) -> Result<(), AudioError> {
        self.send(PlayerCommand::Pause {
            sound_id: sound_id.to_string(),
        })
    }

    fn unload(&mut self, sound_id: &str) -> Result<(), AudioError> {
        self.send(PlayerCommand::Unload {
            sound_id: sound_id.to_string(),
        })
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        let _ = self.tx.send(EngineMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// State owned by the audio thread
struct RodioEngine {
    /// Output stream (must be kept alive)
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sinks: HashMap<String, Sink>,
}

impl RodioEngine {
    fn run(&mut self, rx: &Receiver<EngineMessage>) {
        while let Ok(EngineMessage::Command(command)) = rx.recv() {
            if let Err(e) = self.handle(&command) {
                log::warn!("Playback command for '{}' failed: {}", command.sound_id(), e);
            }
        }
        for (_, sink) in self.sinks.drain() {
            sink.stop();
        }
        log::info!("Rodio player stopped");
    }

    fn handle(&mut self, command: &PlayerCommand) -> Result<(), AudioError> {
        match command {
            PlayerCommand::Play {
                sound_id,
                source_url,
                looping,
            } => {
                if let Some(sink) = self.sinks.get(sound_id) {
                    sink.play();
                    return Ok(());
                }
                let sink = self.open(source_url, *looping)?;
                self.sinks.insert(sound_id.clone(), sink);
            }
            PlayerCommand::SetVolume { sound_id, percent } => {
                if let Some(sink) = self.sinks.get(sound_id) {
                    sink.set_volume(f32::from(*percent) / 100.0);
                }
            }
            PlayerCommand::Pause { sound_id } => {
                if let Some(sink) = self.sinks.get(sound_id) {
                    sink.pause();
                }
            }
            PlayerCommand::Unload { sound_id } => {
                if let Some(sink) = self.sinks.remove(sound_id) {
                    sink.stop();
                }
            }
        }
        Ok(())
    }

    fn open(&self, source_url: &str, looping: bool) -> Result<Sink, AudioError> {
        let path = Path::new(source_url.strip_prefix("file://").unwrap_or(source_url));
        let file = File::open(path)
            .map_err(|e| AudioError::PlaybackFailed(format!("{}: {}", path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| {
            AudioError::PlaybackFailed(format!("Failed to decode {}: {}", path.display(), e))
        })?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {e}")))?;
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        Ok(sink)
    }
}

fn is_remote(source_url: &str) -> bool {
    source_url.starts_with("http://") || source_url.starts_with("https://")
}

/// Number of catalog sounds whose source the player can open
pub fn playable_count(catalog: &SoundCatalog) -> usize {
    catalog.iter().filter(|c| !is_remote(&c.sound_url)).count()
}
