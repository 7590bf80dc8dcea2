//! Background snapshot writer
//!
//! Snapshots are handed over on a channel and written from a dedicated
//! thread, so callers never wait on storage. Snapshots that arrive within
//! the debounce window of the first unsaved one are coalesced and only the
//! latest is written.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::{MixerSnapshot, Storage, StorageError};

enum WriterCommand {
    Save(MixerSnapshot),
    Flush(Sender<()>),
    Shutdown,
}

/// Debounced, fire-and-forget snapshot writer
pub struct PersistenceWriter {
    tx: Sender<WriterCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PersistenceWriter {
    /// Spawn the writer thread for snapshots stored under `name`
    pub fn spawn(
        storage: Arc<dyn Storage>,
        name: impl Into<String>,
        debounce: Duration,
    ) -> Result<Self, StorageError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let name = name.into();
        let handle = std::thread::Builder::new()
            .name("mixer-persist".into())
            .spawn(move || writer_loop(&*storage, &name, debounce, &rx))?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Queue a snapshot for writing. Never blocks.
    pub fn submit(&self, snapshot: MixerSnapshot) {
        if self.tx.send(WriterCommand::Save(snapshot)).is_err() {
            log::warn!("Persistence writer has stopped, snapshot dropped");
        }
    }

    /// Block until every queued snapshot has been written (or has failed)
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if self.tx.send(WriterCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for PersistenceWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(WriterCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Persistence writer thread panicked");
            }
        }
    }
}

fn writer_loop(
    storage: &dyn Storage,
    name: &str,
    debounce: Duration,
    rx: &Receiver<WriterCommand>,
) {
    let mut pending: Option<(MixerSnapshot, Instant)> = None;

    loop {
        let command = match &pending {
            Some((_, deadline)) => match rx.recv_deadline(*deadline) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(WriterCommand::Shutdown),
            },
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => Some(WriterCommand::Shutdown),
            },
        };

        match command {
            None => write_pending(storage, name, &mut pending),
            Some(WriterCommand::Save(snapshot)) => {
                let deadline = pending
                    .as_ref()
                    .map_or_else(|| Instant::now() + debounce, |(_, deadline)| *deadline);
                pending = Some((snapshot, deadline));
                if debounce.is_zero() {
                    write_pending(storage, name, &mut pending);
                }
            }
            Some(WriterCommand::Flush(ack)) => {
                write_pending(storage, name, &mut pending);
                let _ = ack.send(());
            }
            Some(WriterCommand::Shutdown) => {
                write_pending(storage, name, &mut pending);
                break;
            }
        }
    }
    log::debug!("Persistence writer for '{name}' stopped");
}

fn write_pending(
    storage: &dyn Storage,
    name: &str,
    pending: &mut Option<(MixerSnapshot, Instant)>,
) {
    let Some((snapshot, _)) = pending.take() else {
        return;
    };
    let result = snapshot.encode().and_then(|bytes| storage.save(name, &bytes));
    match result {
        Ok(()) => log::debug!("Saved '{name}'"),
        Err(e) => log::warn!("Failed to save '{name}': {e}"),
    }
}
