//! Persistence of mixer and settings state
//!
//! The core only decides *what* is stored and *when*. Bytes reach a
//! [`Storage`] implementation, a key-value blob store addressed by name.

mod snapshot;
mod storage;
mod writer;

pub use snapshot::{MixerSnapshot, StoredSound};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use writer::PersistenceWriter;

use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Store name cannot be used as a key
    #[error("Invalid store name: {0}")]
    InvalidName(String),

    /// The store rejected the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
