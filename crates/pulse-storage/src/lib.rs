pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use pulse_core::errors::{PulseError, StorageError};

/// Wrap a SQLite or mapping failure as a storage error.
pub(crate) fn to_storage_err(message: impl Into<String>) -> PulseError {
    PulseError::StorageError(StorageError::SqliteError {
        message: message.into(),
    })
}
