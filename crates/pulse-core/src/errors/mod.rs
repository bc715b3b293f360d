mod pulse_error;
mod storage_error;

pub use pulse_error::{ErrorKind, PulseError};
pub use storage_error::StorageError;

/// Convenience alias used across the workspace.
pub type PulseResult<T> = Result<T, PulseError>;
