//! Connection pool managing read/write connections.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use pulse_core::errors::PulseResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// Manages the single write connection and the read connection pool.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open a connection pool for the given database file.
    ///
    /// Readers are opened lazily by the engine after migrations so that the
    /// schema exists when they attach.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> PulseResult<Self> {
        let writer = WriteConnection::open(path, busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers: None,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory databases are private to one connection, so there is no
    /// read pool and every read goes through the writer.
    pub fn open_in_memory() -> PulseResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory()?,
            readers: None,
            db_path: None,
        })
    }

    pub fn attach_readers(&mut self, size: usize, busy_timeout_ms: u32) -> PulseResult<()> {
        if let Some(path) = &self.db_path {
            self.readers = Some(ReadPool::open(path, size, busy_timeout_ms)?);
        }
        Ok(())
    }
}
