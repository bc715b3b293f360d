//! Row-level SQL for each table, plus shared timestamp and transaction helpers.

pub mod pattern_ops;
pub mod report_ops;
pub mod reputation_ops;
pub mod tile_ops;
pub mod vote_ops;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use pulse_core::errors::{PulseError, PulseResult, StorageError};

use crate::to_storage_err;

/// Fixed-width RFC 3339 (millisecond, `Z`) so text comparison orders correctly.
pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn opt_ts(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(ts)
}

pub(crate) fn parse_ts(raw: &str) -> PulseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(format!("timestamp '{raw}': {e}")))
}

pub(crate) fn parse_opt_ts(raw: Option<String>) -> PulseResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}

pub(crate) fn malformed(details: impl Into<String>) -> PulseError {
    StorageError::MalformedRow {
        details: details.into(),
    }
    .into()
}

pub(crate) fn sql_err(e: rusqlite::Error) -> PulseError {
    to_storage_err(e.to_string())
}

/// Run `f` inside a transaction on the write connection; roll back on error.
pub(crate) fn with_transaction<T, F>(conn: &Connection, label: &str, f: F) -> PulseResult<T>
where
    F: FnOnce(&Connection) -> PulseResult<T>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("{label} begin: {e}")))?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("{label} commit: {e}")))?;
            Ok(value)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}
