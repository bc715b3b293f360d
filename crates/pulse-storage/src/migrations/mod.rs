//! Forward-only schema migrations, tracked in `schema_version`.

mod v001_reports_and_votes;
mod v002_reputation;
mod v003_pulse_tiles;
mod v004_patterns_and_alerts;

use rusqlite::{params, Connection};
use tracing::info;

use pulse_core::errors::{PulseResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> PulseResult<()>;

const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[
    (1, "reports_and_votes", v001_reports_and_votes::migrate),
    (2, "reputation", v002_reputation::migrate),
    (3, "pulse_tiles", v003_pulse_tiles::migrate),
    (4, "patterns_and_alerts", v004_patterns_and_alerts::migrate),
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 4;

/// Apply every migration newer than the recorded version, each in its own
/// transaction.
pub fn run_migrations(conn: &Connection) -> PulseResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut current = current_version(conn)?;
    for (version, name, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration {version} begin: {e}")))?;
        let applied = migrate(&tx).and_then(|_| {
            tx.execute(
                "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
                params![version, name],
            )
            .map_err(|e| to_storage_err(e.to_string()))
        });
        match applied {
            Ok(_) => {
                tx.commit().map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
                info!(version, name, "applied migration");
                current = *version;
            }
            Err(e) => {
                let _ = tx.rollback();
                return Err(StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                }
                .into());
            }
        }
    }
    Ok(current)
}

pub fn current_version(conn: &Connection) -> PulseResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
