//! v002: reputations.

use rusqlite::Connection;

use pulse_core::errors::PulseResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> PulseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reputations (
            reputation_key          TEXT PRIMARY KEY,
            submission_count        INTEGER NOT NULL DEFAULT 0,
            anomaly_score           REAL NOT NULL DEFAULT 0.0,
            trust_score             REAL,
            reports_confirmed       INTEGER NOT NULL DEFAULT 0,
            reports_flagged         INTEGER NOT NULL DEFAULT 0,
            last_submission         TEXT,
            delete_cooldown_until   TEXT,
            created_at              TEXT NOT NULL,
            updated_at              TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
