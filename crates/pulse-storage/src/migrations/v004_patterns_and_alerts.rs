//! v004: safety_patterns, anomaly_alerts.

use rusqlite::Connection;

use pulse_core::errors::PulseResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> PulseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS safety_patterns (
            id          TEXT PRIMARY KEY,
            kind        TEXT NOT NULL,
            tile_id     TEXT NOT NULL,
            center_lat  REAL NOT NULL,
            center_lng  REAL NOT NULL,
            intensity   REAL NOT NULL,
            data        TEXT NOT NULL DEFAULT '{}',
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_patterns_created ON safety_patterns(created_at);
        CREATE INDEX IF NOT EXISTS idx_patterns_tile ON safety_patterns(kind, tile_id, created_at);

        CREATE TABLE IF NOT EXISTS anomaly_alerts (
            id          TEXT PRIMARY KEY,
            kind        TEXT NOT NULL,
            tile_id     TEXT,
            center_lat  REAL,
            center_lng  REAL,
            severity    REAL NOT NULL,
            message     TEXT NOT NULL,
            data        TEXT NOT NULL DEFAULT '{}',
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_alerts_created ON anomaly_alerts(created_at);
        CREATE INDEX IF NOT EXISTS idx_alerts_tile ON anomaly_alerts(kind, tile_id, is_active);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
