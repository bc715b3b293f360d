//! v003: pulse_tiles.

use rusqlite::Connection;

use pulse_core::errors::PulseResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> PulseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pulse_tiles (
            tile_id             TEXT PRIMARY KEY,
            center_lat          REAL NOT NULL,
            center_lng          REAL NOT NULL,
            intensity           REAL NOT NULL,
            base_intensity      REAL NOT NULL,
            radius_m            INTEGER NOT NULL,
            confidence          TEXT NOT NULL,
            confidence_score    REAL NOT NULL,
            dominant_reason     TEXT,
            signal_count        INTEGER NOT NULL DEFAULT 0,
            last_updated        TEXT NOT NULL,
            expires_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tiles_expires ON pulse_tiles(expires_at);
        CREATE INDEX IF NOT EXISTS idx_tiles_center ON pulse_tiles(center_lat, center_lng);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
