//! v001: safety_reports, report_votes.

use rusqlite::Connection;

use pulse_core::errors::PulseResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> PulseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS safety_reports (
            id                      TEXT PRIMARY KEY,
            category                TEXT NOT NULL,
            severity                INTEGER NOT NULL CHECK (severity BETWEEN 1 AND 5),
            latitude                REAL NOT NULL,
            longitude               REAL NOT NULL,
            tile_id                 TEXT NOT NULL,
            created_at              TEXT NOT NULL,
            device_id               TEXT,
            user_id                 TEXT,
            reporter_key            TEXT NOT NULL,
            context                 TEXT NOT NULL DEFAULT '{}',
            trust_score             REAL NOT NULL,
            base_trust_score        REAL NOT NULL,
            confidence_score        REAL NOT NULL,
            severity_weight         REAL NOT NULL,
            true_votes              INTEGER NOT NULL DEFAULT 0 CHECK (true_votes >= 0),
            false_votes             INTEGER NOT NULL DEFAULT 0 CHECK (false_votes >= 0),
            status                  TEXT NOT NULL,
            is_valid                INTEGER NOT NULL DEFAULT 1,
            vote_window_expires_at  TEXT NOT NULL,
            expires_at              TEXT NOT NULL,
            last_activity_at        TEXT NOT NULL,
            verified_at             TEXT,
            disputed_at             TEXT,
            deleted_at              TEXT,
            delete_reason           TEXT,
            delete_cooldown_until   TEXT,
            abuse_flags             TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_reports_tile ON safety_reports(tile_id);
        CREATE INDEX IF NOT EXISTS idx_reports_created ON safety_reports(created_at);
        CREATE INDEX IF NOT EXISTS idx_reports_reporter ON safety_reports(reporter_key, created_at);
        CREATE INDEX IF NOT EXISTS idx_reports_status ON safety_reports(status, is_valid);

        CREATE TABLE IF NOT EXISTS report_votes (
            report_id   TEXT NOT NULL,
            voter_key   TEXT NOT NULL,
            is_accurate INTEGER NOT NULL,
            cast_at     TEXT NOT NULL,
            PRIMARY KEY (report_id, voter_key),
            FOREIGN KEY (report_id) REFERENCES safety_reports(id) ON DELETE CASCADE
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
