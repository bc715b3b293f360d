//! Pulse tile rows. Upserts are keyed by tile id.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use pulse_core::errors::PulseResult;
use pulse_core::geo::{BoundingBox, Coordinate};
use pulse_core::models::{ConfidenceLevel, PulseTile};

use super::{malformed, parse_ts, sql_err, ts};

const TILE_COLUMNS: &str = "tile_id, center_lat, center_lng, intensity, base_intensity,
    radius_m, confidence, confidence_score, dominant_reason, signal_count, last_updated,
    expires_at";

pub fn upsert_tile(conn: &Connection, tile: &PulseTile) -> PulseResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO pulse_tiles ({TILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(tile_id) DO UPDATE SET
                center_lat = excluded.center_lat,
                center_lng = excluded.center_lng,
                intensity = excluded.intensity,
                base_intensity = excluded.base_intensity,
                radius_m = excluded.radius_m,
                confidence = excluded.confidence,
                confidence_score = excluded.confidence_score,
                dominant_reason = excluded.dominant_reason,
                signal_count = excluded.signal_count,
                last_updated = excluded.last_updated,
                expires_at = excluded.expires_at"
        ),
        params![
            tile.tile_id,
            tile.center.lat,
            tile.center.lng,
            tile.intensity,
            tile.base_intensity,
            tile.radius_m,
            tile.confidence.as_str(),
            tile.confidence_score,
            tile.dominant_reason,
            tile.signal_count,
            ts(tile.last_updated),
            ts(tile.expires_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get_tile(conn: &Connection, tile_id: &str) -> PulseResult<Option<PulseTile>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {TILE_COLUMNS} FROM pulse_tiles WHERE tile_id = ?1"
        ))
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![tile_id]).map_err(sql_err)?;
    match rows.next().map_err(sql_err)? {
        Some(row) => Ok(Some(row_to_tile(row)?)),
        None => Ok(None),
    }
}

pub fn query_tiles(
    conn: &Connection,
    bbox: Option<&BoundingBox>,
    active_at: Option<DateTime<Utc>>,
) -> PulseResult<Vec<PulseTile>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(now) = active_at {
        values.push(Value::Text(ts(now)));
        clauses.push(format!("expires_at > ?{}", values.len()));
    }
    if let Some(b) = bbox {
        values.extend([
            Value::Real(b.min_lat),
            Value::Real(b.max_lat),
            Value::Real(b.min_lng),
            Value::Real(b.max_lng),
        ]);
        let n = values.len();
        clauses.push(format!(
            "center_lat BETWEEN ?{} AND ?{} AND center_lng BETWEEN ?{} AND ?{}",
            n - 3,
            n - 2,
            n - 1,
            n
        ));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {TILE_COLUMNS} FROM pulse_tiles {where_sql} ORDER BY intensity DESC, tile_id ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
    let mut rows = stmt.query(params_from_iter(values.iter())).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        out.push(row_to_tile(row)?);
    }
    Ok(out)
}

/// Write decayed intensity, radius and expiry only if the row still carries
/// the `last_updated` it was read with.
pub fn update_decayed_tile(conn: &Connection, tile: &PulseTile) -> PulseResult<bool> {
    let n = conn
        .execute(
            "UPDATE pulse_tiles SET intensity = ?2, radius_m = ?3, expires_at = ?4
             WHERE tile_id = ?1 AND last_updated = ?5",
            params![
                tile.tile_id,
                tile.intensity,
                tile.radius_m,
                ts(tile.expires_at),
                ts(tile.last_updated),
            ],
        )
        .map_err(sql_err)?;
    Ok(n > 0)
}

pub fn delete_tile_if_unchanged(
    conn: &Connection,
    tile_id: &str,
    last_updated: DateTime<Utc>,
) -> PulseResult<bool> {
    let n = conn
        .execute(
            "DELETE FROM pulse_tiles WHERE tile_id = ?1 AND last_updated = ?2",
            params![tile_id, ts(last_updated)],
        )
        .map_err(sql_err)?;
    Ok(n > 0)
}

pub fn delete_empty_tiles(conn: &Connection, cutoff: DateTime<Utc>) -> PulseResult<usize> {
    conn.execute(
        "DELETE FROM pulse_tiles WHERE signal_count = 0 AND last_updated < ?1",
        params![ts(cutoff)],
    )
    .map_err(sql_err)
}

/// Delete tiles whose `expires_at` has passed and return their ids.
pub fn delete_expired_tiles(conn: &Connection, now: DateTime<Utc>) -> PulseResult<Vec<String>> {
    let now = ts(now);
    let ids = {
        let mut stmt = conn
            .prepare_cached("SELECT tile_id FROM pulse_tiles WHERE expires_at <= ?1")
            .map_err(sql_err)?;
        let mut rows = stmt.query(params![now]).map_err(sql_err)?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().map_err(sql_err)? {
            ids.push(row.get::<_, String>(0).map_err(sql_err)?);
        }
        ids
    };
    conn.execute("DELETE FROM pulse_tiles WHERE expires_at <= ?1", params![now])
        .map_err(sql_err)?;
    Ok(ids)
}

fn row_to_tile(row: &Row<'_>) -> PulseResult<PulseTile> {
    let confidence: String = row.get("confidence").map_err(sql_err)?;
    Ok(PulseTile {
        tile_id: row.get("tile_id").map_err(sql_err)?,
        center: Coordinate {
            lat: row.get("center_lat").map_err(sql_err)?,
            lng: row.get("center_lng").map_err(sql_err)?,
        },
        intensity: row.get("intensity").map_err(sql_err)?,
        base_intensity: row.get("base_intensity").map_err(sql_err)?,
        radius_m: row.get("radius_m").map_err(sql_err)?,
        confidence: confidence
            .parse::<ConfidenceLevel>()
            .map_err(|_| malformed(format!("confidence level '{confidence}'")))?,
        confidence_score: row.get("confidence_score").map_err(sql_err)?,
        dominant_reason: row.get("dominant_reason").map_err(sql_err)?,
        signal_count: row.get("signal_count").map_err(sql_err)?,
        last_updated: parse_ts(&row.get::<_, String>("last_updated").map_err(sql_err)?)?,
        expires_at: parse_ts(&row.get::<_, String>("expires_at").map_err(sql_err)?)?,
    })
}
