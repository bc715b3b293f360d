//! Derived patterns and alerts with bounded retention.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use pulse_core::errors::PulseResult;
use pulse_core::geo::Coordinate;
use pulse_core::models::{AlertKind, AnomalyAlert, PatternKind, SafetyPattern};

use super::{malformed, parse_ts, sql_err, ts};

pub fn insert_pattern(conn: &Connection, pattern: &SafetyPattern) -> PulseResult<()> {
    conn.execute(
        "INSERT INTO safety_patterns (id, kind, tile_id, center_lat, center_lng, intensity, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            pattern.id,
            pattern.kind.as_str(),
            pattern.tile_id,
            pattern.center.lat,
            pattern.center.lng,
            pattern.intensity,
            serde_json::to_string(&pattern.data)?,
            ts(pattern.created_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn list_patterns(conn: &Connection, since: DateTime<Utc>) -> PulseResult<Vec<SafetyPattern>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, kind, tile_id, center_lat, center_lng, intensity, data, created_at
             FROM safety_patterns WHERE created_at >= ?1
             ORDER BY intensity DESC, created_at DESC",
        )
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![ts(since)]).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        out.push(row_to_pattern(row)?);
    }
    Ok(out)
}

pub fn has_pattern_since(
    conn: &Connection,
    kind: PatternKind,
    tile_id: &str,
    since: DateTime<Utc>,
) -> PulseResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM safety_patterns WHERE kind = ?1 AND tile_id = ?2 AND created_at >= ?3)",
        params![kind.as_str(), tile_id, ts(since)],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

pub fn insert_alert(conn: &Connection, alert: &AnomalyAlert) -> PulseResult<()> {
    conn.execute(
        "INSERT INTO anomaly_alerts (id, kind, tile_id, center_lat, center_lng, severity, message, data, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            alert.id,
            alert.kind.as_str(),
            alert.tile_id,
            alert.center.map(|c| c.lat),
            alert.center.map(|c| c.lng),
            alert.severity,
            alert.message,
            serde_json::to_string(&alert.data)?,
            alert.is_active,
            ts(alert.created_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn list_alerts(
    conn: &Connection,
    since: DateTime<Utc>,
    active_only: bool,
) -> PulseResult<Vec<AnomalyAlert>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, kind, tile_id, center_lat, center_lng, severity, message, data, is_active, created_at
             FROM anomaly_alerts WHERE created_at >= ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY created_at DESC",
        )
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![ts(since), active_only]).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        out.push(row_to_alert(row)?);
    }
    Ok(out)
}

pub fn has_active_alert(conn: &Connection, kind: AlertKind, tile_id: &str) -> PulseResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM anomaly_alerts WHERE kind = ?1 AND tile_id = ?2 AND is_active = 1)",
        params![kind.as_str(), tile_id],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

pub fn purge_patterns_before(conn: &Connection, cutoff: DateTime<Utc>) -> PulseResult<usize> {
    conn.execute(
        "DELETE FROM safety_patterns WHERE created_at < ?1",
        params![ts(cutoff)],
    )
    .map_err(sql_err)
}

pub fn purge_alerts_before(conn: &Connection, cutoff: DateTime<Utc>) -> PulseResult<usize> {
    conn.execute(
        "DELETE FROM anomaly_alerts WHERE created_at < ?1",
        params![ts(cutoff)],
    )
    .map_err(sql_err)
}

fn row_to_pattern(row: &Row<'_>) -> PulseResult<SafetyPattern> {
    let kind: String = row.get("kind").map_err(sql_err)?;
    let data: String = row.get("data").map_err(sql_err)?;
    Ok(SafetyPattern {
        id: row.get("id").map_err(sql_err)?,
        kind: kind
            .parse::<PatternKind>()
            .map_err(|_| malformed(format!("pattern kind '{kind}'")))?,
        tile_id: row.get("tile_id").map_err(sql_err)?,
        center: Coordinate {
            lat: row.get("center_lat").map_err(sql_err)?,
            lng: row.get("center_lng").map_err(sql_err)?,
        },
        intensity: row.get("intensity").map_err(sql_err)?,
        data: serde_json::from_str(&data)?,
        created_at: parse_ts(&row.get::<_, String>("created_at").map_err(sql_err)?)?,
    })
}

fn row_to_alert(row: &Row<'_>) -> PulseResult<AnomalyAlert> {
    let kind: String = row.get("kind").map_err(sql_err)?;
    let data: String = row.get("data").map_err(sql_err)?;
    let lat: Option<f64> = row.get("center_lat").map_err(sql_err)?;
    let lng: Option<f64> = row.get("center_lng").map_err(sql_err)?;
    Ok(AnomalyAlert {
        id: row.get("id").map_err(sql_err)?,
        kind: kind
            .parse::<AlertKind>()
            .map_err(|_| malformed(format!("alert kind '{kind}'")))?,
        tile_id: row.get("tile_id").map_err(sql_err)?,
        center: lat.zip(lng).map(|(lat, lng)| Coordinate { lat, lng }),
        severity: row.get("severity").map_err(sql_err)?,
        message: row.get("message").map_err(sql_err)?,
        data: serde_json::from_str(&data)?,
        is_active: row.get("is_active").map_err(sql_err)?,
        created_at: parse_ts(&row.get::<_, String>("created_at").map_err(sql_err)?)?,
    })
}
