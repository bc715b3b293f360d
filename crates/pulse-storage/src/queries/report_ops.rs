//! Insert, update, get, and snapshot queries for safety reports.

use std::collections::BTreeMap;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use pulse_core::constants::MAX_SNAPSHOT_ROWS;
use pulse_core::errors::PulseResult;
use pulse_core::models::{
    AbuseFlags, Identity, OwnerDeletion, ReportQuery, ReportStatus, SafetyReport, Severity,
    VoteTally,
};
use pulse_core::{Confidence, TrustScore};

use super::{malformed, opt_ts, parse_opt_ts, parse_ts, sql_err, ts};

const REPORT_COLUMNS: &str = "id, category, severity, latitude, longitude, tile_id, created_at,
    device_id, user_id, context, trust_score, base_trust_score, confidence_score,
    severity_weight, true_votes, false_votes, status, is_valid, vote_window_expires_at,
    expires_at, last_activity_at, verified_at, disputed_at, deleted_at, delete_reason,
    delete_cooldown_until, abuse_flags";

pub fn insert_report(conn: &Connection, report: &SafetyReport) -> PulseResult<()> {
    let context = serde_json::to_string(&report.context)?;
    let abuse = report
        .abuse_flags
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let deletion = report.deletion.as_ref();
    conn.execute(
        &format!(
            "INSERT INTO safety_reports ({REPORT_COLUMNS}, reporter_key) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
            )"
        ),
        params![
            report.id,
            report.category.as_str(),
            report.severity.value(),
            report.latitude,
            report.longitude,
            report.tile_id,
            ts(report.created_at),
            report.reporter.device_id,
            report.reporter.user_id,
            context,
            report.trust_score.value(),
            report.base_trust_score.value(),
            report.confidence_score.value(),
            report.severity_weight,
            report.votes.true_count,
            report.votes.false_count,
            report.status.as_str(),
            report.is_valid,
            ts(report.vote_window_expires_at),
            ts(report.expires_at),
            ts(report.last_activity_at),
            opt_ts(report.verified_at),
            opt_ts(report.disputed_at),
            deletion.map(|d| ts(d.deleted_at)),
            deletion.and_then(|d| d.reason.clone()),
            deletion.map(|d| ts(d.cooldown_expires_at)),
            abuse,
            report.reporter.reputation_key().as_storage_key(),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Write back every mutable column of a report.
pub fn update_report(conn: &Connection, report: &SafetyReport) -> PulseResult<()> {
    let abuse = report
        .abuse_flags
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let deletion = report.deletion.as_ref();
    let changed = conn
        .execute(
            "UPDATE safety_reports SET
                trust_score = ?2, confidence_score = ?3, severity_weight = ?4,
                true_votes = ?5, false_votes = ?6, status = ?7, is_valid = ?8,
                expires_at = ?9, last_activity_at = ?10, verified_at = ?11, disputed_at = ?12,
                deleted_at = ?13, delete_reason = ?14, delete_cooldown_until = ?15,
                abuse_flags = ?16
             WHERE id = ?1",
            params![
                report.id,
                report.trust_score.value(),
                report.confidence_score.value(),
                report.severity_weight,
                report.votes.true_count,
                report.votes.false_count,
                report.status.as_str(),
                report.is_valid,
                ts(report.expires_at),
                ts(report.last_activity_at),
                opt_ts(report.verified_at),
                opt_ts(report.disputed_at),
                deletion.map(|d| ts(d.deleted_at)),
                deletion.and_then(|d| d.reason.clone()),
                deletion.map(|d| ts(d.cooldown_expires_at)),
                abuse,
            ],
        )
        .map_err(sql_err)?;
    if changed == 0 {
        return Err(pulse_core::PulseError::not_found("report", &report.id));
    }
    Ok(())
}

pub fn get_report(conn: &Connection, id: &str) -> PulseResult<Option<SafetyReport>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {REPORT_COLUMNS} FROM safety_reports WHERE id = ?1"
        ))
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![id]).map_err(sql_err)?;
    match rows.next().map_err(sql_err)? {
        Some(row) => Ok(Some(row_to_report(row)?)),
        None => Ok(None),
    }
}

/// Snapshot scan, ordered by creation time.
pub fn query_reports(conn: &Connection, query: &ReportQuery) -> PulseResult<Vec<SafetyReport>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(after) = query.created_after {
        values.push(Value::Text(ts(after)));
        clauses.push(format!("created_at >= ?{}", values.len()));
    }
    if let Some(now) = query.active_at {
        values.push(Value::Text(ts(now)));
        clauses.push(format!(
            "is_valid = 1 AND status NOT IN ('expired', 'deleted') AND expires_at > ?{}",
            values.len()
        ));
    }
    if let Some(bbox) = &query.bbox {
        values.extend([
            Value::Real(bbox.min_lat),
            Value::Real(bbox.max_lat),
            Value::Real(bbox.min_lng),
            Value::Real(bbox.max_lng),
        ]);
        let n = values.len();
        clauses.push(format!(
            "latitude BETWEEN ?{} AND ?{} AND longitude BETWEEN ?{} AND ?{}",
            n - 3,
            n - 2,
            n - 1,
            n
        ));
    }
    if let Some(prefix) = &query.tile_prefix {
        values.push(Value::Integer(prefix.len() as i64));
        values.push(Value::Text(prefix.clone()));
        let n = values.len();
        clauses.push(format!("substr(tile_id, 1, ?{}) = ?{}", n - 1, n));
    }
    if let Some(reporter) = &query.reporter {
        values.push(Value::Text(reporter.as_storage_key()));
        clauses.push(format!("reporter_key = ?{}", values.len()));
    }
    if let Some(statuses) = &query.statuses {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let mut slots = Vec::with_capacity(statuses.len());
        for status in statuses {
            values.push(Value::Text(status.as_str().to_string()));
            slots.push(format!("?{}", values.len()));
        }
        clauses.push(format!("status IN ({})", slots.join(", ")));
    }

    let limit = query.limit.unwrap_or(MAX_SNAPSHOT_ROWS).min(MAX_SNAPSHOT_ROWS);
    values.push(Value::Integer(limit as i64));
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {REPORT_COLUMNS} FROM safety_reports {where_sql}
         ORDER BY created_at ASC, id ASC LIMIT ?{}",
        values.len()
    );

    let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
    let mut rows = stmt.query(params_from_iter(values.iter())).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        out.push(row_to_report(row)?);
    }
    Ok(out)
}

fn row_to_report(row: &Row<'_>) -> PulseResult<SafetyReport> {
    let category: String = row.get("category").map_err(sql_err)?;
    let severity: u8 = row.get("severity").map_err(sql_err)?;
    let status: String = row.get("status").map_err(sql_err)?;
    let context: String = row.get("context").map_err(sql_err)?;
    let context: BTreeMap<String, String> = serde_json::from_str(&context)?;
    let abuse: Option<String> = row.get("abuse_flags").map_err(sql_err)?;
    let abuse_flags: Option<AbuseFlags> = abuse.as_deref().map(serde_json::from_str).transpose()?;

    let deleted_at = parse_opt_ts(row.get("deleted_at").map_err(sql_err)?)?;
    let cooldown = parse_opt_ts(row.get("delete_cooldown_until").map_err(sql_err)?)?;
    let deletion = match (deleted_at, cooldown) {
        (Some(deleted_at), Some(cooldown_expires_at)) => Some(OwnerDeletion {
            deleted_at,
            reason: row.get("delete_reason").map_err(sql_err)?,
            cooldown_expires_at,
        }),
        _ => None,
    };

    Ok(SafetyReport {
        id: row.get("id").map_err(sql_err)?,
        category: category
            .parse()
            .map_err(|_| malformed(format!("category '{category}'")))?,
        severity: Severity::new(severity).map_err(|_| malformed(format!("severity {severity}")))?,
        latitude: row.get("latitude").map_err(sql_err)?,
        longitude: row.get("longitude").map_err(sql_err)?,
        tile_id: row.get("tile_id").map_err(sql_err)?,
        created_at: parse_ts(&row.get::<_, String>("created_at").map_err(sql_err)?)?,
        reporter: Identity {
            device_id: row.get("device_id").map_err(sql_err)?,
            user_id: row.get("user_id").map_err(sql_err)?,
        },
        context,
        trust_score: TrustScore::new(row.get("trust_score").map_err(sql_err)?),
        base_trust_score: TrustScore::new(row.get("base_trust_score").map_err(sql_err)?),
        confidence_score: Confidence::new(row.get("confidence_score").map_err(sql_err)?),
        severity_weight: row.get("severity_weight").map_err(sql_err)?,
        votes: VoteTally {
            true_count: row.get("true_votes").map_err(sql_err)?,
            false_count: row.get("false_votes").map_err(sql_err)?,
        },
        status: status
            .parse::<ReportStatus>()
            .map_err(|_| malformed(format!("status '{status}'")))?,
        is_valid: row.get("is_valid").map_err(sql_err)?,
        vote_window_expires_at: parse_ts(
            &row.get::<_, String>("vote_window_expires_at").map_err(sql_err)?,
        )?,
        expires_at: parse_ts(&row.get::<_, String>("expires_at").map_err(sql_err)?)?,
        last_activity_at: parse_ts(&row.get::<_, String>("last_activity_at").map_err(sql_err)?)?,
        verified_at: parse_opt_ts(row.get("verified_at").map_err(sql_err)?)?,
        disputed_at: parse_opt_ts(row.get("disputed_at").map_err(sql_err)?)?,
        deletion,
        abuse_flags,
    })
}
