//! Reputation rows, keyed by `device:<id>` / `user:<id>`.

use rusqlite::{params, Connection, Row};

use pulse_core::errors::PulseResult;
use pulse_core::models::{Reputation, ReputationKey};
use pulse_core::TrustScore;

use super::{malformed, opt_ts, parse_opt_ts, parse_ts, sql_err, ts};

pub fn get_reputation(conn: &Connection, key: &ReputationKey) -> PulseResult<Option<Reputation>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT reputation_key, submission_count, anomaly_score, trust_score,
                    reports_confirmed, reports_flagged, last_submission,
                    delete_cooldown_until, created_at, updated_at
             FROM reputations WHERE reputation_key = ?1",
        )
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![key.as_storage_key()]).map_err(sql_err)?;
    match rows.next().map_err(sql_err)? {
        Some(row) => Ok(Some(row_to_reputation(row)?)),
        None => Ok(None),
    }
}

pub fn upsert_reputation(conn: &Connection, rep: &Reputation) -> PulseResult<()> {
    conn.execute(
        "INSERT INTO reputations (
            reputation_key, submission_count, anomaly_score, trust_score,
            reports_confirmed, reports_flagged, last_submission,
            delete_cooldown_until, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(reputation_key) DO UPDATE SET
            submission_count = excluded.submission_count,
            anomaly_score = excluded.anomaly_score,
            trust_score = excluded.trust_score,
            reports_confirmed = excluded.reports_confirmed,
            reports_flagged = excluded.reports_flagged,
            last_submission = excluded.last_submission,
            delete_cooldown_until = excluded.delete_cooldown_until,
            updated_at = excluded.updated_at",
        params![
            rep.key.as_storage_key(),
            rep.submission_count,
            rep.anomaly_score,
            rep.trust_score.map(|t| t.value()),
            rep.reports_confirmed,
            rep.reports_flagged,
            opt_ts(rep.last_submission),
            opt_ts(rep.delete_cooldown_until),
            ts(rep.created_at),
            ts(rep.updated_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn row_to_reputation(row: &Row<'_>) -> PulseResult<Reputation> {
    let key: String = row.get("reputation_key").map_err(sql_err)?;
    let trust: Option<f64> = row.get("trust_score").map_err(sql_err)?;
    Ok(Reputation {
        key: ReputationKey::parse(&key).map_err(|_| malformed(format!("reputation key '{key}'")))?,
        submission_count: row.get("submission_count").map_err(sql_err)?,
        anomaly_score: row.get("anomaly_score").map_err(sql_err)?,
        trust_score: trust.map(TrustScore::new),
        reports_confirmed: row.get("reports_confirmed").map_err(sql_err)?,
        reports_flagged: row.get("reports_flagged").map_err(sql_err)?,
        last_submission: parse_opt_ts(row.get("last_submission").map_err(sql_err)?)?,
        delete_cooldown_until: parse_opt_ts(row.get("delete_cooldown_until").map_err(sql_err)?)?,
        created_at: parse_ts(&row.get::<_, String>("created_at").map_err(sql_err)?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at").map_err(sql_err)?)?,
    })
}
