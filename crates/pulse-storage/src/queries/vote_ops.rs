//! Vote rows. Uniqueness of (report, voter) is the primary key.

use rusqlite::{params, Connection, ErrorCode, Row};

use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::models::{ReputationKey, Vote};

use super::{malformed, parse_ts, sql_err, ts};

/// Insert a vote. A primary-key collision surfaces as `AlreadyVoted`.
pub fn insert_vote(conn: &Connection, vote: &Vote) -> PulseResult<()> {
    let result = conn.execute(
        "INSERT INTO report_votes (report_id, voter_key, is_accurate, cast_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            vote.report_id,
            vote.voter.as_storage_key(),
            vote.is_accurate,
            ts(vote.cast_at),
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Err(PulseError::AlreadyVoted {
                report_id: vote.report_id.clone(),
                voter: vote.voter.fingerprint(),
            })
        }
        Err(e) => Err(sql_err(e)),
    }
}

pub fn get_vote(
    conn: &Connection,
    report_id: &str,
    voter: &ReputationKey,
) -> PulseResult<Option<Vote>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT report_id, voter_key, is_accurate, cast_at FROM report_votes
             WHERE report_id = ?1 AND voter_key = ?2",
        )
        .map_err(sql_err)?;
    let mut rows = stmt
        .query(params![report_id, voter.as_storage_key()])
        .map_err(sql_err)?;
    match rows.next().map_err(sql_err)? {
        Some(row) => Ok(Some(row_to_vote(row)?)),
        None => Ok(None),
    }
}

pub fn votes_for_report(conn: &Connection, report_id: &str) -> PulseResult<Vec<Vote>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT report_id, voter_key, is_accurate, cast_at FROM report_votes
             WHERE report_id = ?1 ORDER BY cast_at ASC",
        )
        .map_err(sql_err)?;
    let mut rows = stmt.query(params![report_id]).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        out.push(row_to_vote(row)?);
    }
    Ok(out)
}

pub fn delete_vote(conn: &Connection, report_id: &str, voter: &ReputationKey) -> PulseResult<usize> {
    conn.execute(
        "DELETE FROM report_votes WHERE report_id = ?1 AND voter_key = ?2",
        params![report_id, voter.as_storage_key()],
    )
    .map_err(sql_err)
}

pub fn delete_votes_for_report(conn: &Connection, report_id: &str) -> PulseResult<usize> {
    conn.execute(
        "DELETE FROM report_votes WHERE report_id = ?1",
        params![report_id],
    )
    .map_err(sql_err)
}

fn row_to_vote(row: &Row<'_>) -> PulseResult<Vote> {
    let voter: String = row.get("voter_key").map_err(sql_err)?;
    Ok(Vote {
        report_id: row.get("report_id").map_err(sql_err)?,
        voter: ReputationKey::parse(&voter).map_err(|_| malformed(format!("voter '{voter}'")))?,
        is_accurate: row.get("is_accurate").map_err(sql_err)?,
        cast_at: parse_ts(&row.get::<_, String>("cast_at").map_err(sql_err)?)?,
    })
}
