use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identity, ReportStatus, Severity, SignalCategory};
use crate::errors::{PulseError, PulseResult};
use crate::geo::{BoundingBox, Coordinate, TileId};
use crate::scores::{Confidence, TrustScore};

/// Accurate/inaccurate vote counts on a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub true_count: u32,
    pub false_count: u32,
}

impl VoteTally {
    pub fn total(&self) -> u32 {
        self.true_count + self.false_count
    }

    /// Share of votes that flagged the report as inaccurate.
    pub fn false_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => f64::from(self.false_count) / f64::from(n),
        }
    }

    pub fn record(&mut self, is_accurate: bool) {
        if is_accurate {
            self.true_count += 1;
        } else {
            self.false_count += 1;
        }
    }

    /// Undo a previously recorded vote. Fails rather than going negative.
    pub fn retract(&mut self, is_accurate: bool) -> PulseResult<()> {
        let slot = if is_accurate {
            &mut self.true_count
        } else {
            &mut self.false_count
        };
        *slot = slot.checked_sub(1).ok_or_else(|| {
            PulseError::invalid(format!(
                "cannot retract {} vote from an empty tally",
                if is_accurate { "accurate" } else { "inaccurate" }
            ))
        })?;
        Ok(())
    }
}

/// Owner-initiated soft deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerDeletion {
    pub deleted_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub cooldown_expires_at: DateTime<Utc>,
}

/// Abuse heuristics that fired when the report was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbuseFlags {
    pub reasons: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

/// A crowd-sourced safety report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub id: String,
    pub category: SignalCategory,
    pub severity: Severity,
    /// Privacy-blurred position.
    pub latitude: f64,
    pub longitude: f64,
    pub tile_id: TileId,
    pub created_at: DateTime<Utc>,
    pub reporter: Identity,
    pub context: BTreeMap<String, String>,
    /// Current trust: the base trust blended with vote evidence.
    pub trust_score: TrustScore,
    /// Trust assigned at submission.
    pub base_trust_score: TrustScore,
    pub confidence_score: Confidence,
    pub severity_weight: f64,
    pub votes: VoteTally,
    pub status: ReportStatus,
    pub is_valid: bool,
    pub vote_window_expires_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub disputed_at: Option<DateTime<Utc>>,
    pub deletion: Option<OwnerDeletion>,
    pub abuse_flags: Option<AbuseFlags>,
}

impl SafetyReport {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    /// Still valid, not terminal, and not past `expires_at`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_valid && !self.status.is_terminal() && self.expires_at > now
    }

    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.created_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
    }

    pub fn owned_by(&self, identity: &Identity) -> bool {
        self.reporter.same_actor(identity)
    }
}

/// Submission request before trust and lifecycle fields are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub category: SignalCategory,
    pub severity: Severity,
    /// Raw, unblurred position.
    pub latitude: f64,
    pub longitude: f64,
    pub reporter: Identity,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

/// Snapshot filter for report scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    pub bbox: Option<BoundingBox>,
    pub tile_prefix: Option<String>,
    /// Only reports that are valid, non-terminal, and unexpired at this instant.
    pub active_at: Option<DateTime<Utc>>,
    pub reporter: Option<super::ReputationKey>,
    pub statuses: Option<Vec<ReportStatus>>,
    pub limit: Option<usize>,
}

impl ReportQuery {
    pub fn active_since(now: DateTime<Utc>, since: DateTime<Utc>) -> Self {
        Self {
            created_after: Some(since),
            active_at: Some(now),
            ..Self::default()
        }
    }

    pub fn within(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn in_tile(mut self, prefix: impl Into<String>) -> Self {
        self.tile_prefix = Some(prefix.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_never_goes_negative() {
        let mut t = VoteTally::default();
        t.record(true);
        t.record(false);
        assert_eq!(t.total(), 2);
        assert!((t.false_ratio() - 0.5).abs() < 1e-12);
        t.retract(true).unwrap();
        assert!(t.retract(true).is_err());
        assert_eq!(t, VoteTally { true_count: 0, false_count: 1 });
    }
}
