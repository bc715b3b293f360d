use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReputationKey;
use crate::scores::TrustScore;

/// Neutral starting trust for authenticated users.
const INITIAL_USER_TRUST: f64 = 0.5;

/// Per-device or per-user history. Created lazily, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub key: ReputationKey,
    pub submission_count: u32,
    /// Behavioral anomaly in [0, 1].
    pub anomaly_score: f64,
    /// Only tracked for authenticated users.
    pub trust_score: Option<TrustScore>,
    pub reports_confirmed: u32,
    pub reports_flagged: u32,
    pub last_submission: Option<DateTime<Utc>>,
    /// Owner may not delete another report before this instant.
    pub delete_cooldown_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reputation {
    pub fn new(key: ReputationKey, now: DateTime<Utc>) -> Self {
        let trust_score = key.is_user().then(|| TrustScore::new(INITIAL_USER_TRUST));
        Self {
            key,
            submission_count: 0,
            anomaly_score: 0.0,
            trust_score,
            reports_confirmed: 0,
            reports_flagged: 0,
            last_submission: None,
            delete_cooldown_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// No prior submissions on record.
    pub fn is_new(&self) -> bool {
        self.submission_count == 0
    }

    pub fn set_anomaly(&mut self, value: f64) {
        self.anomaly_score = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }
}
