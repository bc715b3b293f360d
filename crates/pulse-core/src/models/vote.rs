use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReputationKey;

/// A single peer judgment on a report. Unique per (report, voter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub report_id: String,
    pub voter: ReputationKey,
    pub is_accurate: bool,
    pub cast_at: DateTime<Utc>,
}
