use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PulseError;

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Verified,
    Disputed,
    Expired,
    Deleted,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 5] = [
        Self::Pending,
        Self::Verified,
        Self::Disputed,
        Self::Expired,
        Self::Deleted,
    ];

    /// Expired and deleted reports accept no further votes.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Deleted)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Verified/disputed may fall back to pending only through vote removal.
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        match (self, next) {
            (Deleted, _) => false,
            (_, Deleted) => true,
            (Pending, Verified | Disputed | Expired) => true,
            (Verified | Disputed, Pending | Expired) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Disputed => "disputed",
            Self::Expired => "expired",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| PulseError::invalid(format!("unknown report status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::ReportStatus::*;

    #[test]
    fn deleted_is_a_sink() {
        for next in super::ReportStatus::ALL {
            assert!(!Deleted.can_transition_to(next));
        }
        assert!(Expired.can_transition_to(Deleted));
    }

    #[test]
    fn pending_fans_out() {
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Disputed));
        assert!(Pending.can_transition_to(Expired));
        assert!(!Expired.can_transition_to(Pending));
        assert!(!Verified.can_transition_to(Disputed));
    }
}
