use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::models::ReportStatus;

/// Coarse classification surfaced to callers at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Conflict,
    PermissionDenied,
    FailedPrecondition,
    NotFound,
    ResourceExhausted,
    Internal,
}

/// Top-level error for every safety pulse operation.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("voter {voter} already voted on report {report_id}")]
    AlreadyVoted { report_id: String, voter: String },

    #[error("cannot vote on your own report {report_id}")]
    SelfVote { report_id: String },

    #[error("voting window for report {report_id} has closed")]
    VoteWindowClosed { report_id: String },

    #[error("report {report_id} is {status} and no longer accepts changes")]
    ReportTerminal {
        report_id: String,
        status: ReportStatus,
    },

    #[error("only the report owner can delete report {report_id}")]
    NotOwner { report_id: String },

    #[error("cannot delete verified report {report_id} with confidence {confidence:.2}")]
    ProtectedReport { report_id: String, confidence: f64 },

    #[error("please wait {remaining_minutes} minutes before deleting another report")]
    DeleteCooldown { remaining_minutes: i64 },

    #[error("rate limit exceeded for {identity}: retry in {retry_after_secs}s")]
    RateLimited {
        identity: String,
        retry_after_secs: u64,
    },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PulseError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Map the specific failure onto the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::ConfigError(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyVoted { .. } => ErrorKind::Conflict,
            Self::SelfVote { .. }
            | Self::NotOwner { .. }
            | Self::ProtectedReport { .. }
            | Self::DeleteCooldown { .. } => ErrorKind::PermissionDenied,
            Self::VoteWindowClosed { .. } | Self::ReportTerminal { .. } => {
                ErrorKind::FailedPrecondition
            }
            Self::RateLimited { .. } => ErrorKind::ResourceExhausted,
            Self::StorageError(_) | Self::SerializationError(_) => ErrorKind::Internal,
        }
    }
}
