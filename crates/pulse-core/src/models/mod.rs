mod category;
mod event;
mod identity;
mod pattern;
mod report;
mod reputation;
mod severity;
mod status;
mod tile;
mod vote;

pub use category::SignalCategory;
pub use event::{DomainEvent, EventKind};
pub use identity::{Identity, ReputationKey};
pub use pattern::{AlertKind, AnomalyAlert, PatternKind, SafetyPattern};
pub use report::{AbuseFlags, NewReport, OwnerDeletion, ReportQuery, SafetyReport, VoteTally};
pub use reputation::Reputation;
pub use severity::Severity;
pub use status::ReportStatus;
pub use tile::{ConfidenceLevel, PulseTile};
pub use vote::Vote;
