use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a domain event handed to the external notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ReportAccepted,
    VoteTallyChanged,
    ReportStatusChanged,
    ReportDeleted,
    PulseTileCreated,
    PulseTileUpdated,
    PulseTileExpired,
    SpikeDetected,
    AnomalyAlert,
    LocationAlert,
}

/// Structured, transport-agnostic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub subject_id: String,
    pub fields: BTreeMap<String, f64>,
    /// Optional short label, e.g. the new status or dominant reason.
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(kind: EventKind, subject_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            fields: BTreeMap::new(),
            detail: None,
            timestamp,
        }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
