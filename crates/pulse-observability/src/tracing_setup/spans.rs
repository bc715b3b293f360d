//! Span definitions per operation: submission, vote, aggregation, decay,
//! maintenance, pattern analysis.

/// Create a report submission span.
#[macro_export]
macro_rules! submission_span {
    ($category:expr, $severity:expr) => {
        tracing::info_span!("pulse.submission", category = %$category, severity = $severity)
    };
}

/// Create a vote span.
#[macro_export]
macro_rules! vote_span {
    ($report_id:expr, $is_accurate:expr) => {
        tracing::info_span!("pulse.vote", report_id = %$report_id, is_accurate = $is_accurate)
    };
}

/// Create an aggregation span.
#[macro_export]
macro_rules! aggregation_span {
    ($trigger:expr) => {
        tracing::info_span!("pulse.aggregation", trigger = %$trigger)
    };
}

/// Create a decay span.
#[macro_export]
macro_rules! decay_span {
    ($trigger:expr) => {
        tracing::info_span!("pulse.decay", trigger = %$trigger)
    };
}

/// Create a maintenance span.
#[macro_export]
macro_rules! maintenance_span {
    ($trigger:expr) => {
        tracing::info_span!("pulse.maintenance", trigger = %$trigger)
    };
}

/// Create a pattern analysis span.
#[macro_export]
macro_rules! pattern_span {
    ($trigger:expr) => {
        tracing::info_span!("pulse.patterns", trigger = %$trigger)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SUBMISSION: &str = "pulse.submission";
    pub const VOTE: &str = "pulse.vote";
    pub const AGGREGATION: &str = "pulse.aggregation";
    pub const DECAY: &str = "pulse.decay";
    pub const MAINTENANCE: &str = "pulse.maintenance";
    pub const PATTERNS: &str = "pulse.patterns";
}
