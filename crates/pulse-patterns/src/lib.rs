//! # pulse-patterns
//!
//! Heuristic pattern detection over recent reports: spikes, clusters,
//! anomalous identities and tiles, risk zones, and point-in-time personal
//! alerts. `smart` carries the per-report smart score and tile safety score.
//! `PatternDetector` wires the pure detectors to storage and persists the
//! results worth keeping.

pub mod detector;
pub mod detectors;
pub mod smart;
pub mod types;

pub use detector::PatternDetector;
pub use types::*;
