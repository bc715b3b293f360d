//! # pulse-decay
//!
//! Ages what aggregation produced. The decay job fades pulse tiles from the
//! intensity of their last aggregation and deletes the stale ones; the
//! maintenance job runs the expiration sweep, decays report weights, and
//! purges derived records past retention.

pub mod curve;
pub mod engine;
pub mod maintenance;

pub use engine::{DecayEngine, DecaySummary};
pub use maintenance::{MaintenanceJob, MaintenanceSummary};
