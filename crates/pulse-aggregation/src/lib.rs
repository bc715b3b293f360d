//! # pulse-aggregation
//!
//! Periodic pulse computation: valid, unexpired reports from the trailing
//! window are grouped by coarse tile, weighted by severity, trust, age, and
//! category, and upserted as one `PulseTile` per tile.

pub mod engine;
pub mod scoring;

pub use engine::{AggregationEngine, AggregationSummary};
pub use scoring::{compute_tile, TileStats};
