//! # pulse-lifecycle
//!
//! Owns every report mutation outside aggregation: submission, votes and
//! their removal, owner deletion, and the expiration sweep. Status moves
//! `pending → {verified, disputed, expired}`, any live state may be deleted,
//! and nothing leaves `deleted`.

pub mod confidence;
pub mod engine;
pub mod permissions;
pub mod transitions;

pub use engine::{ExpirationSummary, LifecycleEngine, RefreshSummary, VoteOutcome};
