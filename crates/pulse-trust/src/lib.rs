//! # pulse-trust
//!
//! Bounded trust for reporting identities. A report's trust starts from the
//! submitter's history (`base`), is blended 60/40 with peer-vote evidence
//! (`votes`), and is always clamped to [0.2, 1.0]. Reputation bookkeeping
//! for submissions, votes, and abuse heuristics lives in `reputation`.

pub mod base;
pub mod blur;
pub mod reputation;
pub mod scorer;
pub mod summary;
pub mod votes;

pub use scorer::TrustScorer;
pub use summary::{DeviceStatus, IdentitySummary, TrustLevel, VoteSummary};
