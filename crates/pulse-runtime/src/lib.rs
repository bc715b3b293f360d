//! # pulse-runtime
//!
//! The outer surface of the safety pulse: [`PulseService`] exposes every
//! operation behind per-identity rate limiting, [`BroadcastNotifier`] fans
//! domain events out to subscribers, and [`Scheduler`] drives the periodic
//! jobs on the tokio runtime.

pub mod jobs;
pub mod notifier;
pub mod rate_limit;
pub mod scheduler;
pub mod service;

pub use jobs::{JobKind, JobReport};
pub use notifier::BroadcastNotifier;
pub use rate_limit::RateLimiter;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use service::{PulseService, SubmitReceipt, SubmitReportRequest, Updates};
