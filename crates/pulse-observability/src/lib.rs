//! # pulse-observability
//!
//! Tracing setup for the safety pulse services, span macros for the main
//! operations, structured log events, and a registry of background job
//! runs that rolls up into a [`HealthReport`].

pub mod health;
pub mod tracing_setup;

pub use health::{HealthReport, HealthStatus, JobHealth, JobOutcome, JobRegistry};
pub use tracing_setup::{init_from_config, init_tracing, init_tracing_with_filter};
