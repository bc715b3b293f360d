pub mod config;
pub mod constants;
pub mod errors;
pub mod geo;
pub mod models;
pub mod scores;
pub mod traits;

pub use config::PulseConfig;
pub use errors::{ErrorKind, PulseError, PulseResult};
pub use scores::{Confidence, TrustScore};
