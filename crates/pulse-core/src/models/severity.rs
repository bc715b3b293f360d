use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_SEVERITY, MIN_SEVERITY};
use crate::errors::{PulseError, PulseResult};

/// Reporter-assigned severity on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub fn new(value: u8) -> PulseResult<Self> {
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&value) {
            return Err(PulseError::invalid(format!(
                "severity {value} outside {MIN_SEVERITY}..={MAX_SEVERITY}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Severity normalized to (0, 1].
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / f64::from(MAX_SEVERITY)
    }
}

impl TryFrom<u8> for Severity {
    type Error = PulseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> Self {
        s.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
