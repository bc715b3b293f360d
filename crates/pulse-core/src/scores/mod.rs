mod confidence;
mod trust_score;

pub use confidence::Confidence;
pub use trust_score::TrustScore;
