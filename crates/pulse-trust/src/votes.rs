//! Vote-derived evidence and its blend with a report's trust.

use pulse_core::config::TrustConfig;
use pulse_core::models::VoteTally;
use pulse_core::TrustScore;

/// Bayesian-style vote term: the observed accurate ratio, weighted by
/// `min(cap, per_vote · n)`, with the remainder at `prior`. Unclamped,
/// always within [0, 1].
pub fn vote_term(tally: &VoteTally, prior: f64, cfg: &TrustConfig) -> f64 {
    let total = tally.total();
    if total == 0 {
        return prior;
    }
    let ratio = f64::from(tally.true_count) / f64::from(total);
    let weight = (f64::from(total) * cfg.vote_weight_per_vote).min(cfg.vote_weight_cap);
    prior * (1.0 - weight) + ratio * weight
}

/// Vote term expressed as a trust value.
pub fn vote_trust(tally: &VoteTally, prior: f64, cfg: &TrustConfig) -> TrustScore {
    TrustScore::new(vote_term(tally, prior, cfg))
}

/// Current trust for a report: `base` blended with its vote evidence.
///
/// A function of the stored base trust and tallies only, so recomputing
/// after any vote or its removal gives the same answer for the same tally.
pub fn blend(base: TrustScore, tally: &VoteTally, cfg: &TrustConfig) -> TrustScore {
    if tally.total() == 0 {
        return base;
    }
    let evidence = vote_trust(tally, cfg.vote_prior, cfg).value();
    let share = cfg.existing_trust_share;
    TrustScore::new(base.value() * share + evidence * (1.0 - share))
}
