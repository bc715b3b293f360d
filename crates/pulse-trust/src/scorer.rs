use chrono::{DateTime, Utc};
use tracing::debug;

use pulse_core::config::TrustConfig;
use pulse_core::geo::Coordinate;
use pulse_core::models::{Reputation, VoteTally};
use pulse_core::TrustScore;

use crate::{base, blur, reputation, votes};

/// Trust scorer bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct TrustScorer {
    config: TrustConfig,
}

impl TrustScorer {
    pub fn new(config: TrustConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Blur a raw coordinate by the configured radius.
    pub fn blur(&self, coord: Coordinate) -> Coordinate {
        blur::blur(coord, self.config.blur_radius_m)
    }

    /// Submission trust from the identity's history.
    pub fn base_trust(&self, reputation: Option<&Reputation>, authenticated: bool) -> TrustScore {
        base::compute(reputation, authenticated, &self.config)
    }

    /// Current report trust after vote evidence.
    pub fn report_trust(&self, base: TrustScore, tally: &VoteTally) -> TrustScore {
        votes::blend(base, tally, &self.config)
    }

    /// Raw vote term used by the lifecycle confidence.
    pub fn vote_term(&self, tally: &VoteTally) -> f64 {
        votes::vote_term(tally, self.config.vote_prior, &self.config)
    }

    /// Trust and abuse flags for a submission; counts it on `rep` afterwards.
    pub fn score_submission(
        &self,
        rep: &mut Reputation,
        authenticated: bool,
        recent_submissions: usize,
        now: DateTime<Utc>,
    ) -> (TrustScore, Vec<String>) {
        let mut trust = self.base_trust(Some(rep), authenticated);
        let reasons = reputation::abuse_reasons(recent_submissions, Some(rep), &self.config);
        if !reasons.is_empty() {
            trust = reputation::apply_abuse_penalty(trust, &self.config);
            debug!(identity = %rep.key.fingerprint(), ?reasons, "abuse heuristics fired");
        }
        reputation::record_submission(rep, now, &self.config);
        (trust, reasons)
    }
}
