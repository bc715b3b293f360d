//! Pure per-report and per-tile pulse math.

use chrono::{DateTime, Duration, Utc};

use pulse_core::config::AggregationConfig;
use pulse_core::geo;
use pulse_core::models::{ConfidenceLevel, PulseTile, SafetyReport, SignalCategory};
use pulse_core::TrustScore;

/// Contribution of one report to its tile:
/// `(severity / 5) · trust · exp(−age_h / half_life) · category_weight`.
pub fn report_weight(report: &SafetyReport, now: DateTime<Utc>, cfg: &AggregationConfig) -> f64 {
    let decay = (-report.age_hours(now) / cfg.decay_half_life_hours).exp();
    report.severity.fraction() * report.trust_score.value() * decay * report.category.weight()
}

/// Mean weight, boosted for dense tiles, clamped to [0, 1].
pub fn intensity(weights: &[f64], cfg: &AggregationConfig) -> f64 {
    if weights.is_empty() {
        return 0.0;
    }
    let mut value = weights.iter().sum::<f64>() / weights.len() as f64;
    if weights.len() >= cfg.density_boost_count {
        value *= cfg.density_boost;
    }
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Count boosted by average trust: +2 at high trust, +1 at medium.
pub fn confidence_level(count: usize, avg_trust: f64) -> ConfidenceLevel {
    let boost = if avg_trust >= TrustScore::HIGH {
        2
    } else if avg_trust >= TrustScore::MEDIUM {
        1
    } else {
        0
    };
    match count + boost {
        n if n >= 10 => ConfidenceLevel::High,
        n if n >= 2 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    }
}

/// Numeric confidence: `min(1, n / 10) + 0.2 · avg_trust`, clamped.
pub fn confidence_score(count: usize, avg_trust: f64) -> f64 {
    ((count as f64 / 10.0).min(1.0) + 0.2 * avg_trust).clamp(0.0, 1.0)
}

/// Category with the highest severity-weighted count. Ties go to the
/// category listed first in [`SignalCategory::ALL`].
pub fn dominant_category<'a, I>(reports: I) -> Option<SignalCategory>
where
    I: IntoIterator<Item = &'a SafetyReport>,
{
    let mut totals = [0u32; SignalCategory::ALL.len()];
    let mut any = false;
    for r in reports {
        any = true;
        if let Some(slot) = SignalCategory::ALL.iter().position(|c| *c == r.category) {
            totals[slot] += u32::from(r.severity.value());
        }
    }
    if !any {
        return None;
    }
    let mut best = 0;
    for (i, total) in totals.iter().enumerate() {
        if *total > totals[best] {
            best = i;
        }
    }
    Some(SignalCategory::ALL[best])
}

pub fn radius_m(intensity: f64, cfg: &AggregationConfig) -> u32 {
    (cfg.base_radius_m + intensity * cfg.radius_per_intensity_m).round() as u32
}

/// Everything the aggregator derived for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileStats {
    pub tile_id: String,
    pub report_count: usize,
    pub avg_trust: f64,
    pub intensity: f64,
}

/// Compute the pulse for one tile's reports. `None` when the tile is empty
/// or its intensity falls below the configured minimum.
pub fn compute_tile(
    tile_id: &str,
    reports: &[&SafetyReport],
    now: DateTime<Utc>,
    cfg: &AggregationConfig,
) -> (TileStats, Option<PulseTile>) {
    let weights: Vec<f64> = reports.iter().map(|r| report_weight(r, now, cfg)).collect();
    let count = reports.len();
    let avg_trust = if count == 0 {
        0.0
    } else {
        reports.iter().map(|r| r.trust_score.value()).sum::<f64>() / count as f64
    };
    let value = intensity(&weights, cfg);
    let stats = TileStats {
        tile_id: tile_id.to_string(),
        report_count: count,
        avg_trust,
        intensity: value,
    };
    if count == 0 || value < cfg.min_tile_intensity {
        return (stats, None);
    }

    let center = match geo::centroid(reports.iter().map(|r| r.coordinate())) {
        Some(c) => c,
        None => return (stats, None),
    };
    let tile = PulseTile {
        tile_id: tile_id.to_string(),
        center,
        intensity: value,
        base_intensity: value,
        radius_m: radius_m(value, cfg),
        confidence: confidence_level(count, avg_trust),
        confidence_score: confidence_score(count, avg_trust),
        dominant_reason: dominant_category(reports.iter().copied()).map(|c| c.label().to_string()),
        signal_count: u32::try_from(count).unwrap_or(u32::MAX),
        last_updated: now,
        expires_at: now + Duration::hours(cfg.tile_ttl_hours),
    };
    (stats, Some(tile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::{base_tile, fixed_now, ReportBuilder};

    #[test]
    fn fresh_severe_report_weighs_one() {
        let now = fixed_now();
        let r = ReportBuilder::new(now).severity(5).trust(1.0).build();
        let w = report_weight(&r, now, &AggregationConfig::default());
        assert!((w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weight_halves_roughly_with_age() {
        let now = fixed_now();
        let cfg = AggregationConfig::default();
        let r = ReportBuilder::new(now).severity(5).trust(1.0).hours_ago(6).build();
        assert!((report_weight(&r, now, &cfg) - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn density_boost_applies_at_five() {
        let cfg = AggregationConfig::default();
        assert!((intensity(&[0.5; 4], &cfg) - 0.5).abs() < 1e-12);
        assert!((intensity(&[0.5; 5], &cfg) - 0.55).abs() < 1e-12);
        assert_eq!(intensity(&[1.0; 5], &cfg), 1.0);
        assert_eq!(intensity(&[], &cfg), 0.0);
    }

    #[test]
    fn confidence_levels() {
        assert_eq!(confidence_level(1, 0.5), ConfidenceLevel::Low);
        assert_eq!(confidence_level(1, 0.6), ConfidenceLevel::Medium);
        assert_eq!(confidence_level(8, 0.8), ConfidenceLevel::High);
        assert_eq!(confidence_level(8, 0.7), ConfidenceLevel::Medium);
    }

    #[test]
    fn dominant_reason_weighs_severity() {
        let now = fixed_now();
        let reports = vec![
            ReportBuilder::new(now).category(SignalCategory::Followed).severity(5).build(),
            ReportBuilder::new(now).category(SignalCategory::Harassment).severity(2).build(),
            ReportBuilder::new(now).category(SignalCategory::Harassment).severity(2).build(),
        ];
        assert_eq!(dominant_category(&reports), Some(SignalCategory::Followed));

        let tied = vec![
            ReportBuilder::new(now).category(SignalCategory::UnsafeArea).severity(3).build(),
            ReportBuilder::new(now).category(SignalCategory::Followed).severity(3).build(),
        ];
        assert_eq!(dominant_category(&tied), Some(SignalCategory::Followed));
        assert_eq!(dominant_category(&Vec::<SafetyReport>::new()), None);
    }

    #[test]
    fn twelve_severe_harassment_reports() {
        let now = fixed_now();
        let cfg = AggregationConfig::default();
        let reports: Vec<_> = (0..12)
            .map(|_| ReportBuilder::new(now).severity(5).trust(1.0).build())
            .collect();
        let refs: Vec<&SafetyReport> = reports.iter().collect();
        let (stats, tile) = compute_tile(&base_tile(), &refs, now, &cfg);
        let tile = tile.unwrap();
        assert_eq!(stats.report_count, 12);
        assert_eq!(tile.intensity, 1.0);
        assert_eq!(tile.base_intensity, 1.0);
        assert_eq!(tile.confidence, ConfidenceLevel::High);
        assert_eq!(tile.dominant_reason.as_deref(), Some("Harassment"));
        assert_eq!(tile.radius_m, 500);
        assert_eq!(tile.signal_count, 12);
    }

    #[test]
    fn faint_tiles_are_skipped() {
        let now = fixed_now();
        let cfg = AggregationConfig::default();
        let old = ReportBuilder::new(now)
            .severity(1)
            .trust(0.2)
            .category(SignalCategory::Other)
            .hours_ago(11)
            .build();
        let (stats, tile) = compute_tile(&base_tile(), &[&old], now, &cfg);
        assert!(stats.intensity < 0.05);
        assert!(tile.is_none());
    }
}
