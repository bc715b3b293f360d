//! Decay curves for tiles and reports.

use pulse_core::config::DecayConfig;
use pulse_core::constants::MIN_SEVERITY_WEIGHT;
use pulse_core::models::Severity;

/// Tile intensity multiplier for `age_h` hours since the last aggregation.
///
/// | age (h)  | factor                          |
/// |----------|---------------------------------|
/// | < 1      | 1.0                             |
/// | 1–6      | 1 − 0.1·(age − 1), ≥ 0.5        |
/// | 6–12     | 0.5 − 0.042·(age − 6), ≥ 0.25   |
/// | 12–max   | 0.25 − 0.007·(age − 12), ≥ 0.02 |
///
/// `None` once the tile reaches `tile_max_age_hours` and must be deleted.
pub fn tile_factor(age_h: f64, cfg: &DecayConfig) -> Option<f64> {
    if age_h >= cfg.tile_max_age_hours {
        return None;
    }
    let factor = if age_h < 1.0 {
        1.0
    } else if age_h < 6.0 {
        (1.0 - 0.1 * (age_h - 1.0)).max(0.5)
    } else if age_h < 12.0 {
        (0.5 - 0.042 * (age_h - 6.0)).max(0.25)
    } else {
        (0.25 - 0.007 * (age_h - 12.0)).max(0.02)
    };
    Some(factor)
}

/// `severity/5 · exp(−age_h / report_decay_hours)`, clamped to [0.2, 1.0].
pub fn severity_weight(severity: Severity, age_h: f64, cfg: &DecayConfig) -> f64 {
    let w = severity.fraction() * (-age_h.max(0.0) / cfg.report_decay_hours).exp();
    w.clamp(MIN_SEVERITY_WEIGHT, 1.0)
}
