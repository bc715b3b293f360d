//! Pure detectors. Each takes a pre-filtered snapshot of reports and
//! applies its own trailing window relative to `now`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Timelike, Utc};

use pulse_core::config::PatternConfig;
use pulse_core::geo::{self, Coordinate};
use pulse_core::models::{ConfidenceLevel, ReputationKey, SafetyReport, SignalCategory};

use crate::types::*;

const SPIKE_SATURATION: f64 = 20.0;
const CLUSTER_SATURATION: f64 = 10.0;
const SPAM_SATURATION: f64 = 10.0;
const SPAM_DOWN_RANK: f64 = 0.5;
const RAPID_FIRE_FLAG_RATE: f64 = 5.0;
const RISK_DECAY_HOURS: f64 = 24.0;
const HIGH_RISK: f64 = 0.6;
const MEDIUM_RISK: f64 = 0.4;
const NIGHT_RISK: f64 = 0.3;
const SPIKE_RISK: f64 = 0.4;

fn within<'a>(
    reports: &'a [SafetyReport],
    since: DateTime<Utc>,
) -> impl Iterator<Item = &'a SafetyReport> + 'a {
    reports.iter().filter(move |r| r.created_at > since)
}

fn group_by<'a, K, F>(reports: impl Iterator<Item = &'a SafetyReport>, key: F) -> BTreeMap<K, Vec<&'a SafetyReport>>
where
    K: Ord,
    F: Fn(&SafetyReport) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&SafetyReport>> = BTreeMap::new();
    for r in reports {
        if let Some(k) = key(r) {
            groups.entry(k).or_default().push(r);
        }
    }
    groups
}

fn prefix(tile: &str, precision: usize) -> String {
    tile.get(..precision).unwrap_or(tile).to_string()
}

fn center_of(reports: &[&SafetyReport]) -> Coordinate {
    geo::centroid(reports.iter().map(|r| r.coordinate())).unwrap_or(Coordinate { lat: 0.0, lng: 0.0 })
}

fn categories(reports: &[&SafetyReport]) -> Vec<SignalCategory> {
    reports
        .iter()
        .map(|r| r.category)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn span_minutes(reports: &[&SafetyReport]) -> f64 {
    let first = reports.iter().map(|r| r.created_at).min();
    let last = reports.iter().map(|r| r.created_at).max();
    match (first, last) {
        (Some(a), Some(b)) => (b - a).num_milliseconds() as f64 / 60_000.0,
        _ => 0.0,
    }
}

/// Tiles with at least `spike_min_reports` valid reports in the trailing
/// spike window. `reports` should already be restricted to valid ones.
pub fn detect_spikes(reports: &[SafetyReport], now: DateTime<Utc>, cfg: &PatternConfig) -> Vec<Spike> {
    let since = now - Duration::minutes(cfg.spike_window_minutes);
    let groups = group_by(within(reports, since), |r| {
        Some(prefix(&r.tile_id, cfg.spike_precision))
    });

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= cfg.spike_min_reports)
        .map(|(tile_id, members)| {
            let count = members.len();
            let mut severity_breakdown = BTreeMap::new();
            for r in &members {
                *severity_breakdown.entry(r.severity.value()).or_insert(0) += 1;
            }
            let range = span_minutes(&members);
            Spike {
                id: uuid::Uuid::new_v4().to_string(),
                center: center_of(&members),
                report_count: count,
                spike_intensity: (count as f64 / SPIKE_SATURATION).min(1.0),
                time_window_minutes: cfg.spike_window_minutes,
                actual_time_range_minutes: (range * 100.0).round() / 100.0,
                severity_breakdown,
                categories: categories(&members),
                detected_at: now,
                message: format!("Spike detected: {count} reports in {} minutes", range as i64),
                tile_id,
            }
        })
        .collect()
}

/// Fine tiles holding at least `cluster_min_reports` valid reports in the
/// trailing cluster window, strongest first, capped at `cluster_limit`.
pub fn detect_clusters(
    reports: &[SafetyReport],
    now: DateTime<Utc>,
    fine_precision: usize,
    cfg: &PatternConfig,
) -> Vec<Cluster> {
    let since = now - Duration::hours(cfg.cluster_window_hours);
    let groups = group_by(within(reports, since), |r| {
        geo::encode(r.coordinate(), fine_precision).ok()
    });

    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= cfg.cluster_min_reports)
        .map(|(tile_id, members)| {
            let count = members.len();
            let avg_severity = mean(members.iter().map(|r| f64::from(r.severity.value())));
            let avg_trust = mean(members.iter().map(|r| r.trust_score.value()));
            Cluster {
                id: uuid::Uuid::new_v4().to_string(),
                tile_id,
                center: center_of(&members),
                report_count: count,
                avg_severity,
                avg_trust_score: avg_trust,
                intensity: (count as f64 / CLUSTER_SATURATION).min(1.0) * (avg_severity / 5.0),
                categories: categories(&members),
                detected_at: now,
            }
        })
        .collect();

    clusters.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    clusters.truncate(cfg.cluster_limit);
    clusters
}

/// Identities with at least `spam_min_reports` reports, valid or not, in the
/// trailing spam window. `known` maps an identity to its submission count
/// when a reputation record exists.
pub fn detect_spam(
    reports: &[SafetyReport],
    now: DateTime<Utc>,
    known: &HashMap<ReputationKey, u32>,
    cfg: &PatternConfig,
) -> Vec<SpamIdentity> {
    let since = now - Duration::minutes(cfg.spam_window_minutes);
    let groups = group_by(within(reports, since), |r| Some(r.reporter.reputation_key()));

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= cfg.spam_min_reports)
        .map(|(key, members)| {
            let count = members.len();
            let spam_score = (count as f64 / SPAM_SATURATION).min(1.0);
            let severities: BTreeSet<u8> = members.iter().map(|r| r.severity.value()).collect();
            SpamIdentity {
                identity: key.fingerprint(),
                report_count: count,
                time_window_minutes: cfg.spam_window_minutes,
                spam_score,
                pattern_score: if severities.len() == 1 { 0.8 } else { 0.3 },
                severities: severities.into_iter().collect(),
                is_known_identity: known.contains_key(&key),
                total_submissions: known.get(&key).copied().unwrap_or(0),
                action_recommended: if spam_score > SPAM_DOWN_RANK {
                    RecommendedAction::DownRank
                } else {
                    RecommendedAction::Monitor
                },
                key,
            }
        })
        .collect()
}

/// Tiles receiving more than `rapid_fire_min_reports` reports in the trailing
/// window at a sustained rate. Flagged for review only.
pub fn detect_rapid_fire(reports: &[SafetyReport], now: DateTime<Utc>, cfg: &PatternConfig) -> Vec<RapidFire> {
    let since = now - Duration::minutes(cfg.rapid_fire_window_minutes);
    let groups = group_by(within(reports, since), |r| Some(r.tile_id.clone()));

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > cfg.rapid_fire_min_reports)
        .filter_map(|(tile_id, members)| {
            let count = members.len();
            let span_secs = (span_minutes(&members) * 60.0).round() as i64;
            let rate = if span_secs > 0 {
                count as f64 / (span_secs as f64 / 60.0)
            } else {
                count as f64
            };
            (rate >= cfg.rapid_fire_rate_per_minute).then(|| RapidFire {
                center: center_of(&members),
                tile_id,
                report_count: count,
                time_span_seconds: span_secs,
                reports_per_minute: (rate * 100.0).round() / 100.0,
                action_recommended: if rate > RAPID_FIRE_FLAG_RATE {
                    RecommendedAction::Flag
                } else {
                    RecommendedAction::Monitor
                },
            })
        })
        .collect()
}

/// Identities whose reports over the trailing window average below the
/// low-trust threshold.
pub fn detect_low_trust(reports: &[SafetyReport], now: DateTime<Utc>, cfg: &PatternConfig) -> Vec<LowTrustIdentity> {
    let since = now - Duration::days(cfg.low_trust_window_days);
    let groups = group_by(within(reports, since), |r| Some(r.reporter.reputation_key()));

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= cfg.low_trust_min_reports)
        .filter_map(|(key, members)| {
            let avg = mean(members.iter().map(|r| r.trust_score.value()));
            (avg < cfg.low_trust_threshold).then(|| LowTrustIdentity {
                identity: key.fingerprint(),
                avg_trust_score: avg,
                report_count: members.len(),
                action_recommended: if avg < 0.2 {
                    RecommendedAction::DownRank
                } else {
                    RecommendedAction::Flag
                },
                key,
            })
        })
        .collect()
}

/// Trust-weighted severity per tile, faded by the age of the newest report.
///
/// ```text
/// risk = (Σ severity·trust / Σ trust) / 5 · exp(−h_since_newest / 24)
/// ```
pub fn risk_zones(
    reports: &[SafetyReport],
    now: DateTime<Utc>,
    precision: usize,
    cfg: &PatternConfig,
) -> RiskZones {
    let since = now - Duration::hours(cfg.risk_zone_window_hours);
    let groups = group_by(within(reports, since), |r| Some(prefix(&r.tile_id, precision)));
    if groups.is_empty() {
        return RiskZones {
            message: "No recent data".to_string(),
            ..RiskZones::default()
        };
    }

    let mut high = Vec::new();
    let mut medium = Vec::new();
    for (tile_id, members) in groups {
        let total_weight: f64 = members.iter().map(|r| r.trust_score.value()).sum();
        if total_weight <= 0.0 {
            continue;
        }
        let weighted: f64 = members
            .iter()
            .map(|r| f64::from(r.severity.value()) * r.trust_score.value())
            .sum();
        let newest = members.iter().map(|r| r.created_at).max().unwrap_or(now);
        let hours = ((now - newest).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
        let risk = (weighted / total_weight) / 5.0 * (-hours / RISK_DECAY_HOURS).exp();

        let zone = RiskZone {
            center: center_of(&members),
            risk_score: risk,
            report_count: members.len(),
            avg_severity: mean(members.iter().map(|r| f64::from(r.severity.value()))),
            categories: categories(&members),
            tile_id,
        };
        if risk >= HIGH_RISK {
            high.push(zone);
        } else if risk >= MEDIUM_RISK {
            medium.push(zone);
        }
    }

    high.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    medium.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    let message = format!(
        "Found {} high-risk and {} medium-risk zones",
        high.len(),
        medium.len()
    );
    let total_zones = high.len() + medium.len();
    high.truncate(cfg.risk_zone_limit);
    medium.truncate(cfg.risk_zone_limit);
    RiskZones {
        total_zones,
        high_risk_zones: high,
        medium_risk_zones: medium,
        message,
    }
}

/// Night hours wrap midnight: `hour >= start || hour < end`.
pub fn is_night(hour: u32, cfg: &PatternConfig) -> bool {
    if cfg.night_start_hour <= cfg.night_end_hour {
        hour >= cfg.night_start_hour && hour < cfg.night_end_hour
    } else {
        hour >= cfg.night_start_hour || hour < cfg.night_end_hour
    }
}

pub fn is_night_at(now: DateTime<Utc>, cfg: &PatternConfig) -> bool {
    is_night(now.hour(), cfg)
}

/// Point-in-time risk for a caller: nearby severity, night, and a spike in
/// the caller's own tile.
pub fn personalized_alert(
    nearby: &[SafetyReport],
    tile_spike_count: usize,
    hour: u32,
    cfg: &PatternConfig,
) -> PersonalizedAlert {
    let location_risk = if nearby.is_empty() {
        0.0
    } else {
        (mean(nearby.iter().map(|r| f64::from(r.severity.value()))) / 5.0).min(1.0)
    };
    let night = is_night(hour, cfg);
    let time_risk = if night { NIGHT_RISK } else { 0.0 };
    let spike_risk = if tile_spike_count >= cfg.spike_min_reports {
        SPIKE_RISK
    } else {
        0.0
    };
    let risk = (location_risk + time_risk + spike_risk).min(1.0);

    let (alert_level, message) = if risk >= 0.7 {
        (
            ConfidenceLevel::High,
            "This area has elevated safety concerns. Exercise caution.",
        )
    } else if risk >= 0.4 {
        let message = if night {
            "Nighttime in this area. Stay alert."
        } else {
            "Some safety incidents reported here recently."
        };
        (ConfidenceLevel::Medium, message)
    } else {
        (ConfidenceLevel::Low, "This area appears relatively safe.")
    };

    PersonalizedAlert {
        alert_level,
        risk_score: risk,
        location_risk,
        time_risk,
        spike_risk,
        nearby_reports: nearby.len(),
        is_night: night,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::models::Identity;
    use test_fixtures::{fixed_now, offset, ReportBuilder};

    #[test]
    fn ten_reports_in_twenty_minutes_spike() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let reports: Vec<_> = (0..10)
            .map(|i| ReportBuilder::new(now).minutes_ago(i * 2).severity(4).build())
            .collect();
        let spikes = detect_spikes(&reports, now, &cfg);
        assert_eq!(spikes.len(), 1);
        let spike = &spikes[0];
        assert_eq!(spike.report_count, 10);
        assert!(spike.actual_time_range_minutes <= 30.0);
        assert_eq!(spike.spike_intensity, 0.5);
        assert_eq!(spike.severity_breakdown.get(&4), Some(&10));
        assert_eq!(spike.message, "Spike detected: 10 reports in 18 minutes");
    }

    #[test]
    fn nine_reports_are_not_a_spike() {
        let now = fixed_now();
        let reports: Vec<_> = (0..9).map(|_| ReportBuilder::new(now).build()).collect();
        assert!(detect_spikes(&reports, now, &PatternConfig::default()).is_empty());
    }

    #[test]
    fn clusters_need_two_reports_in_a_fine_tile() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let cell = geo::decode(&geo::encode(offset(0.0, 0.0), 7).unwrap()).unwrap().center;
        let reports = vec![
            ReportBuilder::new(now).at(cell).severity(5).build(),
            ReportBuilder::new(now).at(cell).severity(3).build(),
            ReportBuilder::new(now).at(offset(5_000.0, 0.0)).build(),
        ];
        let clusters = detect_clusters(&reports, now, 7, &cfg);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].report_count, 2);
        assert!((clusters[0].intensity - 0.2 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn spam_identity_with_uniform_severity() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let spammer = Identity::device("spammer");
        let reports: Vec<_> = (0..6)
            .map(|i| {
                ReportBuilder::new(now)
                    .reporter(spammer.clone())
                    .minutes_ago(i)
                    .severity(5)
                    .build()
            })
            .collect();
        let known = HashMap::from([(spammer.reputation_key(), 40)]);
        let spam = detect_spam(&reports, now, &known, &cfg);
        assert_eq!(spam.len(), 1);
        assert!((spam[0].spam_score - 0.6).abs() < 1e-12);
        assert_eq!(spam[0].pattern_score, 0.8);
        assert_eq!(spam[0].action_recommended, RecommendedAction::DownRank);
        assert_eq!(spam[0].total_submissions, 40);
        assert_ne!(spam[0].identity, "spammer");
    }

    #[test]
    fn rapid_fire_needs_rate() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let burst: Vec<_> = (0..4).map(|_| ReportBuilder::new(now).build()).collect();
        let rapid = detect_rapid_fire(&burst, now, &cfg);
        assert_eq!(rapid.len(), 1);
        assert_eq!(rapid[0].time_span_seconds, 0);
        assert_eq!(rapid[0].action_recommended, RecommendedAction::Monitor);

        let slow: Vec<_> = (0..4)
            .map(|i| ReportBuilder::new(now).minutes_ago(i * 15).build())
            .collect();
        assert!(detect_rapid_fire(&slow, now, &cfg).is_empty());
    }

    #[test]
    fn low_trust_identity() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let who = Identity::device("shaky");
        let reports: Vec<_> = (0..3)
            .map(|i| ReportBuilder::new(now).reporter(who.clone()).trust(0.25).hours_ago(i * 24).build())
            .collect();
        let low = detect_low_trust(&reports, now, &cfg);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].action_recommended, RecommendedAction::Flag);
    }

    #[test]
    fn risk_zone_levels() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let severe: Vec<_> = (0..3)
            .map(|_| ReportBuilder::new(now).severity(5).trust(0.9).build())
            .collect();
        let zones = risk_zones(&severe, now, 6, &cfg);
        assert_eq!(zones.high_risk_zones.len(), 1);
        assert!((zones.high_risk_zones[0].risk_score - 1.0).abs() < 1e-12);
        assert_eq!(zones.total_zones, 1);

        let mild = vec![ReportBuilder::new(now).severity(1).build()];
        let zones = risk_zones(&mild, now, 6, &cfg);
        assert_eq!(zones.total_zones, 0);
        assert_eq!(zones.message, "Found 0 high-risk and 0 medium-risk zones");

        assert_eq!(risk_zones(&[], now, 6, &cfg).message, "No recent data");
    }

    #[test]
    fn personal_alert_combines_factors() {
        let now = fixed_now();
        let cfg = PatternConfig::default();
        let nearby: Vec<_> = (0..2).map(|_| ReportBuilder::new(now).severity(3).build()).collect();

        let day = personalized_alert(&nearby, 0, 14, &cfg);
        assert_eq!(day.alert_level, ConfidenceLevel::Medium);
        assert!((day.risk_score - 0.6).abs() < 1e-12);
        assert!(!day.is_night);

        let night = personalized_alert(&nearby, 0, 23, &cfg);
        assert_eq!(night.alert_level, ConfidenceLevel::High);
        assert!((night.risk_score - 0.9).abs() < 1e-12);

        let spiking = personalized_alert(&nearby, 10, 3, &cfg);
        assert_eq!(spiking.risk_score, 1.0);

        let quiet = personalized_alert(&[], 0, 12, &cfg);
        assert_eq!(quiet.alert_level, ConfidenceLevel::Low);
        assert_eq!(quiet.message, "This area appears relatively safe.");
    }

    #[test]
    fn night_wraps_midnight() {
        let cfg = PatternConfig::default();
        assert!(is_night(22, &cfg));
        assert!(is_night(0, &cfg));
        assert!(is_night(5, &cfg));
        assert!(!is_night(6, &cfg));
        assert!(!is_night(21, &cfg));
    }
}
