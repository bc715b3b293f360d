//! Builders shared by integration tests across the workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use pulse_core::geo::{self, Coordinate};
use pulse_core::models::{
    ConfidenceLevel, Identity, PulseTile, ReportStatus, SafetyReport, Severity, SignalCategory,
    VoteTally,
};
use pulse_core::traits::IPulseStorage;
use pulse_core::{Confidence, TrustScore};

/// Lower Manhattan.
pub const BASE_LAT: f64 = 40.7128;
pub const BASE_LNG: f64 = -74.0060;

/// A whole-second instant, so values survive millisecond storage unchanged.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid fixed timestamp")
}

/// A point `meters_north` / `meters_east` away from the base coordinate.
pub fn offset(meters_north: f64, meters_east: f64) -> Coordinate {
    let dlat = meters_north / 111_320.0;
    let dlng = meters_east / (111_320.0 * BASE_LAT.to_radians().cos());
    Coordinate {
        lat: BASE_LAT + dlat,
        lng: BASE_LNG + dlng,
    }
}

pub struct ReportBuilder {
    now: DateTime<Utc>,
    report: SafetyReport,
}

impl ReportBuilder {
    /// Pending harassment report, severity 3, trust 0.5, created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        let coord = Coordinate {
            lat: BASE_LAT,
            lng: BASE_LNG,
        };
        let tile_id = geo::encode(coord, 6).expect("base coordinate encodes");
        Self {
            now,
            report: SafetyReport {
                id: uuid::Uuid::new_v4().to_string(),
                category: SignalCategory::Harassment,
                severity: Severity::new(3).expect("valid severity"),
                latitude: coord.lat,
                longitude: coord.lng,
                tile_id,
                created_at: now,
                reporter: Identity::device(format!("device-{}", uuid::Uuid::new_v4())),
                context: BTreeMap::new(),
                trust_score: TrustScore::new(0.5),
                base_trust_score: TrustScore::new(0.5),
                confidence_score: Confidence::new(0.5),
                severity_weight: 0.6,
                votes: VoteTally::default(),
                status: ReportStatus::Pending,
                is_valid: true,
                vote_window_expires_at: now + Duration::hours(72),
                expires_at: now + Duration::hours(24),
                last_activity_at: now,
                verified_at: None,
                disputed_at: None,
                deletion: None,
                abuse_flags: None,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.report.id = id.into();
        self
    }

    pub fn category(mut self, category: SignalCategory) -> Self {
        self.report.category = category;
        self
    }

    pub fn severity(mut self, severity: u8) -> Self {
        self.report.severity = Severity::new(severity).expect("valid severity");
        self.report.severity_weight = self.report.severity.fraction();
        self
    }

    pub fn at(mut self, coord: Coordinate) -> Self {
        self.report.latitude = coord.lat;
        self.report.longitude = coord.lng;
        self.report.tile_id = geo::encode(coord, 6).expect("coordinate encodes");
        self
    }

    pub fn reporter(mut self, identity: Identity) -> Self {
        self.report.reporter = identity;
        self
    }

    /// Sets both current and base trust.
    pub fn trust(mut self, trust: f64) -> Self {
        self.report.trust_score = TrustScore::new(trust);
        self.report.base_trust_score = TrustScore::new(trust);
        self
    }

    /// Shift creation back, keeping the default windows relative to it.
    pub fn minutes_ago(mut self, minutes: i64) -> Self {
        let created = self.now - Duration::minutes(minutes);
        self.report.created_at = created;
        self.report.last_activity_at = created;
        self.report.vote_window_expires_at = created + Duration::hours(72);
        self.report.expires_at = created + Duration::hours(24);
        self
    }

    pub fn hours_ago(self, hours: i64) -> Self {
        self.minutes_ago(hours * 60)
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.report.expires_at = at;
        self
    }

    pub fn vote_window_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.report.vote_window_expires_at = at;
        self
    }

    pub fn status(mut self, status: ReportStatus) -> Self {
        self.report.status = status;
        self
    }

    pub fn build(self) -> SafetyReport {
        self.report
    }

    /// Insert through storage without touching reputation counters.
    pub fn insert(self, storage: &dyn IPulseStorage) -> SafetyReport {
        storage
            .insert_report(self.report, &mut |_, _| Ok(()))
            .expect("fixture insert")
    }
}

pub fn make_test_tile(tile_id: &str, intensity: f64, last_updated: DateTime<Utc>) -> PulseTile {
    let center = geo::decode(tile_id).expect("fixture tile decodes").center;
    PulseTile {
        tile_id: tile_id.to_string(),
        center,
        intensity,
        base_intensity: intensity,
        radius_m: (200.0 + intensity * 300.0) as u32,
        confidence: ConfidenceLevel::Medium,
        confidence_score: 0.5,
        dominant_reason: Some("Harassment".to_string()),
        signal_count: 3,
        last_updated,
        expires_at: last_updated + Duration::hours(24),
    }
}

pub fn base_tile() -> String {
    geo::encode(
        Coordinate {
            lat: BASE_LAT,
            lng: BASE_LNG,
        },
        6,
    )
    .expect("base coordinate encodes")
}
