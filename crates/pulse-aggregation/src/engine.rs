use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_core::config::AggregationConfig;
use pulse_core::constants::MAX_SNAPSHOT_ROWS;
use pulse_core::errors::PulseResult;
use pulse_core::geo::{BoundingBox, Coordinate};
use pulse_core::models::{DomainEvent, EventKind, PulseTile, ReportQuery, SafetyReport};
use pulse_core::traits::{IEventSink, IPulseStorage, NoopEventSink};

use crate::scoring::compute_tile;

/// Result of one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    pub reports_scanned: usize,
    pub tiles_seen: usize,
    pub tiles_created: usize,
    pub tiles_updated: usize,
    /// Below the minimum intensity; left untouched for decay to fade.
    pub tiles_skipped: usize,
    pub failed: usize,
}

pub struct AggregationEngine {
    storage: Arc<dyn IPulseStorage>,
    config: AggregationConfig,
    events: Arc<dyn IEventSink>,
}

impl AggregationEngine {
    pub fn new(storage: Arc<dyn IPulseStorage>, config: AggregationConfig) -> Self {
        Self {
            storage,
            config,
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn IEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Recompute every tile touched by the trailing window and upsert the
    /// results. Tiles are computed in parallel; writes are sequential.
    #[instrument(skip(self))]
    pub fn run(&self, now: DateTime<Utc>) -> PulseResult<AggregationSummary> {
        let since = now - Duration::hours(self.config.window_hours);
        let mut query = ReportQuery::active_since(now, since);
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        let reports = self.storage.query_reports(&query)?;

        let groups = self.group_by_tile(&reports);
        let cfg = &self.config;
        let computed: Vec<_> = groups
            .par_iter()
            .map(|(tile_id, members)| compute_tile(tile_id, members, now, cfg))
            .collect();

        let mut summary = AggregationSummary {
            reports_scanned: reports.len(),
            tiles_seen: groups.len(),
            ..AggregationSummary::default()
        };
        for (stats, tile) in computed {
            let Some(tile) = tile else {
                debug!(tile = %stats.tile_id, intensity = stats.intensity, "tile below threshold");
                summary.tiles_skipped += 1;
                continue;
            };
            match self.upsert(&tile) {
                Ok(true) => {
                    summary.tiles_created += 1;
                    self.emit(EventKind::PulseTileCreated, &tile, now);
                }
                Ok(false) => {
                    summary.tiles_updated += 1;
                    self.emit(EventKind::PulseTileUpdated, &tile, now);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(tile = %tile.tile_id, error = %e, "failed to upsert pulse tile");
                }
            }
        }

        info!(
            reports = summary.reports_scanned,
            created = summary.tiles_created,
            updated = summary.tiles_updated,
            skipped = summary.tiles_skipped,
            "aggregation complete"
        );
        Ok(summary)
    }

    /// Active pulses, optionally restricted to a bounding box.
    pub fn active_pulses(
        &self,
        bbox: Option<&BoundingBox>,
        now: DateTime<Utc>,
    ) -> PulseResult<Vec<PulseTile>> {
        self.storage.query_tiles(bbox, Some(now))
    }

    /// Active pulses whose center lies within `radius_km` of `center`,
    /// nearest first.
    pub fn pulses_within(
        &self,
        center: Coordinate,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> PulseResult<Vec<PulseTile>> {
        let bbox = BoundingBox::around(center, radius_km)?;
        let radius_m = radius_km * 1000.0;
        let mut tiles: Vec<(f64, PulseTile)> = self
            .storage
            .query_tiles(Some(&bbox), Some(now))?
            .into_iter()
            .map(|t| (center.distance_m(&t.center), t))
            .filter(|(d, _)| *d <= radius_m)
            .collect();
        tiles.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(tiles.into_iter().map(|(_, t)| t).collect())
    }

    fn group_by_tile<'a>(&self, reports: &'a [SafetyReport]) -> HashMap<String, Vec<&'a SafetyReport>> {
        let precision = self.config.coarse_precision;
        let mut groups: HashMap<String, Vec<&SafetyReport>> = HashMap::new();
        for report in reports {
            let key = report.tile_id.get(..precision).unwrap_or(&report.tile_id);
            groups.entry(key.to_string()).or_default().push(report);
        }
        groups
    }

    /// Returns whether the tile is new.
    fn upsert(&self, tile: &PulseTile) -> PulseResult<bool> {
        let existed = self.storage.get_tile(&tile.tile_id)?.is_some();
        self.storage.upsert_tile(tile)?;
        Ok(!existed)
    }

    fn emit(&self, kind: EventKind, tile: &PulseTile, now: DateTime<Utc>) {
        let mut event = DomainEvent::new(kind, &tile.tile_id, now)
            .with("intensity", tile.intensity)
            .with("radius_m", f64::from(tile.radius_m))
            .with("signal_count", f64::from(tile.signal_count))
            .with("latitude", tile.center.lat)
            .with("longitude", tile.center.lng);
        if let Some(reason) = &tile.dominant_reason {
            event = event.with_detail(reason.clone());
        }
        self.events.emit(event);
    }
}
