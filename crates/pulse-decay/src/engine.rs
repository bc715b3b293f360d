use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_aggregation::scoring::radius_m;
use pulse_core::config::{AggregationConfig, DecayConfig, PulseConfig};
use pulse_core::errors::PulseResult;
use pulse_core::models::{DomainEvent, EventKind, PulseTile};
use pulse_core::traits::{IEventSink, IPulseStorage, NoopEventSink};

use crate::curve;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecaySummary {
    pub scanned: usize,
    pub decayed: usize,
    pub deleted: usize,
    /// Tiles refreshed by aggregation between the read and the write.
    pub skipped: usize,
    pub failed: usize,
}

/// What decay decided for one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileDecay {
    Keep(PulseTile),
    Delete,
}

/// Fade a tile from its `base_intensity`. Pure: applying it twice at the
/// same `now` gives the same tile.
pub fn decay_tile(
    mut tile: PulseTile,
    now: DateTime<Utc>,
    decay: &DecayConfig,
    aggregation: &AggregationConfig,
) -> TileDecay {
    let Some(factor) = curve::tile_factor(tile.age_hours(now), decay) else {
        return TileDecay::Delete;
    };
    let intensity = (tile.base_intensity * factor).clamp(0.0, 1.0);
    if intensity <= decay.tile_delete_cutoff {
        return TileDecay::Delete;
    }
    tile.intensity = intensity;
    tile.radius_m = radius_m(intensity, aggregation);
    let ttl = if intensity < decay.fading_tile_intensity {
        Duration::hours(decay.fading_tile_ttl_hours)
    } else {
        Duration::hours(aggregation.tile_ttl_hours)
    };
    tile.expires_at = now + ttl;
    TileDecay::Keep(tile)
}

pub struct DecayEngine {
    storage: Arc<dyn IPulseStorage>,
    decay: DecayConfig,
    aggregation: AggregationConfig,
    events: Arc<dyn IEventSink>,
}

impl DecayEngine {
    pub fn new(storage: Arc<dyn IPulseStorage>, config: &PulseConfig) -> Self {
        Self {
            storage,
            decay: config.decay.clone(),
            aggregation: config.aggregation.clone(),
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn IEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Decay every stored tile, deleting the ones that faded out or aged
    /// past the maximum.
    #[instrument(skip(self))]
    pub fn run(&self, now: DateTime<Utc>) -> PulseResult<DecaySummary> {
        let tiles = self.storage.query_tiles(None, None)?;
        let mut summary = DecaySummary {
            scanned: tiles.len(),
            ..DecaySummary::default()
        };

        for tile in tiles {
            let tile_id = tile.tile_id.clone();
            let seen = tile.last_updated;
            let result = match decay_tile(tile, now, &self.decay, &self.aggregation) {
                TileDecay::Keep(tile) => self.storage.update_decayed_tile(&tile).map(|written| {
                    if written {
                        debug!(tile = %tile_id, intensity = tile.intensity, "tile decayed");
                        summary.decayed += 1;
                    } else {
                        debug!(tile = %tile_id, "tile refreshed during decay, left as is");
                        summary.skipped += 1;
                    }
                }),
                TileDecay::Delete => self
                    .storage
                    .delete_tile_if_unchanged(&tile_id, seen)
                    .map(|removed| {
                        if removed {
                            summary.deleted += 1;
                            self.emit_expired(&tile_id, now);
                        } else {
                            debug!(tile = %tile_id, "tile refreshed during decay, not deleted");
                            summary.skipped += 1;
                        }
                    }),
            };
            if let Err(e) = result {
                summary.failed += 1;
                warn!(tile = %tile_id, error = %e, "failed to decay tile");
            }
        }

        info!(
            scanned = summary.scanned,
            decayed = summary.decayed,
            deleted = summary.deleted,
            skipped = summary.skipped,
            "decay complete"
        );
        Ok(summary)
    }

    pub(crate) fn emit_expired(&self, tile_id: &str, now: DateTime<Utc>) {
        self.events
            .emit(DomainEvent::new(EventKind::PulseTileExpired, tile_id, now));
    }
}
