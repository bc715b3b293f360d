/// Safety pulse engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Meters per degree of latitude, used for blur offsets.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Kilometers per degree, used for bounding-box approximations.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Severity bounds (inclusive).
pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 5;

/// Longest geohash the indexer will produce.
pub const MAX_TILE_PRECISION: usize = 12;

/// Maximum number of free-form context entries on a report.
pub const MAX_CONTEXT_ENTRIES: usize = 32;

/// Maximum length of an owner-supplied deletion reason.
pub const MAX_DELETE_REASON_LEN: usize = 500;

/// Upper bound on rows returned by a single snapshot query.
pub const MAX_SNAPSHOT_ROWS: usize = 10_000;

/// Lower bound on a report's decayed severity weight.
pub const MIN_SEVERITY_WEIGHT: f64 = 0.2;
