// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "safety_pulse.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Trust ---
pub const DEFAULT_NEW_ANONYMOUS_TRUST: f64 = 0.2;
pub const DEFAULT_NEW_AUTHENTICATED_TRUST: f64 = 0.6;
pub const DEFAULT_HISTORY_BONUS_PER_SUBMISSION: f64 = 0.02;
pub const DEFAULT_HISTORY_BONUS_CAP: f64 = 0.4;
pub const DEFAULT_AUTHENTICATED_BONUS: f64 = 0.15;
pub const DEFAULT_ANOMALY_PENALTY: f64 = 0.3;
pub const DEFAULT_VOTE_WEIGHT_PER_VOTE: f64 = 0.04;
pub const DEFAULT_VOTE_WEIGHT_CAP: f64 = 0.4;
pub const DEFAULT_VOTE_PRIOR: f64 = 0.5;
pub const DEFAULT_EXISTING_TRUST_SHARE: f64 = 0.6;
pub const DEFAULT_BLUR_RADIUS_M: f64 = 50.0;
pub const DEFAULT_RAPID_SUBMISSION_SECS: i64 = 10;
pub const DEFAULT_ABUSE_SUBMISSION_LIMIT: u32 = 20;
pub const DEFAULT_ABUSE_ANOMALY_LIMIT: f64 = 0.7;
pub const DEFAULT_ABUSE_TRUST_MULTIPLIER: f64 = 0.8;

// --- Lifecycle ---
pub const DEFAULT_VOTE_WINDOW_HOURS: i64 = 72;
pub const DEFAULT_REPORT_TTL_HOURS: i64 = 24;
pub const DEFAULT_DELETE_COOLDOWN_MINUTES: i64 = 60;
pub const DEFAULT_VERIFY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_DISPUTE_RATIO: f64 = 0.3;
pub const DEFAULT_MIN_VOTES_FOR_TRANSITION: u32 = 3;
pub const DEFAULT_RECENCY_HORIZON_HOURS: f64 = 48.0;

// --- Aggregation ---
pub const DEFAULT_AGGREGATION_WINDOW_HOURS: i64 = 12;
pub const DEFAULT_DECAY_HALF_LIFE_HOURS: f64 = 6.0;
pub const DEFAULT_MIN_TILE_INTENSITY: f64 = 0.05;
pub const DEFAULT_DENSITY_BOOST_COUNT: usize = 5;
pub const DEFAULT_DENSITY_BOOST: f64 = 1.1;
pub const DEFAULT_BASE_RADIUS_M: f64 = 200.0;
pub const DEFAULT_RADIUS_PER_INTENSITY_M: f64 = 300.0;
pub const DEFAULT_TILE_TTL_HOURS: i64 = 24;
pub const DEFAULT_COARSE_PRECISION: usize = 6;
pub const DEFAULT_FINE_PRECISION: usize = 7;

// --- Decay ---
pub const DEFAULT_TILE_DELETE_CUTOFF: f64 = 0.05;
pub const DEFAULT_TILE_MAX_AGE_HOURS: f64 = 48.0;
pub const DEFAULT_FADING_TILE_INTENSITY: f64 = 0.1;
pub const DEFAULT_FADING_TILE_TTL_HOURS: i64 = 1;
pub const DEFAULT_REPORT_DECAY_HOURS: f64 = 12.0;
pub const DEFAULT_PATTERN_RETENTION_DAYS: i64 = 7;
pub const DEFAULT_ALERT_RETENTION_HOURS: i64 = 24;
pub const DEFAULT_EMPTY_TILE_RETENTION_DAYS: i64 = 7;

// --- Patterns ---
pub const DEFAULT_SPIKE_WINDOW_MINUTES: i64 = 30;
pub const DEFAULT_SPIKE_MIN_REPORTS: usize = 10;
pub const DEFAULT_CLUSTER_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_CLUSTER_MIN_REPORTS: usize = 2;
pub const DEFAULT_CLUSTER_LIMIT: usize = 50;
pub const DEFAULT_SPAM_WINDOW_MINUTES: i64 = 10;
pub const DEFAULT_SPAM_MIN_REPORTS: usize = 5;
pub const DEFAULT_RAPID_FIRE_WINDOW_MINUTES: i64 = 60;
pub const DEFAULT_RAPID_FIRE_MIN_REPORTS: usize = 3;
pub const DEFAULT_RAPID_FIRE_RATE_PER_MINUTE: f64 = 1.0;
pub const DEFAULT_LOW_TRUST_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_LOW_TRUST_MIN_REPORTS: usize = 3;
pub const DEFAULT_LOW_TRUST_THRESHOLD: f64 = 0.3;
pub const DEFAULT_RISK_ZONE_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_RISK_ZONE_LIMIT: usize = 10;
pub const DEFAULT_ALERT_RADIUS_KM: f64 = 2.0;
pub const DEFAULT_NIGHT_START_HOUR: u32 = 22;
pub const DEFAULT_NIGHT_END_HOUR: u32 = 6;
pub const DEFAULT_PERSIST_INTENSITY: f64 = 0.5;
pub const DEFAULT_RISK_ZONE_RADIUS_KM: f64 = 10.0;

// --- Scheduler ---
pub const DEFAULT_AGGREGATION_INTERVAL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_DECAY_INTERVAL_SECS: u64 = 600; // 10 minutes
pub const DEFAULT_PATTERN_INTERVAL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 86_400; // 24 hours

// --- Rate limiting ---
pub const DEFAULT_ANONYMOUS_REQUESTS_PER_MINUTE: u32 = 60;
pub const DEFAULT_AUTHENTICATED_REQUESTS_PER_MINUTE: u32 = 200;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_MAX_IDENTITIES: u64 = 100_000;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1_024;
pub const DEFAULT_FAILURE_ALERT_THRESHOLD: u32 = 3;
