//! Per-identity request admission over fixed windows. Windows live in a
//! bounded moka cache and are evicted once idle.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::sync::Cache;

use pulse_core::config::RateLimitConfig;
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::models::Identity;
use pulse_observability::tracing_setup::events;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    windows: Cache<String, Arc<Mutex<Window>>>,
    config: RateLimitConfig,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs.max(1));
        let windows = Cache::builder()
            .max_capacity(config.max_identities)
            .time_to_idle(window * 2)
            .build();
        Self {
            windows,
            config,
            window,
        }
    }

    /// Admit one request for `identity` or fail with `RateLimited`.
    pub fn check(&self, identity: &Identity) -> PulseResult<()> {
        self.check_at(identity, Instant::now())
    }

    pub fn check_at(&self, identity: &Identity, now: Instant) -> PulseResult<()> {
        let limit = if identity.is_authenticated() {
            self.config.authenticated_per_window
        } else {
            self.config.anonymous_per_window
        };
        let key = identity.reputation_key().as_storage_key();
        let slot = self
            .windows
            .get_with(key, || Arc::new(Mutex::new(Window { started: now, count: 0 })));
        let mut window = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            window.started = now;
            window.count = 0;
        }
        if window.count >= limit {
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            let fingerprint = identity.fingerprint();
            events::request_throttled(&fingerprint, retry_after_secs);
            return Err(PulseError::RateLimited {
                identity: fingerprint,
                retry_after_secs,
            });
        }
        window.count += 1;
        Ok(())
    }
}
