//! Structured log events for background jobs and request admission.

/// A job tick finished.
pub fn job_completed(job: &str, duration_ms: u64) {
    tracing::info!(event = "job_completed", job = %job, duration_ms, "job completed");
}

/// A job tick returned an error.
pub fn job_failed(job: &str, error: &str, consecutive_failures: u32) {
    tracing::warn!(
        event = "job_failed",
        job = %job,
        error = %error,
        consecutive_failures,
        "job failed"
    );
}

/// A job tick panicked. The scheduler keeps running.
pub fn job_panicked(job: &str, message: &str) {
    tracing::error!(event = "job_panicked", job = %job, message = %message, "job panicked");
}

/// A request was refused by the rate limiter.
pub fn request_throttled(identity: &str, retry_after_secs: u64) {
    tracing::warn!(
        event = "request_throttled",
        identity = %identity,
        retry_after_secs,
        "request throttled"
    );
}
