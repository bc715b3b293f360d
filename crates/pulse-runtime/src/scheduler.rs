//! Background job scheduler. Each job runs on its own tokio interval and
//! executes on the blocking pool, so a slow or failing job never delays the
//! others. Failures and panics are recorded in the job registry and the
//! loop keeps going.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use pulse_core::config::SchedulerConfig;
use pulse_observability::JobOutcome;

use crate::jobs::JobKind;
use crate::service::PulseService;

pub struct Scheduler;

impl Scheduler {
    /// Start every job at its configured period. Must be called inside a
    /// tokio runtime.
    pub fn start(service: Arc<PulseService>, config: &SchedulerConfig) -> SchedulerHandle {
        let plan = JobKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.period(config)))
            .collect();
        Self::start_with(service, plan)
    }

    /// Start an explicit set of jobs and periods.
    pub fn start_with(service: Arc<PulseService>, plan: Vec<(JobKind, Duration)>) -> SchedulerHandle {
        let (stop, stopped) = watch::channel(false);
        let tasks = plan
            .into_iter()
            .map(|(kind, period)| {
                info!(job = %kind, period_secs = period.as_secs_f64(), "scheduling job");
                tokio::spawn(run_loop(service.clone(), kind, period, stopped.clone()))
            })
            .collect();
        SchedulerHandle { stop, tasks }
    }
}

async fn run_loop(
    service: Arc<PulseService>,
    kind: JobKind,
    period: Duration,
    mut stopped: watch::Receiver<bool>,
) {
    let mut ticker = interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; jobs wait one full period.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stopped.changed() => {
                if changed.is_err() || *stopped.borrow() {
                    break;
                }
                continue;
            }
        }
        run_once(&service, kind).await;
    }
    debug!(job = %kind, "job loop stopped");
}

async fn run_once(service: &Arc<PulseService>, kind: JobKind) {
    let started_at = service.now();
    let clock = Instant::now();
    let worker = service.clone();
    match tokio::task::spawn_blocking(move || worker.execute(kind)).await {
        // Outcome already recorded by `execute`.
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(job = %kind, error = %e, "scheduled job failed"),
        Err(join_error) => {
            let message = if join_error.is_panic() {
                panic_message(join_error.into_panic())
            } else {
                "job task cancelled".to_string()
            };
            let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
            service
                .jobs()
                .record(kind.as_str(), started_at, duration_ms, JobOutcome::Panicked(message));
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "job panicked".to_string(),
        },
    }
}

/// Running scheduler. Dropping the handle leaves the jobs running; call
/// [`SchedulerHandle::shutdown`] to stop them.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn job_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every loop to stop and wait for in-flight runs to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "job loop ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_recovered() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bad state"))), "bad state");
        assert_eq!(panic_message(Box::new(7_u32)), "job panicked");
    }
}
