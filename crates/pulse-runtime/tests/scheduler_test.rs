use std::sync::Arc;
use std::time::Duration;

use pulse_core::config::{PulseConfig, SchedulerConfig};
use pulse_runtime::{JobKind, PulseService, Scheduler};
use test_fixtures::fixed_now;

fn service() -> Arc<PulseService> {
    Arc::new(
        PulseService::in_memory(PulseConfig::default())
            .unwrap()
            .with_clock(fixed_now),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduled_jobs_run_and_stop_on_shutdown() {
    let service = service();
    let handle = Scheduler::start_with(
        service.clone(),
        vec![
            (JobKind::Aggregation, Duration::from_millis(20)),
            (JobKind::Decay, Duration::from_millis(30)),
        ],
    );
    assert_eq!(handle.job_count(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    let aggregation = service.jobs().job("aggregation").unwrap();
    assert!(aggregation.total_runs >= 1);
    assert_eq!(aggregation.total_failures, 0);
    assert!(service.jobs().job("decay").is_some());
    assert!(service.jobs().job("maintenance").is_none());

    let runs_at_stop = service.jobs().job("aggregation").unwrap().total_runs;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(service.jobs().job("aggregation").unwrap().total_runs, runs_at_stop);
}

#[tokio::test]
async fn default_schedule_waits_a_full_period() {
    let service = service();
    let handle = Scheduler::start(service.clone(), &SchedulerConfig::default());
    assert_eq!(handle.job_count(), JobKind::ALL.len());

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;
    assert!(service.health().jobs.is_empty());
}
