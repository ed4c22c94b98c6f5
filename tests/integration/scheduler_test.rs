// Scheduler loop tests on paused tokio time
//
// TokioClock follows tokio's virtual time, so sleeping until midnight
// completes instantly while the recorded wall-clock instants stay exact.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use billrun::billing::{BillingCycle, Scheduler};
use billrun::core::Clock;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tokio::sync::watch;

use helpers::*;

/// Records when each cycle started and stops the scheduler after `limit` cycles
struct RecordingCycle {
    clock: Arc<TokioClock>,
    started: Mutex<Vec<DateTime<Utc>>>,
    duration: Duration,
    limit: usize,
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl BillingCycle for RecordingCycle {
    async fn run(&self) {
        let count = {
            let mut started = self.started.lock().unwrap();
            started.push(self.clock.now());
            started.len()
        };

        tokio::time::sleep(self.duration).await;

        if count >= self.limit {
            self.shutdown.send(true).ok();
        }
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

async fn run_scheduler(
    start: DateTime<Utc>,
    offset: FixedOffset,
    cycle_duration: Duration,
    limit: usize,
    run_on_startup: bool,
) -> Vec<DateTime<Utc>> {
    let clock = Arc::new(TokioClock::starting_at(start));
    let (tx, rx) = watch::channel(false);
    let cycle = Arc::new(RecordingCycle {
        clock: clock.clone(),
        started: Mutex::new(Vec::new()),
        duration: cycle_duration,
        limit,
        shutdown: tx,
    });

    let scheduler =
        Scheduler::new(cycle.clone(), clock, offset).run_on_startup(run_on_startup);

    tokio::time::timeout(Duration::from_secs(30 * 24 * 3600), scheduler.run(rx))
        .await
        .expect("scheduler did not stop");

    let started = cycle.started.lock().unwrap().clone();
    started
}

#[tokio::test(start_paused = true)]
async fn test_runs_at_startup_then_every_midnight() {
    let start = Utc.with_ymd_and_hms(2025, 11, 1, 22, 0, 0).unwrap();

    let started = run_scheduler(start, utc(), Duration::ZERO, 3, true).await;

    assert_eq!(
        started,
        vec![
            start,
            Utc.with_ymd_and_hms(2025, 11, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_long_cycle_does_not_drift() {
    let start = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();

    // Each cycle takes 3 hours; the next one still starts at midnight
    let started = run_scheduler(start, utc(), Duration::from_secs(3 * 3600), 3, true).await;

    assert_eq!(
        started,
        vec![
            start,
            Utc.with_ymd_and_hms(2025, 11, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_midnight_when_not_running_on_startup() {
    let start = Utc.with_ymd_and_hms(2025, 11, 1, 15, 45, 0).unwrap();
    let offset = FixedOffset::east_opt(3600).unwrap();

    let started = run_scheduler(start, offset, Duration::ZERO, 1, false).await;

    // Midnight at UTC+1 is 23:00 UTC
    assert_eq!(
        started,
        vec![Utc.with_ymd_and_hms(2025, 11, 1, 23, 0, 0).unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_sleep() {
    let clock = Arc::new(TokioClock::starting_at(
        Utc.with_ymd_and_hms(2025, 11, 1, 1, 0, 0).unwrap(),
    ));
    let (unused_tx, _) = watch::channel(false);
    let cycle = Arc::new(RecordingCycle {
        clock: clock.clone(),
        started: Mutex::new(Vec::new()),
        duration: Duration::ZERO,
        limit: usize::MAX,
        shutdown: unused_tx,
    });

    let (tx, rx) = watch::channel(false);
    let scheduler = Scheduler::new(cycle.clone(), clock, utc());
    let handle = tokio::spawn(async move { scheduler.run(rx).await });

    // Let the first cycle run and the scheduler go to sleep
    tokio::time::sleep(Duration::from_secs(60)).await;
    tx.send(true).unwrap();

    handle.await.unwrap();
    assert_eq!(cycle.started.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_shutdown_sender_stops_scheduler() {
    let clock = Arc::new(TokioClock::starting_at(
        Utc.with_ymd_and_hms(2025, 11, 1, 1, 0, 0).unwrap(),
    ));
    let (unused_tx, _) = watch::channel(false);
    let cycle = Arc::new(RecordingCycle {
        clock: clock.clone(),
        started: Mutex::new(Vec::new()),
        duration: Duration::ZERO,
        limit: usize::MAX,
        shutdown: unused_tx,
    });

    let (tx, rx) = watch::channel(false);
    drop(tx);

    Scheduler::new(cycle.clone(), clock, utc()).run(rx).await;
    assert_eq!(cycle.started.lock().unwrap().len(), 1);
}
