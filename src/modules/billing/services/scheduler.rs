use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::core::clock::{duration_until, next_midnight};
use crate::core::Clock;
use crate::modules::billing::services::BillingService;

/// One unit of scheduled work
#[async_trait]
pub trait BillingCycle: Send + Sync {
    /// Run a full cycle; returns once all of its work has finished
    async fn run(&self);
}

#[async_trait]
impl BillingCycle for BillingService {
    async fn run(&self) {
        self.run_cycle().await;
    }
}

/// Runs a billing cycle once per day at midnight of the billing timezone
///
/// The wake-up time is recomputed from the clock after every cycle, so time
/// spent billing never accumulates as drift. Nothing is persisted: after a
/// restart the loop simply starts over from the current time.
pub struct Scheduler {
    cycle: Arc<dyn BillingCycle>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    run_on_startup: bool,
}

impl Scheduler {
    pub fn new(cycle: Arc<dyn BillingCycle>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            cycle,
            clock,
            offset,
            run_on_startup: true,
        }
    }

    /// Whether to run a cycle at startup, before the first midnight
    pub fn run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    /// When the next cycle should start if the current one ended at `now`
    pub fn next_wake(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_midnight(now, self.offset)
    }

    /// Loop until `shutdown` turns true or its sender is dropped
    ///
    /// A cycle already in progress is always allowed to finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            utc_offset_secs = self.offset.local_minus_utc(),
            run_on_startup = self.run_on_startup,
            "Starting billing scheduler"
        );

        let mut run_now = self.run_on_startup;

        loop {
            if *shutdown.borrow() {
                break;
            }

            if run_now {
                self.cycle.run().await;
            }
            run_now = true;

            let now = self.clock.now();
            let wake_at = self.next_wake(now);
            let wait = duration_until(now, wake_at);

            info!(
                wake_at = %wake_at,
                wait_ms = wait.as_millis() as u64,
                "Waiting until next billing cycle"
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }
        }

        info!("Billing scheduler stopped");
    }
}
