//! Interval scheduler driving the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::orchestrator::CycleOrchestrator;
use crate::storage::SchedulerConfig;

/// Tick `run_cycle` every `period` until `shutdown` flips to `true` or its sender drops.
///
/// With `run_on_startup` the first tick bypasses gating. Cycles run inline,
/// so ticks that fall due while a cycle is still running are skipped.
pub async fn run_with_period(
    orchestrator: Arc<CycleOrchestrator>,
    period: Duration,
    run_on_startup: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut first = true;

    info!(period_secs = period.as_secs(), run_on_startup, "scheduler started");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let bypass = first && run_on_startup;
                first = false;
                orchestrator.run_cycle(bypass).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("scheduler stopping");
                    break;
                }
            }
        }
    }
}

/// [`run_with_period`] using the `[scheduler]` config section.
pub async fn run(
    orchestrator: Arc<CycleOrchestrator>,
    config: SchedulerConfig,
    shutdown: watch::Receiver<bool>,
) {
    run_with_period(orchestrator, period(&config), config.run_on_startup, shutdown).await;
}

fn period(config: &SchedulerConfig) -> Duration {
    Duration::from_secs(u64::from(config.interval_minutes.max(1)) * 60)
}

/// A scheduler running on its own task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn spawn(orchestrator: Arc<CycleOrchestrator>, config: &SchedulerConfig) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run(orchestrator, config.clone(), rx));
        Self { shutdown, task }
    }

    pub fn spawn_with_period(
        orchestrator: Arc<CycleOrchestrator>,
        period: Duration,
        run_on_startup: bool,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run_with_period(orchestrator, period, run_on_startup, rx));
        Self { shutdown, task }
    }

    /// Signal shutdown and wait for the loop to exit. An in-flight cycle finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
