use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::reconcile::{local_today, StatusReconciler};

/// Shortest period between bulk passes.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Recurring bulk reconciliation for deployments without an external cron.
///
/// The first pass runs as soon as the loop starts, then once per `every`.
pub struct ReconcileEngine {
    reconciler: StatusReconciler,
    every: Duration,
}

impl ReconcileEngine {
    /// `every` is clamped to at least [`MIN_PERIOD`].
    pub fn new(reconciler: StatusReconciler, every: Duration) -> Self {
        if every < MIN_PERIOD {
            warn!(?every, "reconcile period too short, using {MIN_PERIOD:?}");
        }
        Self {
            reconciler,
            every: every.max(MIN_PERIOD),
        }
    }

    /// Main loop. Runs until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(every_secs = self.every.as_secs(), "reconcile engine started");

        let mut interval = tokio::time::interval(self.every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reconcile engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn tick(&self) {
        match self.reconciler.reconcile_all(local_today()) {
            Ok(report) => info!(
                updated = report.updated,
                failed = report.failures.len(),
                "scheduled reconciliation pass"
            ),
            Err(e) => error!("scheduled reconciliation failed: {e}"),
        }
    }
}
