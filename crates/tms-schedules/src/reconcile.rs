use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, instrument, warn};

use crate::{
    error::{Result, ScheduleError},
    status::derive_status,
    store::ScheduleStore,
    types::{
        ReconcileReport, ReconcileTarget, Schedule, ScheduleStatus, StatusChange, StatusUpdate,
        UpdateFailure,
    },
};

/// Today's date on the server's local calendar, time of day dropped.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Keeps stored schedule statuses in line with their dates.
///
/// Holds the shared store handle; cloning is cheap.
#[derive(Clone)]
pub struct StatusReconciler {
    store: Arc<dyn ScheduleStore>,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    /// Recompute statuses for `target` as of `today` and write back the ones
    /// that changed.
    ///
    /// A failed read aborts the run before anything is written. Writes are
    /// independent: a failed one is logged and recorded in
    /// [`ReconcileReport::failures`], and the rest still go through.
    #[instrument(skip(self))]
    pub fn reconcile(&self, target: &ReconcileTarget, today: NaiveDate) -> Result<ReconcileReport> {
        let candidates = match target {
            ReconcileTarget::All => self.store.fetch_all_excluding(ScheduleStatus::Cancelled)?,
            ReconcileTarget::One(id) => match self.store.fetch_by_id(id) {
                Ok(Some(s)) => vec![s],
                Ok(None) => return Err(ScheduleError::NotFound { id: id.clone() }),
                // Stored but unreadable: cannot classify, so nothing to write.
                Err(ScheduleError::InvalidSchedule(reason)) => {
                    warn!(schedule_id = %id, "skipping schedule: {reason}");
                    Vec::new()
                }
                Err(e) => return Err(e),
            },
        };

        let changes = plan_changes(&candidates, today);
        let mut report = ReconcileReport::default();

        for (id, old_status, new_status) in changes {
            match self.store.update_status(&id, new_status) {
                Ok(()) => {
                    info!(
                        schedule_id = %id,
                        old = %display_status(old_status),
                        new = %new_status,
                        "schedule status updated"
                    );
                    report.updates.push(StatusUpdate {
                        id,
                        old_status,
                        new_status,
                    });
                }
                Err(e) => {
                    error!(schedule_id = %id, "error updating schedule status: {e}");
                    report.failures.push(UpdateFailure {
                        id,
                        old_status,
                        new_status,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.updated = report.updates.len();
        info!(
            candidates = candidates.len(),
            updated = report.updated,
            failed = report.failures.len(),
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Bulk pass over every non-cancelled schedule.
    pub fn reconcile_all(&self, today: NaiveDate) -> Result<ReconcileReport> {
        self.reconcile(&ReconcileTarget::All, today)
    }

    /// Targeted pass over a single schedule.
    pub fn reconcile_one(&self, id: &str, today: NaiveDate) -> Result<ReconcileReport> {
        self.reconcile(&ReconcileTarget::One(id.to_string()), today)
    }

    /// Fire-and-forget targeted pass for edit flows. Errors are logged and
    /// never reach the caller.
    pub fn recalculate(&self, id: &str) {
        match self.reconcile_one(id, local_today()) {
            Ok(report) if report.failures.is_empty() => {}
            Ok(report) => {
                for f in &report.failures {
                    warn!(schedule_id = %f.id, error = %f.error, "status recalculation not saved");
                }
            }
            Err(e) => warn!(schedule_id = %id, "status recalculation failed: {e}"),
        }
    }
}

/// Pure half of reconciliation: `(id, old, new)` for every schedule whose
/// status has to move.
pub fn plan_changes(
    schedules: &[Schedule],
    today: NaiveDate,
) -> Vec<(String, Option<ScheduleStatus>, ScheduleStatus)> {
    schedules
        .iter()
        .filter_map(|s| match derive_status(s, today) {
            StatusChange::Changed(next) => Some((s.id.clone(), s.status, next)),
            StatusChange::Unchanged => None,
        })
        .collect()
}

fn display_status(status: Option<ScheduleStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("none")
}
