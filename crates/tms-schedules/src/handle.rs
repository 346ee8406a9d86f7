use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{Result, ScheduleError},
    reconcile::StatusReconciler,
    types::{DateRange, Schedule, ScheduleStatus, ScheduleType},
};

/// Schedule management used by the edit endpoints.
///
/// Every change to a schedule's dates is followed by a targeted
/// reconciliation so the new status shows up without waiting for the next
/// bulk pass.
#[derive(Clone)]
pub struct ScheduleHandle {
    reconciler: StatusReconciler,
}

impl ScheduleHandle {
    pub fn new(reconciler: StatusReconciler) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &StatusReconciler {
        &self.reconciler
    }

    /// Look up a schedule by ID.
    pub fn get(&self, id: &str) -> Result<Schedule> {
        self.reconciler
            .store()
            .fetch_by_id(id)?
            .ok_or_else(|| ScheduleError::NotFound { id: id.to_string() })
    }

    /// Create a schedule. It starts out `planned` and is reconciled right away.
    pub fn create(
        &self,
        schedule_type: ScheduleType,
        range: Option<DateRange>,
        dates: &[NaiveDate],
    ) -> Result<Schedule> {
        let (ranges, dates) = validate_dates(schedule_type, range, dates)?;
        let schedule = Schedule {
            id: Uuid::new_v4().to_string(),
            status: Some(ScheduleStatus::Planned),
            schedule_type,
            ranges,
            dates,
        };
        self.reconciler.store().insert_schedule(&schedule)?;
        info!(schedule_id = %schedule.id, %schedule_type, "schedule created");

        self.reconciler.recalculate(&schedule.id);
        self.get(&schedule.id)
    }

    /// Replace a schedule's type and dates, then recalculate its status.
    ///
    /// The recalculation is best-effort: once the new dates are saved this
    /// returns `Ok` even if the status write fails.
    pub fn replace_dates(
        &self,
        id: &str,
        schedule_type: ScheduleType,
        range: Option<DateRange>,
        dates: &[NaiveDate],
    ) -> Result<()> {
        let (ranges, dates) = validate_dates(schedule_type, range, dates)?;
        self.reconciler
            .store()
            .replace_dates(id, schedule_type, &ranges, &dates)?;
        info!(schedule_id = %id, %schedule_type, "schedule dates replaced");

        self.reconciler.recalculate(id);
        Ok(())
    }

    /// Mark a schedule cancelled. Reconciliation leaves it alone afterwards.
    pub fn cancel(&self, id: &str) -> Result<()> {
        self.reconciler
            .store()
            .update_status(id, ScheduleStatus::Cancelled)?;
        info!(schedule_id = %id, "schedule cancelled");
        Ok(())
    }
}

/// Check a temporal definition against its schedule type.
///
/// `regular` keeps only the range; `staggered` keeps only the dates,
/// sorted and de-duplicated.
fn validate_dates(
    schedule_type: ScheduleType,
    range: Option<DateRange>,
    dates: &[NaiveDate],
) -> Result<(Vec<DateRange>, Vec<NaiveDate>)> {
    match schedule_type {
        ScheduleType::Regular => {
            let range = range.ok_or_else(|| {
                ScheduleError::InvalidSchedule("regular schedule requires a date range".into())
            })?;
            if range.end_date < range.start_date {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "range ends ({}) before it starts ({})",
                    range.end_date, range.start_date
                )));
            }
            Ok((vec![range], Vec::new()))
        }
        ScheduleType::Staggered => {
            if dates.is_empty() {
                return Err(ScheduleError::InvalidSchedule(
                    "staggered schedule requires at least one date".into(),
                ));
            }
            let mut dates = dates.to_vec();
            dates.sort_unstable();
            dates.dedup();
            Ok((Vec::new(), dates))
        }
    }
}
