use chrono::NaiveDate;
use tracing::debug;

use crate::types::{EffectiveWindow, Schedule, ScheduleStatus, ScheduleType, StatusChange};

/// Compute the inclusive window a schedule's status is derived from.
///
/// Returns `None` for malformed temporal data: a `regular` schedule without
/// exactly one range, a range that ends before it starts, or a `staggered`
/// schedule with no dates.
pub fn effective_window(schedule: &Schedule) -> Option<EffectiveWindow> {
    match schedule.schedule_type {
        ScheduleType::Regular => {
            let [range] = schedule.ranges.as_slice() else {
                debug!(
                    schedule_id = %schedule.id,
                    ranges = schedule.ranges.len(),
                    "regular schedule needs exactly one range"
                );
                return None;
            };
            if range.end_date < range.start_date {
                debug!(schedule_id = %schedule.id, "range ends before it starts");
                return None;
            }
            Some(EffectiveWindow {
                start: range.start_date,
                end: range.end_date,
            })
        }
        ScheduleType::Staggered => {
            let start = schedule.dates.iter().min()?;
            let end = schedule.dates.iter().max()?;
            Some(EffectiveWindow {
                start: *start,
                end: *end,
            })
        }
    }
}

/// Classify `today` against an inclusive window. Both ends cover their
/// whole calendar day, so comparing dates is enough.
pub fn classify(window: EffectiveWindow, today: NaiveDate) -> ScheduleStatus {
    if today < window.start {
        ScheduleStatus::Planned
    } else if today > window.end {
        ScheduleStatus::Finished
    } else {
        ScheduleStatus::Ongoing
    }
}

/// Decide whether `schedule`'s stored status must change as of `today`.
///
/// Cancelled schedules are never reclassified. Any other stored value,
/// including an unrecognised one, is recomputed from scratch.
pub fn derive_status(schedule: &Schedule, today: NaiveDate) -> StatusChange {
    if schedule.status == Some(ScheduleStatus::Cancelled) {
        return StatusChange::Unchanged;
    }
    let Some(window) = effective_window(schedule) else {
        return StatusChange::Unchanged;
    };
    let computed = classify(window, today);
    if schedule.status == Some(computed) {
        StatusChange::Unchanged
    } else {
        StatusChange::Changed(computed)
    }
}
