use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a training schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Set by staff; terminal. Never touched by reconciliation.
    Cancelled,
    /// Today is before the first training day.
    Planned,
    /// Today falls inside the effective window.
    Ongoing,
    /// The last training day has passed.
    Finished,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Cancelled => "cancelled",
            ScheduleStatus::Planned => "planned",
            ScheduleStatus::Ongoing => "ongoing",
            ScheduleStatus::Finished => "finished",
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            // `upcoming` is the older spelling of the pre-start state.
            "planned" | "upcoming" => Ok(ScheduleStatus::Planned),
            "ongoing" => Ok(ScheduleStatus::Ongoing),
            "finished" => Ok(ScheduleStatus::Finished),
            other => Err(format!("unknown schedule status: {other}")),
        }
    }
}

/// Shape of a schedule's temporal definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// One contiguous date range.
    Regular,
    /// A set of discrete training days.
    Staggered,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Regular => "regular",
            ScheduleType::Staggered => "staggered",
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "regular" => Ok(ScheduleType::Regular),
            "staggered" => Ok(ScheduleType::Staggered),
            other => Err(format!("unknown schedule type: {other}")),
        }
    }
}

/// Inclusive calendar date range (`schedule_ranges` row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }
}

/// A schedule joined with its ranges and discrete dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// UUID string — primary key.
    pub id: String,
    /// Stored lifecycle state. `None` when the column is NULL or holds a
    /// value outside the known vocabulary. A stored `upcoming` reads as
    /// [`ScheduleStatus::Planned`]: it counts as already correct, is never
    /// rewritten to `planned` on its own, and reports as `planned`.
    pub status: Option<ScheduleStatus>,
    pub schedule_type: ScheduleType,
    /// Populated for `regular` schedules; exactly one entry when well formed.
    #[serde(default)]
    pub ranges: Vec<DateRange>,
    /// Populated for `staggered` schedules; order is irrelevant.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

/// Inclusive `[start, end]` span a status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Result of deriving a schedule's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// No write needed: cancelled, malformed, or already correct.
    Unchanged,
    /// The stored status must be replaced with this value.
    Changed(ScheduleStatus),
}

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    pub old_status: Option<ScheduleStatus>,
    pub new_status: ScheduleStatus,
}

/// A proposed transition whose write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFailure {
    pub id: String,
    pub old_status: Option<ScheduleStatus>,
    pub new_status: ScheduleStatus,
    pub error: String,
}

/// Summary of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Number of schedules whose status was written.
    pub updated: usize,
    pub updates: Vec<StatusUpdate>,
    /// Writes that failed; the rest of the run carried on.
    pub failures: Vec<UpdateFailure>,
}

/// Which schedules a reconciliation run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileTarget {
    /// Every schedule that is not cancelled.
    All,
    /// A single schedule, typically right after its dates were edited.
    One(String),
}
