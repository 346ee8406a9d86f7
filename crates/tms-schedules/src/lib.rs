//! `tms-schedules` — training schedule status engine with SQLite persistence.
//!
//! # Overview
//!
//! A schedule's status is derived from its dates and today's date. The
//! [`reconcile::StatusReconciler`] fetches schedules through a
//! [`store::ScheduleStore`], derives each status with
//! [`status::derive_status`] and writes back only the ones that changed.
//!
//! # Status rules
//!
//! | Today relative to the effective window | Status     |
//! |----------------------------------------|------------|
//! | before the first day                   | `planned`  |
//! | first day ..= last day                 | `ongoing`  |
//! | after the last day                     | `finished` |
//!
//! `regular` schedules use their single date range as the window;
//! `staggered` schedules use the earliest and latest of their dates.
//! `cancelled` schedules are never touched.

pub mod db;
pub mod engine;
pub mod error;
pub mod handle;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod types;

pub use engine::ReconcileEngine;
pub use error::{Result, ScheduleError};
pub use handle::ScheduleHandle;
pub use reconcile::{local_today, StatusReconciler};
pub use status::derive_status;
pub use store::{ScheduleStore, SqliteScheduleStore};
pub use types::{
    DateRange, ReconcileReport, ReconcileTarget, Schedule, ScheduleStatus, ScheduleType,
    StatusChange, StatusUpdate, UpdateFailure,
};
