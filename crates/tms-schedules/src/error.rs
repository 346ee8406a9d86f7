use thiserror::Error;

/// Errors that can occur within the schedule status subsystem.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The provided temporal definition is invalid for its schedule type.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// No schedule with the given ID exists in the store.
    #[error("Schedule not found: {id}")]
    NotFound { id: String },

    /// The store connection lock was poisoned by a panicking holder.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
