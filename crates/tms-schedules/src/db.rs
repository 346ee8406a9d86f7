use rusqlite::Connection;

use crate::error::Result;

/// Initialise the schedule schema in `conn`.
///
/// Creates `schedules` plus the `schedule_ranges` / `schedule_dates` child
/// tables (idempotent). `status` is free text so rows written by older
/// tooling (e.g. `upcoming`) still load.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id             TEXT NOT NULL PRIMARY KEY,
            schedule_type  TEXT NOT NULL,   -- 'regular' | 'staggered'
            status         TEXT,            -- NULL until first reconciliation
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_ranges (
            id           TEXT NOT NULL PRIMARY KEY,
            schedule_id  TEXT NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
            start_date   TEXT NOT NULL,     -- YYYY-MM-DD
            end_date     TEXT NOT NULL      -- YYYY-MM-DD, inclusive
        );

        CREATE TABLE IF NOT EXISTS schedule_dates (
            id           TEXT NOT NULL PRIMARY KEY,
            schedule_id  TEXT NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
            date         TEXT NOT NULL      -- YYYY-MM-DD
        );

        -- Bulk reconciliation filters on status.
        CREATE INDEX IF NOT EXISTS idx_schedules_status ON schedules (status);
        CREATE INDEX IF NOT EXISTS idx_schedule_ranges_schedule ON schedule_ranges (schedule_id);
        CREATE INDEX IF NOT EXISTS idx_schedule_dates_schedule ON schedule_dates (schedule_id);
        ",
    )?;
    Ok(())
}
