use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{Result, ScheduleError},
    types::{DateRange, Schedule, ScheduleStatus, ScheduleType},
};

const DATE_FMT: &str = "%Y-%m-%d";

/// Persistence seam consulted by reconciliation and the edit flow.
///
/// Every method is a separate request; implementations are not expected to
/// offer transactions spanning several schedules.
pub trait ScheduleStore: Send + Sync {
    /// Fetch one schedule joined with its ranges and dates.
    ///
    /// A row that exists but cannot be read back (unknown type, unparseable
    /// date text) is [`ScheduleError::InvalidSchedule`], not `None`.
    fn fetch_by_id(&self, id: &str) -> Result<Option<Schedule>>;

    /// Fetch every schedule whose status is not `excluded`. Rows with a NULL
    /// or unrecognised status are included; rows that cannot be read back
    /// are logged and left out.
    fn fetch_all_excluding(&self, excluded: ScheduleStatus) -> Result<Vec<Schedule>>;

    /// Overwrite the status of a single schedule.
    fn update_status(&self, id: &str, status: ScheduleStatus) -> Result<()>;

    /// Insert a new schedule with its temporal definition.
    fn insert_schedule(&self, schedule: &Schedule) -> Result<()>;

    /// Swap a schedule's type and temporal definition for new ones.
    fn replace_dates(
        &self,
        id: &str,
        schedule_type: ScheduleType,
        ranges: &[DateRange],
        dates: &[NaiveDate],
    ) -> Result<()>;
}

/// SQLite-backed [`ScheduleStore`].
///
/// Created once at startup and shared behind an `Arc`; the connection is
/// serialised through a `Mutex`.
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Wrap `conn`, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))
    }
}

impl ScheduleStore for SqliteScheduleStore {
    #[instrument(skip(self))]
    fn fetch_by_id(&self, id: &str) -> Result<Option<Schedule>> {
        let conn = self.lock()?;
        let head = match conn.query_row(
            "SELECT id, schedule_type, status FROM schedules WHERE id = ?1",
            [id],
            row_to_head,
        ) {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(ScheduleError::Database(e)),
        };

        let mut children = Children::load(&conn, Some(id))?;
        assemble(head, &mut children)
            .map(Some)
            .map_err(ScheduleError::InvalidSchedule)
    }

    #[instrument(skip(self))]
    fn fetch_all_excluding(&self, excluded: ScheduleStatus) -> Result<Vec<Schedule>> {
        let conn = self.lock()?;
        let heads: Vec<Head> = {
            let mut stmt = conn.prepare(
                "SELECT id, schedule_type, status FROM schedules
                 WHERE status IS NULL OR status != ?1
                 ORDER BY created_at, id",
            )?;
            let rows = stmt.query_map([excluded.as_str()], row_to_head)?;
            let heads = rows.collect::<rusqlite::Result<Vec<Head>>>()?;
            heads
        };

        let mut children = Children::load(&conn, None)?;
        Ok(heads
            .into_iter()
            .filter_map(|h| {
                let id = h.id.clone();
                match assemble(h, &mut children) {
                    Ok(s) => Some(s),
                    Err(reason) => {
                        warn!(schedule_id = %id, "skipping schedule: {reason}");
                        None
                    }
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    fn update_status(&self, id: &str, status: ScheduleStatus) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let n = conn.execute(
            "UPDATE schedules SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), now, id],
        )?;
        if n == 0 {
            return Err(ScheduleError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    #[instrument(skip(self, schedule), fields(schedule_id = %schedule.id))]
    fn insert_schedule(&self, schedule: &Schedule) -> Result<()> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO schedules (id, schedule_type, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![
                schedule.id,
                schedule.schedule_type.as_str(),
                schedule.status.map(|s| s.as_str()),
                now
            ],
        )?;
        insert_children(&tx, &schedule.id, &schedule.ranges, &schedule.dates)?;
        tx.commit()?;
        Ok(())
    }

    #[instrument(skip(self, ranges, dates))]
    fn replace_dates(
        &self,
        id: &str,
        schedule_type: ScheduleType,
        ranges: &[DateRange],
        dates: &[NaiveDate],
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        let n = tx.execute(
            "UPDATE schedules SET schedule_type = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![schedule_type.as_str(), now, id],
        )?;
        if n == 0 {
            return Err(ScheduleError::NotFound { id: id.to_string() });
        }
        tx.execute("DELETE FROM schedule_ranges WHERE schedule_id = ?1", [id])?;
        tx.execute("DELETE FROM schedule_dates WHERE schedule_id = ?1", [id])?;
        insert_children(&tx, id, ranges, dates)?;
        tx.commit()?;
        Ok(())
    }
}

// --- row helpers -------------------------------------------------------------

/// `schedules` columns before the child tables are joined in.
struct Head {
    id: String,
    schedule_type: String,
    status: Option<String>,
}

fn row_to_head(row: &rusqlite::Row<'_>) -> rusqlite::Result<Head> {
    Ok(Head {
        id: row.get(0)?,
        schedule_type: row.get(1)?,
        status: row.get(2)?,
    })
}

/// Child rows of one or all schedules, keyed by schedule id.
struct Children {
    ranges: HashMap<String, Vec<DateRange>>,
    dates: HashMap<String, Vec<NaiveDate>>,
    /// Schedules with at least one child row whose date text does not parse.
    corrupt: HashSet<String>,
}

impl Children {
    /// Load children for one schedule, or for all when `schedule_id` is `None`.
    fn load(conn: &Connection, schedule_id: Option<&str>) -> Result<Self> {
        let mut children = Children {
            ranges: HashMap::new(),
            dates: HashMap::new(),
            corrupt: HashSet::new(),
        };

        let mut stmt = conn.prepare_cached(
            "SELECT schedule_id, start_date, end_date FROM schedule_ranges
             WHERE ?1 IS NULL OR schedule_id = ?1",
        )?;
        let rows = stmt.query_map([schedule_id], |row| {
            Ok((
                row.get::<_, String>(0)?, // schedule_id
                row.get::<_, String>(1)?, // start_date
                row.get::<_, String>(2)?, // end_date
            ))
        })?;
        for row in rows {
            let (sid, start, end) = row?;
            match (parse_date(&sid, &start), parse_date(&sid, &end)) {
                (Some(start), Some(end)) => {
                    children
                        .ranges
                        .entry(sid)
                        .or_default()
                        .push(DateRange::new(start, end));
                }
                _ => {
                    children.corrupt.insert(sid);
                }
            }
        }

        let mut stmt = conn.prepare_cached(
            "SELECT schedule_id, date FROM schedule_dates
             WHERE ?1 IS NULL OR schedule_id = ?1
             ORDER BY date",
        )?;
        let rows = stmt.query_map([schedule_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (sid, raw) = row?;
            match parse_date(&sid, &raw) {
                Some(date) => children.dates.entry(sid).or_default().push(date),
                None => {
                    children.corrupt.insert(sid);
                }
            }
        }

        Ok(children)
    }
}

/// Build a [`Schedule`], taking its children out of `children`.
///
/// Fails with the reason when the schedule type is unknown or any of its
/// child rows holds an unparseable date. Such rows cannot be classified.
fn assemble(head: Head, children: &mut Children) -> std::result::Result<Schedule, String> {
    let schedule_type: ScheduleType = head.schedule_type.parse()?;
    let ranges = children.ranges.remove(&head.id).unwrap_or_default();
    let dates = children.dates.remove(&head.id).unwrap_or_default();
    if children.corrupt.contains(&head.id) {
        return Err(format!("schedule {} has unparseable dates", head.id));
    }
    let status = head.status.as_deref().and_then(|s| match s.parse::<ScheduleStatus>() {
        Ok(st) => Some(st),
        Err(e) => {
            warn!(schedule_id = %head.id, "{e}; treating as unset");
            None
        }
    });
    Ok(Schedule {
        ranges,
        dates,
        id: head.id,
        status,
        schedule_type,
    })
}

fn parse_date(schedule_id: &str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, DATE_FMT) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(schedule_id = %schedule_id, value = %raw, "bad date: {e}");
            None
        }
    }
}

fn insert_children(
    conn: &Connection,
    schedule_id: &str,
    ranges: &[DateRange],
    dates: &[NaiveDate],
) -> Result<()> {
    for range in ranges {
        conn.execute(
            "INSERT INTO schedule_ranges (id, schedule_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                schedule_id,
                range.start_date.format(DATE_FMT).to_string(),
                range.end_date.format(DATE_FMT).to_string(),
            ],
        )?;
    }
    for date in dates {
        conn.execute(
            "INSERT INTO schedule_dates (id, schedule_id, date) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                schedule_id,
                date.format(DATE_FMT).to_string(),
            ],
        )?;
    }
    Ok(())
}
