use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveTime, Utc};
use habit_core::model::{Frequency, Habit, HabitCompletion, NewCompletion};
use habit_core::{parse_clock_time, timestamp, CLOCK_TIME_FORMAT};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::tracker;

use super::{sort_completions, sort_habits, Counts, Store, StoreError, UserRecord};

const HABIT_COLUMNS: &str = "id, user_id, name, description, frequency, target_time, created_at, \
     last_completed, streak, success_rate, difficulty, category, is_active";

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file and apply the schema.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        Self::init(Connection::open(db_path)?)
    }

    /// Private in-memory database; handy for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(include_str!("../../migrations/0001_init.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn bad_column(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw).ok_or_else(|| bad_column(idx, format!("invalid timestamp {raw}")))
}

fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => timestamp::parse(&raw)
            .map(Some)
            .ok_or_else(|| bad_column(idx, format!("invalid timestamp {raw}"))),
        None => Ok(None),
    }
}

fn clock_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    parse_clock_time(&raw).ok_or_else(|| bad_column(idx, format!("invalid clock time {raw}")))
}

fn clock_string(t: &NaiveTime) -> String {
    t.format(CLOCK_TIME_FORMAT).to_string()
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let frequency: String = row.get(4)?;
    let target_time = match row.get::<_, Option<String>>(5)? {
        Some(_) => Some(clock_column(row, 5)?),
        None => None,
    };
    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        frequency: Frequency::parse(&frequency)
            .ok_or_else(|| bad_column(4, format!("invalid frequency {frequency}")))?,
        target_time,
        created_at: ts_column(row, 6)?,
        last_completed: opt_ts_column(row, 7)?,
        streak: row.get(8)?,
        success_rate: row.get(9)?,
        difficulty: row.get(10)?,
        category: row.get(11)?,
        is_active: row.get(12)?,
    })
}

fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<HabitCompletion> {
    Ok(HabitCompletion {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        completed_at: ts_column(row, 2)?,
        notes: row.get(3)?,
        mood: row.get(4)?,
        difficulty: row.get(5)?,
    })
}

fn count(conn: &Connection, table: &str) -> Result<u64, StoreError> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n as u64)
}

impl Store for SqliteStore {
    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users(id, name, preferred_notification_time, timezone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.name,
                clock_string(&user.preferred_notification_time),
                user.timezone,
                timestamp::format(&user.created_at),
            ],
        )
        .map_err(|e| {
            if is_constraint(&e) {
                StoreError::Conflict(format!("user {}", user.id))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, name, preferred_notification_time, timezone, created_at
                 FROM users WHERE id = ?1",
                [id],
                |r| {
                    Ok(UserRecord {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        preferred_notification_time: clock_column(r, 2)?,
                        timezone: r.get(3)?,
                        created_at: ts_column(r, 4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO habits({HABIT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                habit.id,
                habit.user_id,
                habit.name,
                habit.description,
                habit.frequency.as_str(),
                habit.target_time.as_ref().map(clock_string),
                timestamp::format(&habit.created_at),
                habit.last_completed.as_ref().map(timestamp::format),
                habit.streak,
                habit.success_rate,
                habit.difficulty,
                habit.category,
                habit.is_active,
            ],
        )
        .map_err(|e| {
            if is_constraint(&e) {
                StoreError::Conflict(format!("habit {}", habit.id))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn get_habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        let conn = self.lock()?;
        let habit = conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                [id],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    fn list_habits(&self, user_id: Option<&str>) -> Result<Vec<Habit>, StoreError> {
        let conn = self.lock()?;
        let mut habits = vec![];
        match user_id {
            Some(user_id) => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1"))?;
                for row in stmt.query_map([user_id], habit_from_row)? {
                    habits.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits"))?;
                for row in stmt.query_map([], habit_from_row)? {
                    habits.push(row?);
                }
            }
        }
        sort_habits(&mut habits);
        Ok(habits)
    }

    fn deactivate_habit(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute("UPDATE habits SET is_active = 0 WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> Result<(HabitCompletion, Habit), StoreError> {
        let mut conn = self.lock()?;
        // Dropping the transaction on an early return rolls it back.
        let tx = conn.transaction()?;
        let mut habit = tx
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                [&completion.habit_id],
                habit_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("habit {}", completion.habit_id)))?;
        if !habit.is_active {
            return Err(StoreError::Inactive(format!("habit {}", habit.id)));
        }

        tx.execute(
            "INSERT INTO habit_completions(habit_id, completed_at, notes, mood, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                completion.habit_id,
                timestamp::format(&completion.completed_at),
                completion.notes,
                completion.mood,
                completion.difficulty,
            ],
        )?;
        let stored = HabitCompletion::from_new(tx.last_insert_rowid(), completion.clone());
        let total: i64 = tx.query_row(
            "SELECT COUNT(*) FROM habit_completions WHERE habit_id = ?1",
            [&habit.id],
            |r| r.get(0),
        )?;

        tracker::apply_completion(&mut habit, stored.completed_at, total as usize);
        tx.execute(
            "UPDATE habits SET streak = ?2, last_completed = ?3, success_rate = ?4 WHERE id = ?1",
            params![
                habit.id,
                habit.streak,
                habit.last_completed.as_ref().map(timestamp::format),
                habit.success_rate,
            ],
        )?;
        tx.commit()?;
        Ok((stored, habit))
    }

    fn list_completions(&self, habit_id: &str) -> Result<Vec<HabitCompletion>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, completed_at, notes, mood, difficulty
             FROM habit_completions WHERE habit_id = ?1",
        )?;
        let mut out = vec![];
        for row in stmt.query_map([habit_id], completion_from_row)? {
            out.push(row?);
        }
        sort_completions(&mut out);
        Ok(out)
    }

    fn counts(&self) -> Result<Counts, StoreError> {
        let conn = self.lock()?;
        Ok(Counts {
            users: count(&conn, "users")?,
            habits: count(&conn, "habits")?,
            completions: count(&conn, "habit_completions")?,
        })
    }
}
