//! SQLite-based routine storage.
//!
//! Provides persistent storage for:
//! - Routines, with their run state and both timers (timers as JSON)
//! - Tasks, keyed by (routine, task id)
//! - Key-value store for the in-progress routine reference

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::repository::RoutineRepository;
use crate::error::{EngineError, Result, StorageError};
use crate::routine::{Routine, RoutineId, RoutineState, RoutineSummary, Task};
use crate::timer::ElapsedTimer;

const IN_PROGRESS_KEY: &str = "in_progress_routine_id";

/// SQLite database for routines and tasks.
pub struct SqliteRoutineRepository {
    conn: Connection,
}

impl SqliteRoutineRepository {
    /// Open the database at `~/.config/habitizer/habitizer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("habitizer.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS routines (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                title              TEXT NOT NULL,
                sort_order         INTEGER NOT NULL,
                state              TEXT NOT NULL DEFAULT 'idle',
                current_task_index INTEGER NOT NULL DEFAULT 0,
                goal_time_secs     INTEGER NOT NULL DEFAULT 60,
                routine_timer      TEXT NOT NULL,
                task_timer         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                routine_id            INTEGER NOT NULL REFERENCES routines(id) ON DELETE CASCADE,
                id                    INTEGER NOT NULL,
                title                 TEXT NOT NULL,
                sort_order            INTEGER NOT NULL,
                checkoff_elapsed_secs INTEGER,
                PRIMARY KEY (routine_id, id)
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_routines_sort_order ON routines(sort_order);
            CREATE INDEX IF NOT EXISTS idx_tasks_routine_order ON tasks(routine_id, sort_order);",
        )?;
        Ok(())
    }

    fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn load_tasks(&self, routine_id: RoutineId) -> Result<Vec<Task>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, sort_order, checkoff_elapsed_secs
             FROM tasks
             WHERE routine_id = ?1
             ORDER BY sort_order, id",
        )?;
        let rows = stmt.query_map(params![routine_id], |row| {
            Ok(Task::from_storage(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get::<_, Option<i64>>(3)?.map(|secs| secs.max(0) as u64),
            ))
        })?;
        rows.collect()
    }
}

/// Raw `routines` row, before its text columns are parsed.
struct RoutineRow {
    id: RoutineId,
    title: String,
    sort_order: i32,
    state: String,
    current_task_index: i64,
    goal_time_secs: i64,
    routine_timer: String,
    task_timer: String,
}

impl RoutineRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            sort_order: row.get(2)?,
            state: row.get(3)?,
            current_task_index: row.get(4)?,
            goal_time_secs: row.get(5)?,
            routine_timer: row.get(6)?,
            task_timer: row.get(7)?,
        })
    }

    fn into_routine(self, tasks: Vec<Task>) -> Result<Routine> {
        let corrupt = |message: String| StorageError::Corrupt {
            routine_id: self.id,
            message,
        };
        let state = RoutineState::parse(&self.state)
            .ok_or_else(|| corrupt(format!("unknown state '{}'", self.state)))?;
        let routine_timer: ElapsedTimer = serde_json::from_str(&self.routine_timer)
            .map_err(|e| corrupt(format!("routine timer: {e}")))?;
        let task_timer: ElapsedTimer = serde_json::from_str(&self.task_timer)
            .map_err(|e| corrupt(format!("task timer: {e}")))?;
        let current_task_index = usize::try_from(self.current_task_index)
            .ok()
            .filter(|&i| i <= tasks.len())
            .ok_or_else(|| corrupt(format!("cursor {} out of range", self.current_task_index)))?;

        let mut routine = Routine::new(self.id, self.title, self.sort_order)
            .with_goal_time(self.goal_time_secs.max(1) as u64);
        routine.state = state;
        routine.tasks = tasks;
        routine.current_task_index = current_task_index;
        routine.routine_timer = routine_timer;
        routine.task_timer = task_timer;
        routine.sort_tasks();
        Ok(routine)
    }
}

const ROUTINE_COLUMNS: &str =
    "id, title, sort_order, state, current_task_index, goal_time_secs, routine_timer, task_timer";

impl RoutineRepository for SqliteRoutineRepository {
    fn list_routines(&self) -> Result<Vec<RoutineSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.title, r.sort_order, r.state, COUNT(t.id)
             FROM routines r
             LEFT JOIN tasks t ON t.routine_id = r.id
             GROUP BY r.id
             ORDER BY r.sort_order, r.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, RoutineId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, title, sort_order, state, task_count) = row?;
            let state = RoutineState::parse(&state).ok_or_else(|| StorageError::Corrupt {
                routine_id: id,
                message: format!("unknown state '{state}'"),
            })?;
            summaries.push(RoutineSummary {
                id,
                title,
                sort_order,
                state,
                task_count: task_count.max(0) as usize,
            });
        }
        Ok(summaries)
    }

    fn get_routine(&self, id: RoutineId) -> Result<Option<Routine>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE id = ?1"),
                params![id],
                RoutineRow::from_row,
            )
            .optional()?;
        match row {
            Some(row) => {
                let tasks = self.load_tasks(id)?;
                Ok(Some(row.into_routine(tasks)?))
            }
            None => Ok(None),
        }
    }

    fn list_tasks(&self, routine_id: RoutineId) -> Result<Vec<Task>> {
        Ok(self.load_tasks(routine_id)?)
    }

    fn in_progress_id(&self) -> Result<Option<RoutineId>> {
        let Some(value) = self.kv_get(IN_PROGRESS_KEY)? else {
            return Ok(None);
        };
        match value.parse::<RoutineId>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                tracing::warn!(value = %value, "ignoring malformed in-progress routine id");
                Ok(None)
            }
        }
    }

    fn insert_routine(&mut self, title: &str, goal_time_secs: u64) -> Result<Routine> {
        let sort_order: i32 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM routines",
            [],
            |row| row.get(0),
        )?;
        let blank = serde_json::to_string(&ElapsedTimer::default())?;
        self.conn.execute(
            "INSERT INTO routines (title, sort_order, state, current_task_index, goal_time_secs, routine_timer, task_timer)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5)",
            params![
                title,
                sort_order,
                RoutineState::Idle.as_str(),
                goal_time_secs.max(1) as i64,
                blank,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Routine::new(id, title, sort_order).with_goal_time(goal_time_secs))
    }

    fn save_routine(&mut self, routine: &Routine) -> Result<()> {
        let routine_timer = serde_json::to_string(routine.routine_timer())?;
        let task_timer = serde_json::to_string(routine.task_timer())?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE routines
             SET title = ?2, sort_order = ?3, state = ?4, current_task_index = ?5,
                 goal_time_secs = ?6, routine_timer = ?7, task_timer = ?8
             WHERE id = ?1",
            params![
                routine.id(),
                routine.title(),
                routine.sort_order(),
                routine.state().as_str(),
                routine.current_task_index() as i64,
                routine.goal_time_secs() as i64,
                routine_timer,
                task_timer,
            ],
        )?;
        if updated == 0 {
            return Err(EngineError::routine_not_found(routine.id()).into());
        }

        tx.execute("DELETE FROM tasks WHERE routine_id = ?1", params![routine.id()])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO tasks (routine_id, id, title, sort_order, checkoff_elapsed_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for task in routine.tasks() {
                insert.execute(params![
                    routine.id(),
                    task.id,
                    task.title,
                    task.sort_order,
                    task.checkoff_elapsed_secs().map(|secs| secs as i64),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn set_in_progress(&mut self, id: Option<RoutineId>) -> Result<()> {
        match id {
            Some(id) => self.kv_set(IN_PROGRESS_KEY, &id.to_string())?,
            None => self.kv_delete(IN_PROGRESS_KEY)?,
        }
        Ok(())
    }
}
