//! Database module - SQLite storage for saved programs

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::template::ProgramKind;

/// Exercises of one training day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: usize,
    pub exercises: Vec<String>,
}

/// Saved exercises; entries look like `"<subgroup>: <exercise>"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramBody {
    Flat(Vec<String>),
    DayList(Vec<DayEntry>),
    /// `day1`, `day2`, ...
    DayKeyed(BTreeMap<String, Vec<String>>),
}

impl ProgramBody {
    /// Days in order; a flat body counts as day 1
    pub fn days(&self) -> Vec<(usize, &[String])> {
        match self {
            ProgramBody::Flat(exercises) => vec![(1, exercises.as_slice())],
            ProgramBody::DayList(entries) => {
                let mut days: Vec<_> = entries.iter().map(|e| (e.day, e.exercises.as_slice())).collect();
                days.sort_by_key(|(d, _)| *d);
                days
            }
            ProgramBody::DayKeyed(map) => {
                let mut days: Vec<_> = map
                    .iter()
                    .filter_map(|(key, exercises)| {
                        let day = key.strip_prefix("day")?.parse().ok()?;
                        Some((day, exercises.as_slice()))
                    })
                    .collect();
                days.sort_by_key(|(d, _)| *d);
                days
            }
        }
    }

    pub fn exercise_count(&self) -> usize {
        self.days().iter().map(|(_, e)| e.len()).sum()
    }
}

/// Program record, one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgram {
    pub days: usize,
    pub kind: ProgramKind,
    pub label: String,
    pub sets_reps: String,
    pub body: ProgramBody,
    pub saved_at: DateTime<Utc>,
}

/// Storage for saved programs, keyed by Telegram user id
pub trait ProgramStore {
    fn load(&self) -> Result<HashMap<i64, SavedProgram>>;
    fn get(&self, user_id: i64) -> Result<Option<SavedProgram>>;
    fn upsert(&self, user_id: i64, program: &SavedProgram) -> Result<()>;
    /// Returns whether a program existed
    fn delete(&self, user_id: i64) -> Result<bool>;
    /// Make previous mutations durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

type ProgramRow = (i64, i64, String, String, String, String, String);

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS programs (
                user_id INTEGER PRIMARY KEY,
                days INTEGER NOT NULL,
                kind TEXT NOT NULL,
                label TEXT NOT NULL,
                sets_reps TEXT NOT NULL,
                body TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn row_to_program(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgramRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn decode((user_id, days, kind, label, sets_reps, body, saved_at): ProgramRow) -> Result<(i64, SavedProgram)> {
        let program = SavedProgram {
            days: usize::try_from(days)?,
            kind: serde_json::from_str(&kind)?,
            label,
            sets_reps,
            body: serde_json::from_str(&body)?,
            saved_at: DateTime::parse_from_rfc3339(&saved_at)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| anyhow!("bad saved_at for user {}: {}", user_id, e))?,
        };
        Ok((user_id, program))
    }
}

const SELECT_PROGRAMS: &str =
    "SELECT user_id, days, kind, label, sets_reps, body, saved_at FROM programs";

impl ProgramStore for Database {
    fn load(&self) -> Result<HashMap<i64, SavedProgram>> {
        let mut stmt = self.conn.prepare(SELECT_PROGRAMS)?;
        let rows = stmt
            .query_map([], Self::row_to_program)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(Self::decode).collect()
    }

    fn get(&self, user_id: i64) -> Result<Option<SavedProgram>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE user_id = ?1", SELECT_PROGRAMS),
                params![user_id],
                Self::row_to_program,
            )
            .optional()?;
        row.map(|r| Self::decode(r).map(|(_, p)| p)).transpose()
    }

    fn upsert(&self, user_id: i64, program: &SavedProgram) -> Result<()> {
        self.conn.execute(
            "INSERT INTO programs (user_id, days, kind, label, sets_reps, body, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                days = excluded.days,
                kind = excluded.kind,
                label = excluded.label,
                sets_reps = excluded.sets_reps,
                body = excluded.body,
                saved_at = excluded.saved_at",
            params![
                user_id,
                i64::try_from(program.days)?,
                serde_json::to_string(&program.kind)?,
                program.label,
                program.sets_reps,
                serde_json::to_string(&program.body)?,
                program.saved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, user_id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM programs WHERE user_id = ?1", params![user_id])?;
        Ok(removed > 0)
    }
}

/// In-process store, used when no durable storage is needed
#[derive(Default)]
pub struct MemoryStore {
    programs: Mutex<HashMap<i64, SavedProgram>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, SavedProgram>>> {
        self.programs.lock().map_err(|_| anyhow!("program store lock poisoned"))
    }
}

impl ProgramStore for MemoryStore {
    fn load(&self) -> Result<HashMap<i64, SavedProgram>> {
        Ok(self.lock()?.clone())
    }

    fn get(&self, user_id: i64) -> Result<Option<SavedProgram>> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    fn upsert(&self, user_id: i64, program: &SavedProgram) -> Result<()> {
        self.lock()?.insert(user_id, program.clone());
        Ok(())
    }

    fn delete(&self, user_id: i64) -> Result<bool> {
        Ok(self.lock()?.remove(&user_id).is_some())
    }
}
