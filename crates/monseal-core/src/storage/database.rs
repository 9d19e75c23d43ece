//! SQLite-backed document store.
//!
//! Persists user records, the single current-monster record per user, and
//! the append-only sealed-monster history. The current monster lives in
//! one keyed row with a mutable `monster_id` column, so retiring one
//! monster and installing the next is a single guarded UPDATE -- there is
//! no window in which a user has zero or two current monsters.
//!
//! Row decoding is deliberately tolerant: a negative counter or an
//! unparsable timestamp is coerced to its default and logged as a
//! data-quality warning instead of failing the read.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use super::data_dir;
use crate::error::StoreError;
use crate::progress::{MonsterProgress, SealedMonster, UserStreak};
use crate::storage::store::DocumentStore;
use crate::user::UserProfile;

/// SQLite document store at `~/.config/monseal/monseal.db`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at the default location, creating file and schema
    /// if they don't exist.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("monseal.db"))
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.lock()
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS users (
                    user_id                TEXT PRIMARY KEY,
                    github_login           TEXT NOT NULL,
                    photo_url              TEXT NOT NULL DEFAULT '',
                    created_at             TEXT NOT NULL,
                    continuous_seal_record INTEGER NOT NULL DEFAULT 0,
                    max_seal_record        INTEGER NOT NULL DEFAULT 0,
                    streak_reflected_at    TEXT
                );

                CREATE TABLE IF NOT EXISTS current_monster (
                    user_id                TEXT PRIMARY KEY REFERENCES users(user_id),
                    monster_id             TEXT NOT NULL,
                    progress_contributions INTEGER NOT NULL DEFAULT 0,
                    required_contributions INTEGER NOT NULL DEFAULT 0,
                    last_reflected_at      TEXT,
                    assigned_at            TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sealed_monsters (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id      TEXT NOT NULL,
                    monster_id   TEXT NOT NULL,
                    monster_name TEXT NOT NULL,
                    sealed_at    TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sealed_monsters_user
                    ON sealed_monsters(user_id, id);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Coerce a stored counter to `u32`, warning on out-of-range data.
fn coerce_count(raw: Option<i64>, field: &str, user_id: &str) -> u32 {
    match raw {
        Some(n) if n >= 0 => u32::try_from(n).unwrap_or_else(|_| {
            warn!(user = user_id, field, value = n, "counter out of range, using u32::MAX");
            u32::MAX
        }),
        Some(n) => {
            warn!(user = user_id, field, value = n, "negative counter, defaulting to 0");
            0
        }
        None => {
            warn!(user = user_id, field, "missing counter, defaulting to 0");
            0
        }
    }
}

/// Parse a stored RFC3339 timestamp, warning and yielding `None` on drift.
fn coerce_timestamp(raw: Option<String>, field: &str, user_id: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            warn!(
                user = user_id,
                field,
                value = %raw,
                error = %e,
                "unparsable timestamp, treating as unset"
            );
            None
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl DocumentStore for SqliteStore {
    fn create_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO users (user_id, github_login, photo_url, created_at,
                                continuous_seal_record, max_seal_record, streak_reflected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.user_id,
                profile.github_login,
                profile.photo_url,
                profile.created_at.to_rfc3339(),
                profile.streak.continuous_seal_record,
                profile.streak.max_seal_record,
                profile.streak.last_reflected_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::QueryFailed(format!("user '{}' already exists", profile.user_id))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn get_user(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT github_login, photo_url, created_at,
                        continuous_seal_record, max_seal_record, streak_reflected_at
                 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("user '{user_id}'"))
                }
                other => other.into(),
            })?;

        let (github_login, photo_url, created_at, continuous, max, reflected) = row;
        Ok(UserProfile {
            user_id: user_id.to_string(),
            github_login,
            photo_url,
            created_at: coerce_timestamp(Some(created_at), "created_at", user_id)
                .unwrap_or(DateTime::UNIX_EPOCH),
            streak: UserStreak {
                continuous_seal_record: coerce_count(continuous, "continuous_seal_record", user_id),
                max_seal_record: coerce_count(max, "max_seal_record", user_id),
                last_reflected_at: coerce_timestamp(reflected, "streak_reflected_at", user_id),
            },
        })
    }

    fn get_current_monster(&self, user_id: &str) -> Result<MonsterProgress, StoreError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT monster_id, progress_contributions, required_contributions,
                        last_reflected_at, assigned_at
                 FROM current_monster WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("current monster for user '{user_id}'"))
                }
                other => other.into(),
            })?;

        let (monster_id, progress, required, reflected, assigned) = row;
        Ok(MonsterProgress {
            monster_id,
            progress_contributions: coerce_count(progress, "progress_contributions", user_id),
            required_contributions: coerce_count(required, "required_contributions", user_id),
            last_reflected_at: coerce_timestamp(reflected, "last_reflected_at", user_id),
            assigned_at: coerce_timestamp(Some(assigned), "assigned_at", user_id)
                .unwrap_or(DateTime::UNIX_EPOCH),
        })
    }

    fn set_current_monster(
        &self,
        user_id: &str,
        progress: &MonsterProgress,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO current_monster (user_id, monster_id, progress_contributions,
                                          required_contributions, last_reflected_at, assigned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                 monster_id = excluded.monster_id,
                 progress_contributions = excluded.progress_contributions,
                 required_contributions = excluded.required_contributions,
                 last_reflected_at = excluded.last_reflected_at,
                 assigned_at = excluded.assigned_at",
            params![
                user_id,
                progress.monster_id,
                progress.progress_contributions,
                progress.required_contributions,
                progress.last_reflected_at.map(|t| t.to_rfc3339()),
                progress.assigned_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::NotFound(format!("user '{user_id}'"))
            } else {
                StoreError::from(e)
            }
        })?;
        Ok(())
    }

    fn replace_current_monster(
        &self,
        user_id: &str,
        retiring_monster_id: &str,
        next: &MonsterProgress,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE current_monster SET
                 monster_id = ?3,
                 progress_contributions = ?4,
                 required_contributions = ?5,
                 last_reflected_at = ?6,
                 assigned_at = ?7
             WHERE user_id = ?1 AND monster_id = ?2",
            params![
                user_id,
                retiring_monster_id,
                next.monster_id,
                next.progress_contributions,
                next.required_contributions,
                next.last_reflected_at.map(|t| t.to_rfc3339()),
                next.assigned_at.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "current monster '{retiring_monster_id}' for user '{user_id}'"
            )));
        }
        Ok(())
    }

    fn delete_current_monster(&self, user_id: &str, monster_id: &str) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "DELETE FROM current_monster WHERE user_id = ?1 AND monster_id = ?2",
            params![user_id, monster_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "current monster '{monster_id}' for user '{user_id}'"
            )));
        }
        Ok(())
    }

    fn append_sealed_monster(
        &self,
        user_id: &str,
        sealed: &SealedMonster,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO sealed_monsters (user_id, monster_id, monster_name, sealed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                sealed.monster_id,
                sealed.monster_name,
                sealed.sealed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn list_sealed_monsters(&self, user_id: &str) -> Result<Vec<SealedMonster>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT monster_id, monster_name, sealed_at
             FROM sealed_monsters WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut sealed = Vec::new();
        for row in rows {
            let (monster_id, monster_name, sealed_at) = row?;
            sealed.push(SealedMonster {
                monster_name,
                sealed_at: coerce_timestamp(sealed_at, "sealed_at", user_id)
                    .unwrap_or(DateTime::UNIX_EPOCH),
                monster_id,
            });
        }
        Ok(sealed)
    }

    fn update_user_streak(&self, user_id: &str, streak: &UserStreak) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE users SET
                 continuous_seal_record = ?2,
                 max_seal_record = ?3,
                 streak_reflected_at = ?4
             WHERE user_id = ?1",
            params![
                user_id,
                streak.continuous_seal_record,
                streak.max_seal_record,
                streak.last_reflected_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user '{user_id}'")));
        }
        Ok(())
    }
}
