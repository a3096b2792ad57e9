use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use super::Storage;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(path)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("failed to open db {}", path.display()))?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }
}

impl Storage for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read key {key}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode=WAL;
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .context("failed to initialize schema")?;
    Ok(())
}

pub fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("failed to resolve data dir")?;
    Ok(base.join("tally").join("tally.sqlite"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{Counter, Task};
    use crate::repo::{load_tasks, save_tasks};

    #[test]
    fn sqlite_store_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut store = SqliteStore::open(tmp.path()).unwrap();

        assert!(store.get("todos").unwrap().is_none());
        store.set("todos", "[]").unwrap();
        store.set("todos", "[1]").unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn tasks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.sqlite");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            let tasks = vec![
                Task::counter(2, "pushups", Counter::new(10).unwrap()),
                Task::boolean(1, "laundry"),
            ];
            save_tasks(&mut store, &tasks).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let tasks = load_tasks(&store).unwrap().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].as_counter().map(|c| c.goal()), Some(10));
    }
}
