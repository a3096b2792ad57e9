use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domain::record;
use crate::domain::task::Task;

pub mod memory;
pub mod sqlite;

/// Key under which the whole task list is stored.
pub const TASKS_KEY: &str = "todos";

/// String-keyed storage the task list is persisted into.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Returns `None` when nothing has been saved yet.
pub fn load_tasks(store: &impl Storage) -> Result<Option<Vec<Task>>> {
    let Some(raw) = store.get(TASKS_KEY)? else {
        debug!("no saved tasks");
        return Ok(None);
    };
    let tasks = record::decode(&raw).context("stored task list is malformed")?;
    info!(count = tasks.len(), "loaded tasks");
    Ok(Some(tasks))
}

pub fn save_tasks(store: &mut impl Storage, tasks: &[Task]) -> Result<()> {
    let raw = record::encode(tasks).context("failed to encode tasks")?;
    store.set(TASKS_KEY, &raw)?;
    debug!(count = tasks.len(), "saved tasks");
    Ok(())
}
