use std::collections::HashMap;

use anyhow::Result;

use super::Storage;
use crate::domain::record;
use crate::domain::task::Task;

/// Keeps values for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryStore {
    items: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn with_seed(seed: impl IntoIterator<Item = Task>) -> Result<Self> {
        let tasks: Vec<Task> = seed.into_iter().collect();
        let mut store = Self::default();
        store
            .items
            .insert(super::TASKS_KEY.to_string(), record::encode(&tasks)?);
        Ok(store)
    }
}

impl Storage for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
