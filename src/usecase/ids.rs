use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::task::TaskId;

/// Hands out timestamp-like ids that never repeat, even within the same millisecond.
#[derive(Debug, Default)]
pub struct IdSource {
    last: TaskId,
}

impl IdSource {
    pub fn after(last: TaskId) -> Self {
        Self { last }
    }

    /// `None` once the id space is used up.
    pub fn next(&mut self) -> Option<TaskId> {
        self.last = now_millis().max(self.last.checked_add(1)?);
        Some(self.last)
    }
}

fn now_millis() -> TaskId {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as TaskId
}
