//! Stored layout of the task list: a JSON array of flat records, one per task.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use super::task::{Counter, Task, TaskId, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Boolean,
    Counter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        let (kind, current, goal) = match &task.kind {
            TaskKind::Boolean { .. } => (RecordType::Boolean, None, None),
            TaskKind::Counter(counter) => (
                RecordType::Counter,
                Some(i64::from(counter.current())),
                Some(i64::from(counter.goal())),
            ),
        };
        Self {
            id: task.id,
            text: task.text.clone(),
            kind,
            completed: task.is_completed(),
            current,
            goal,
            created_at: task.created_at.format(&Rfc3339).ok(),
        }
    }
}

impl TaskRecord {
    /// Converts back into a task. A counter without a usable goal yields `None`;
    /// a stored `completed` flag on a counter is ignored in favour of its progress.
    pub fn into_task(self) -> Option<Task> {
        let kind = match self.kind {
            RecordType::Boolean => TaskKind::Boolean {
                done: self.completed,
            },
            RecordType::Counter => {
                let goal = self.goal?;
                TaskKind::Counter(Counter::from_parts(self.current.unwrap_or(0), goal)?)
            }
        };
        let created_at = match self.created_at.as_deref() {
            Some(raw) => OffsetDateTime::parse(raw, &Rfc3339).unwrap_or_else(|err| {
                warn!(id = self.id, %raw, %err, "unparsable createdAt, using epoch");
                OffsetDateTime::UNIX_EPOCH
            }),
            None => OffsetDateTime::UNIX_EPOCH,
        };
        Some(Task {
            id: self.id,
            text: self.text,
            kind,
            created_at,
        })
    }
}

pub fn encode(tasks: &[Task]) -> serde_json::Result<String> {
    let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
    serde_json::to_string(&records)
}

/// Parses a stored list, keeping order. Unusable records and repeated ids are dropped.
pub fn decode(raw: &str) -> serde_json::Result<Vec<Task>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let record: TaskRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, %err, "dropping unreadable task record");
                continue;
            }
        };
        let id = record.id;
        if seen.contains(&id) {
            warn!(id, "dropping task with duplicate id");
            continue;
        }
        match record.into_task() {
            Some(task) => {
                seen.insert(id);
                tasks.push(task);
            }
            None => warn!(id, "dropping counter task without a valid goal"),
        }
    }
    Ok(tasks)
}
