use thiserror::Error;

/// Outcomes of task-list operations the user needs to hear about.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Goal must be a whole number of at least 1")]
    InvalidGoal,

    #[error("No task ids left to assign")]
    IdsExhausted,

    #[error("Failed to load tasks: {0:#}")]
    Load(anyhow::Error),

    #[error("Failed to save tasks: {0:#}")]
    Persist(anyhow::Error),
}

impl TaskError {
    /// Validation problems block the action; storage problems leave the list usable in memory.
    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::InvalidGoal)
    }
}
