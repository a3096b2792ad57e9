use std::fmt;

use time::OffsetDateTime;

pub type TaskId = i64;

/// Which kind of task the user asked for in the add form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskType {
    #[default]
    Boolean,
    Counter,
}

impl TaskType {
    pub fn toggled(self) -> Self {
        match self {
            TaskType::Boolean => TaskType::Counter,
            TaskType::Counter => TaskType::Boolean,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskType::Boolean => "boolean",
            TaskType::Counter => "counter",
        }
    }
}

/// Progress toward a numeric goal. Always `0 <= current <= goal` and `goal >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    current: u32,
    goal: u32,
}

impl Counter {
    pub fn new(goal: u32) -> Option<Self> {
        (goal >= 1).then_some(Self { current: 0, goal })
    }

    /// Rebuilds a counter from stored values, clamping `current` into range.
    pub fn from_parts(current: i64, goal: i64) -> Option<Self> {
        let goal = u32::try_from(goal).ok().filter(|g| *g >= 1)?;
        let current = current.clamp(0, i64::from(goal)) as u32;
        Some(Self { current, goal })
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.goal
    }

    /// Returns false when already at the goal.
    pub fn increment(&mut self) -> bool {
        if self.current >= self.goal {
            return false;
        }
        self.current += 1;
        true
    }

    /// Returns false when already at zero.
    pub fn decrement(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn fraction(&self) -> f64 {
        f64::from(self.current) / f64::from(self.goal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Boolean { done: bool },
    Counter(Counter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub kind: TaskKind,
    pub created_at: OffsetDateTime,
}

impl Task {
    pub fn boolean(id: TaskId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            kind: TaskKind::Boolean { done: false },
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn counter(id: TaskId, text: impl Into<String>, counter: Counter) -> Self {
        Self {
            id,
            text: text.into(),
            kind: TaskKind::Counter(counter),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self.kind {
            TaskKind::Boolean { .. } => TaskType::Boolean,
            TaskKind::Counter(_) => TaskType::Counter,
        }
    }

    /// Counters are complete exactly when they reach their goal.
    pub fn is_completed(&self) -> bool {
        match &self.kind {
            TaskKind::Boolean { done } => *done,
            TaskKind::Counter(counter) => counter.is_complete(),
        }
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match &self.kind {
            TaskKind::Counter(counter) => Some(counter),
            TaskKind::Boolean { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.is_completed(),
            Filter::Completed => task.is_completed(),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// What to show when no task passes the filter.
    pub fn empty_message(self) -> &'static str {
        match self {
            Filter::All => "No tasks yet. Add one above!",
            Filter::Active => "No active tasks",
            Filter::Completed => "No completed tasks",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Filter::All => 0,
            Filter::Active => 1,
            Filter::Completed => 2,
        }
    }
}

/// Counts over the whole list, independent of the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
}

impl Stats {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = Stats {
            total: 0,
            active: 0,
        };
        for task in tasks {
            stats.total += 1;
            if !task.is_completed() {
                stats.active += 1;
            }
        }
        stats
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            write!(f, "0 tasks")
        } else if self.active == self.total {
            let noun = if self.total == 1 { "task" } else { "tasks" };
            write!(f, "{} {noun}", self.total)
        } else {
            write!(f, "{} of {} active", self.active, self.total)
        }
    }
}
