use tracing::{debug, warn};

use crate::domain::task::{Counter, Filter, Stats, Task, TaskId, TaskKind, TaskType};
use crate::error::TaskError;
use crate::repo::{self, Storage};
use crate::usecase::ids::IdSource;

/// In-memory task list, newest first, mirrored to storage after every change.
pub struct TaskList<S: Storage> {
    store: S,
    tasks: Vec<Task>,
    filter: Filter,
    ids: IdSource,
}

impl<S: Storage> TaskList<S> {
    pub fn load(store: S) -> Result<Self, TaskError> {
        let tasks = repo::load_tasks(&store)
            .map_err(TaskError::Load)?
            .unwrap_or_default();
        let ids = IdSource::after(tasks.iter().map(|t| t.id).max().unwrap_or(0));
        Ok(Self {
            store,
            tasks,
            filter: Filter::default(),
            ids,
        })
    }

    /// Replaces the in-memory list with whatever storage holds now.
    pub fn reload(&mut self) -> Result<(), TaskError> {
        let tasks = repo::load_tasks(&self.store)
            .map_err(TaskError::Load)?
            .unwrap_or_default();
        if let Some(max) = tasks.iter().map(|t| t.id).max() {
            self.ids = IdSource::after(max);
        }
        self.tasks = tasks;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> impl Iterator<Item = &Task> {
        let filter = self.filter;
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.tasks)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed()).count()
    }

    /// Blank text is ignored and yields `Ok(None)`. Counters need a goal of at least 1.
    pub fn create(
        &mut self,
        text: &str,
        task_type: TaskType,
        goal: Option<&str>,
    ) -> Result<Option<TaskId>, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let id = match task_type {
            TaskType::Boolean => {
                let id = self.ids.next().ok_or(TaskError::IdsExhausted)?;
                self.tasks.insert(0, Task::boolean(id, text));
                id
            }
            TaskType::Counter => {
                let counter = parse_goal(goal).ok_or(TaskError::InvalidGoal)?;
                let id = self.ids.next().ok_or(TaskError::IdsExhausted)?;
                self.tasks.insert(0, Task::counter(id, text, counter));
                id
            }
        };
        debug!(id, kind = task_type.label(), "created task");
        self.save()?;
        Ok(Some(id))
    }

    /// Flips a boolean task. Counters only move through increment/decrement.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool, TaskError> {
        let Some(TaskKind::Boolean { done }) = self.kind_mut(id) else {
            return Ok(false);
        };
        *done = !*done;
        debug!(id, done = *done, "toggled task");
        self.save()?;
        Ok(true)
    }

    pub fn increment(&mut self, id: TaskId) -> Result<bool, TaskError> {
        self.step_counter(id, Counter::increment)
    }

    pub fn decrement(&mut self, id: TaskId) -> Result<bool, TaskError> {
        self.step_counter(id, Counter::decrement)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<bool, TaskError> {
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        self.tasks.remove(pos);
        debug!(id, "deleted task");
        self.save()?;
        Ok(true)
    }

    /// Asks `confirm` only when something is completed; declining leaves the list alone.
    pub fn clear_completed(
        &mut self,
        confirm: impl FnOnce(usize) -> bool,
    ) -> Result<usize, TaskError> {
        let completed = self.completed_count();
        if completed == 0 || !confirm(completed) {
            return Ok(0);
        }
        self.tasks.retain(|t| !t.is_completed());
        debug!(removed = completed, "cleared completed tasks");
        self.save()?;
        Ok(completed)
    }

    fn step_counter(
        &mut self,
        id: TaskId,
        step: fn(&mut Counter) -> bool,
    ) -> Result<bool, TaskError> {
        let Some(TaskKind::Counter(counter)) = self.kind_mut(id) else {
            return Ok(false);
        };
        if !step(counter) {
            return Ok(false);
        }
        debug!(id, current = counter.current(), goal = counter.goal(), "stepped counter");
        self.save()?;
        Ok(true)
    }

    fn kind_mut(&mut self, id: TaskId) -> Option<&mut TaskKind> {
        self.tasks.iter_mut().find(|t| t.id == id).map(|t| &mut t.kind)
    }

    fn save(&mut self) -> Result<(), TaskError> {
        repo::save_tasks(&mut self.store, &self.tasks).map_err(|err| {
            warn!(error = %format!("{err:#}"), "saving tasks failed");
            TaskError::Persist(err)
        })
    }
}

/// Accepts only whole numbers of at least 1.
fn parse_goal(raw: Option<&str>) -> Option<Counter> {
    let goal = raw?.trim().parse::<u32>().ok()?;
    Counter::new(goal)
}
