use tracing::warn;

use crate::domain::task::{Filter, Task, TaskId, TaskType};
use crate::error::TaskError;
use crate::repo::Storage;
use crate::usecase::task_list::TaskList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Waiting for y/n before clearing this many completed tasks.
    ConfirmClear(usize),
    /// A validation message that must be dismissed before editing continues.
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Text,
    Type,
    Goal,
}

/// Contents of the add form.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub task_type: TaskType,
    pub goal: String,
    pub focus: Field,
}

impl Draft {
    pub fn focus_next(&mut self) {
        self.focus = match (self.focus, self.task_type) {
            (Field::Text, _) => Field::Type,
            (Field::Type, TaskType::Counter) => Field::Goal,
            (Field::Type, TaskType::Boolean) | (Field::Goal, _) => Field::Text,
        };
    }

    pub fn toggle_type(&mut self) {
        self.task_type = self.task_type.toggled();
    }

    fn goal_input(&self) -> Option<&str> {
        match self.task_type {
            TaskType::Counter => Some(self.goal.as_str()),
            TaskType::Boolean => None,
        }
    }
}

pub struct App<S: Storage> {
    tasks: TaskList<S>,
    pub selected: usize,
    pub mode: InputMode,
    pub draft: Draft,
    pub status: Option<String>,
    pub alert: Option<String>,
}

impl<S: Storage> App<S> {
    pub fn new(tasks: TaskList<S>) -> Self {
        Self {
            tasks,
            selected: 0,
            mode: InputMode::Normal,
            draft: Draft::default(),
            status: None,
            alert: None,
        }
    }

    pub fn tasks(&self) -> &TaskList<S> {
        &self.tasks
    }

    pub fn visible(&self) -> Vec<&Task> {
        self.tasks.visible().collect()
    }

    pub fn reload(&mut self) {
        match self.tasks.reload() {
            Ok(()) => self.set_status("Reloaded"),
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    pub fn select_next(&mut self) {
        let len = self.tasks.visible().count();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.tasks.visible().nth(self.selected).map(|t| t.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.tasks.visible().count();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.tasks.set_filter(filter);
        self.clamp_selection();
        self.set_status(&format!("Showing {}", filter.label().to_lowercase()));
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.tasks.filter().next());
    }

    pub fn start_adding(&mut self, task_type: TaskType) {
        self.draft = Draft {
            task_type,
            ..Draft::default()
        };
        self.mode = InputMode::Editing;
        self.set_status("Type new task and press Enter");
    }

    pub fn cancel_editing(&mut self) {
        self.mode = InputMode::Normal;
        self.draft = Draft::default();
        self.set_status("Canceled");
    }

    pub fn input_char(&mut self, c: char) {
        match self.draft.focus {
            Field::Text => self.draft.text.push(c),
            Field::Goal => self.draft.goal.push(c),
            Field::Type => {
                if c == ' ' {
                    self.draft.toggle_type();
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        match self.draft.focus {
            Field::Text => {
                self.draft.text.pop();
            }
            Field::Goal => {
                self.draft.goal.pop();
            }
            Field::Type => {}
        }
    }

    pub fn submit_draft(&mut self) {
        let result = self.tasks.create(
            &self.draft.text,
            self.draft.task_type,
            self.draft.goal_input(),
        );
        match result {
            Ok(None) => {}
            Ok(Some(id)) => {
                self.finish_adding(id);
                self.set_status("Added");
            }
            Err(err) if err.is_validation() => {
                self.alert = Some(err.to_string());
                self.mode = InputMode::Alert;
            }
            Err(err @ TaskError::Persist(_)) => {
                if let Some(task) = self.tasks.tasks().first() {
                    self.finish_adding(task.id);
                }
                self.report(err);
            }
            Err(err) => self.report(err),
        }
    }

    fn finish_adding(&mut self, id: TaskId) {
        self.draft = Draft::default();
        self.mode = InputMode::Normal;
        let pos = self.tasks.visible().position(|t| t.id == id);
        match pos {
            Some(pos) => self.selected = pos,
            None => self.clamp_selection(),
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.mode = InputMode::Editing;
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let result = self.tasks.toggle(id);
        self.apply(result, "Toggled completion", "Counter tasks change with +/-");
    }

    pub fn increment_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let result = self.tasks.increment(id);
        self.apply(result, "Incremented", "Nothing to increment");
    }

    pub fn decrement_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let result = self.tasks.decrement(id);
        self.apply(result, "Decremented", "Nothing to decrement");
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let result = self.tasks.delete(id);
        self.apply(result, "Deleted", "Already gone");
    }

    /// Opens the confirmation prompt, or does nothing at all when nothing is completed.
    pub fn request_clear(&mut self) {
        let completed = self.tasks.completed_count();
        if completed == 0 {
            self.set_status("No completed items");
            return;
        }
        self.mode = InputMode::ConfirmClear(completed);
    }

    pub fn answer_clear(&mut self, confirmed: bool) {
        self.mode = InputMode::Normal;
        match self.tasks.clear_completed(|_| confirmed) {
            Ok(0) => self.set_status("Kept completed items"),
            Ok(removed) => self.set_status(&format!("Cleared {removed} completed")),
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn apply(&mut self, result: Result<bool, TaskError>, changed: &str, unchanged: &str) {
        match result {
            Ok(true) => self.set_status(changed),
            Ok(false) => self.set_status(unchanged),
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn report(&mut self, err: TaskError) {
        warn!(%err, "task operation failed");
        self.set_status(&err.to_string());
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status = Some(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::InMemoryStore;

    fn app() -> App<InMemoryStore> {
        App::new(TaskList::load(InMemoryStore::default()).unwrap())
    }

    fn type_text(app: &mut App<InMemoryStore>, text: &str) {
        for c in text.chars() {
            app.input_char(c);
        }
    }

    fn add_counter(app: &mut App<InMemoryStore>, text: &str, goal: &str) {
        app.start_adding(TaskType::Counter);
        type_text(app, text);
        app.draft.focus = Field::Goal;
        type_text(app, goal);
        app.submit_draft();
    }

    #[test]
    fn adding_selects_the_new_task() {
        let mut app = app();
        app.start_adding(TaskType::Boolean);
        type_text(&mut app, "Buy milk");
        app.submit_draft();
        add_counter(&mut app, "Read 5 pages", "5");

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.selected, 0);
        assert_eq!(app.visible()[0].text, "Read 5 pages");
        assert_eq!(app.tasks().stats().to_string(), "2 tasks");
    }

    #[test]
    fn blank_draft_stays_open_without_message() {
        let mut app = app();
        app.start_adding(TaskType::Boolean);
        type_text(&mut app, "   ");
        let status = app.status.clone();
        app.submit_draft();

        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.status, status);
        assert!(app.tasks().tasks().is_empty());
    }

    #[test]
    fn invalid_goal_raises_alert_and_keeps_draft() {
        let mut app = app();
        add_counter(&mut app, "Stretch", "0");

        assert_eq!(app.mode, InputMode::Alert);
        assert!(app.alert.as_deref().unwrap().contains("Goal"));
        assert!(app.tasks().tasks().is_empty());

        app.dismiss_alert();
        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.draft.text, "Stretch");
    }

    #[test]
    fn exhausted_ids_keep_the_form_open() {
        let mut store = InMemoryStore::default();
        crate::repo::save_tasks(&mut store, &[Task::boolean(TaskId::MAX, "last")]).unwrap();
        let mut app = App::new(TaskList::load(store).unwrap());

        app.start_adding(TaskType::Boolean);
        type_text(&mut app, "one more");
        app.submit_draft();

        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.draft.text, "one more");
        assert_eq!(app.status.as_deref(), Some("No task ids left to assign"));
        assert_eq!(app.tasks().tasks().len(), 1);
    }

    #[test]
    fn goal_field_is_skipped_for_boolean_drafts() {
        let mut draft = Draft::default();
        draft.focus_next();
        assert_eq!(draft.focus, Field::Type);
        draft.focus_next();
        assert_eq!(draft.focus, Field::Text);

        draft.toggle_type();
        draft.focus_next();
        draft.focus_next();
        assert_eq!(draft.focus, Field::Goal);
    }

    #[test]
    fn boolean_draft_ignores_leftover_goal() {
        let mut app = app();
        app.start_adding(TaskType::Counter);
        type_text(&mut app, "plain");
        app.draft.focus = Field::Goal;
        type_text(&mut app, "junk");
        app.draft.toggle_type();
        app.submit_draft();

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.visible()[0].task_type(), TaskType::Boolean);
    }

    #[test]
    fn clear_prompts_only_when_something_is_done() {
        let mut app = app();
        app.start_adding(TaskType::Boolean);
        type_text(&mut app, "a");
        app.submit_draft();

        app.request_clear();
        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.status.as_deref(), Some("No completed items"));

        app.toggle_selected();
        app.request_clear();
        assert_eq!(app.mode, InputMode::ConfirmClear(1));

        app.answer_clear(false);
        assert_eq!(app.tasks().tasks().len(), 1);

        app.request_clear();
        app.answer_clear(true);
        assert!(app.tasks().tasks().is_empty());
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn selection_follows_filter() {
        let mut app = app();
        for text in ["a", "b", "c"] {
            app.start_adding(TaskType::Boolean);
            type_text(&mut app, text);
            app.submit_draft();
        }
        app.selected = 2;
        app.toggle_selected();

        app.set_filter(Filter::Completed);
        assert_eq!(app.selected, 0);
        assert_eq!(app.visible().len(), 1);
        assert_eq!(app.visible()[0].text, "a");
    }

    #[test]
    fn counter_steps_through_selection() {
        let mut app = app();
        add_counter(&mut app, "reps", "2");

        app.increment_selected();
        app.increment_selected();
        assert!(app.visible()[0].is_completed());
        app.increment_selected();
        assert_eq!(app.status.as_deref(), Some("Nothing to increment"));

        app.toggle_selected();
        assert!(app.visible()[0].is_completed());

        app.decrement_selected();
        assert!(!app.visible()[0].is_completed());
    }
}
