pub mod text;

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use crate::app::{App, Field, InputMode};
use crate::domain::task::{Filter, Task, TaskKind, TaskType};
use crate::repo::Storage;
use text::{progress_bar, sanitize};

const BAR_WIDTH: usize = 10;
const LIST_TITLE: &str =
    "Tasks (j/k move ; a add ; n add counter ; Space toggle ; +/- count ; d delete ; c clear done)";

pub fn run<S: Storage>(mut app: App<S>, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_tick = Instant::now();
    let res = loop {
        if let Err(err) = terminal.draw(|f| draw(f, &app)) {
            break Err(err.into());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        match poll_key(timeout) {
            Ok(Some(code)) => match handle_key(&mut app, code) {
                Ok(true) => break Ok(()),
                Ok(false) => {}
                Err(err) => break Err(err),
            },
            Ok(None) => {}
            Err(err) => break Err(err),
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    };

    cleanup_terminal(&mut terminal)?;
    res
}

fn poll_key(timeout: Duration) -> Result<Option<KeyCode>> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        return Ok(Some(key.code));
    }
    Ok(None)
}

/// Returns true when the user asked to quit.
fn handle_key<S: Storage>(app: &mut App<S>, code: KeyCode) -> Result<bool> {
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
            KeyCode::Char('a') => app.start_adding(TaskType::Boolean),
            KeyCode::Char('n') => app.start_adding(TaskType::Counter),
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('+') | KeyCode::Char('l') | KeyCode::Right => app.increment_selected(),
            KeyCode::Char('-') | KeyCode::Char('h') | KeyCode::Left => app.decrement_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Char('c') => app.request_clear(),
            KeyCode::Char('f') => app.cycle_filter(),
            KeyCode::Char('1') => app.set_filter(Filter::All),
            KeyCode::Char('2') => app.set_filter(Filter::Active),
            KeyCode::Char('3') => app.set_filter(Filter::Completed),
            KeyCode::Char('r') => app.reload(),
            _ => {}
        },
        InputMode::Editing => match code {
            KeyCode::Esc => app.cancel_editing(),
            KeyCode::Enter => app.submit_draft(),
            KeyCode::Tab => app.draft.focus_next(),
            KeyCode::Left | KeyCode::Right if app.draft.focus == Field::Type => {
                app.draft.toggle_type()
            }
            KeyCode::Backspace => app.backspace(),
            KeyCode::Char(c) => app.input_char(c),
            _ => {}
        },
        InputMode::ConfirmClear(_) => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_clear(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_clear(false),
            _ => {}
        },
        InputMode::Alert => app.dismiss_alert(),
    }

    Ok(false)
}

fn draw<S: Storage>(f: &mut ratatui::Frame, app: &App<S>) {
    let size = f.area();
    let form_height = match app.mode {
        InputMode::Editing | InputMode::Alert => 5,
        _ => 3,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(form_height),
        ])
        .split(size);

    f.render_widget(render_header(app), chunks[0]);
    f.render_widget(render_filters(app.tasks().filter()), chunks[1]);

    let visible = app.visible();
    if visible.is_empty() {
        f.render_widget(render_empty(app.tasks().filter()), chunks[2]);
    } else {
        let mut list_state = ListState::default();
        list_state.select(Some(app.selected));
        f.render_stateful_widget(render_list(&visible, app.selected), chunks[2], &mut list_state);
    }

    f.render_widget(render_footer(app), chunks[3]);

    match app.mode {
        InputMode::ConfirmClear(count) => {
            let plural = if count == 1 { "task" } else { "tasks" };
            let msg = format!("Clear {count} completed {plural}? This cannot be undone. (y/n)");
            render_popup(f, "Confirm", &msg, Color::Yellow);
        }
        InputMode::Alert => {
            let msg = app.alert.as_deref().unwrap_or_default();
            render_popup(f, "Invalid task (any key)", msg, Color::Red);
        }
        _ => {}
    }
}

fn render_header<S: Storage>(app: &App<S>) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::styled("tally", Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::styled(app.tasks().stats().to_string(), Style::default().fg(Color::Yellow)),
    ]);
    Paragraph::new(line)
        .block(Block::default().title("Overview").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_filters(active: Filter) -> Tabs<'static> {
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .enumerate()
        .map(|(idx, filter)| Line::from(format!("{} {}", idx + 1, filter.label())))
        .collect();
    Tabs::new(titles)
        .select(active.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().title("Filter (f cycle)").borders(Borders::ALL))
}

fn task_line(task: &Task) -> Line<'static> {
    let text = sanitize(&task.text);
    match &task.kind {
        TaskKind::Boolean { done } => {
            let mark = if *done { "[x]" } else { "[ ]" };
            Line::from(format!(" {mark} {text}"))
        }
        TaskKind::Counter(counter) => Line::from(vec![
            Span::raw(format!(" [#] {text}  ")),
            Span::styled(
                progress_bar(counter.fraction(), BAR_WIDTH),
                Style::default().fg(Color::Green),
            ),
            Span::raw(format!(" {}/{}", counter.current(), counter.goal())),
        ]),
    }
}

fn render_list(tasks: &[&Task], selected: usize) -> List<'static> {
    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let style = if idx == selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if task.is_completed() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };

            ListItem::new(task_line(task)).style(style)
        })
        .collect();

    List::new(items)
        .block(Block::default().title(LIST_TITLE).borders(Borders::ALL))
        .highlight_symbol("➤ ")
}

fn render_empty(filter: Filter) -> Paragraph<'static> {
    Paragraph::new(filter.empty_message())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(LIST_TITLE).borders(Borders::ALL))
}

fn render_footer<S: Storage>(app: &App<S>) -> Paragraph<'_> {
    match app.mode {
        InputMode::Editing | InputMode::Alert => {
            let draft = &app.draft;
            let field_style = |field: Field| {
                if draft.focus == field {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                }
            };
            let cursor = |field: Field| if draft.focus == field { "█" } else { "" };

            let mut lines = vec![
                Line::from(vec![
                    Span::raw("Task: "),
                    Span::styled(sanitize(&draft.text).into_owned(), field_style(Field::Text)),
                    Span::raw(cursor(Field::Text)),
                ]),
                Line::from(vec![
                    Span::raw("Type: "),
                    Span::styled(format!("< {} >", draft.task_type.label()), field_style(Field::Type)),
                ]),
            ];
            if draft.task_type == TaskType::Counter {
                lines.push(Line::from(vec![
                    Span::raw("Goal: "),
                    Span::styled(sanitize(&draft.goal).into_owned(), field_style(Field::Goal)),
                    Span::raw(cursor(Field::Goal)),
                ]));
            }
            Paragraph::new(lines).block(
                Block::default()
                    .title("New task (Tab next field ; Enter add ; Esc cancel)")
                    .borders(Borders::ALL),
            )
        }
        InputMode::Normal | InputMode::ConfirmClear(_) => {
            let msg = app
                .status
                .as_deref()
                .unwrap_or("q quit ; a add ; c clear done ; f filter ; r reload");
            Paragraph::new(msg).block(Block::default().title("Normal").borders(Borders::ALL))
        }
    }
}

fn render_popup(f: &mut ratatui::Frame, title: &str, msg: &str, color: Color) {
    let area = centered(f.area(), 60, 5);
    f.render_widget(Clear, area);
    let popup = Paragraph::new(msg.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    f.render_widget(popup, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::InMemoryStore;
    use crate::usecase::task_list::TaskList;

    fn app() -> App<InMemoryStore> {
        App::new(TaskList::load(InMemoryStore::default()).unwrap())
    }

    fn press(app: &mut App<InMemoryStore>, keys: &[KeyCode]) -> bool {
        keys.iter()
            .any(|code| handle_key(app, *code).unwrap())
    }

    fn typed(text: &str) -> Vec<KeyCode> {
        text.chars().map(KeyCode::Char).collect()
    }

    #[test]
    fn add_counter_from_keyboard() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n')]);
        press(&mut app, &typed("Read 5 pages"));
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        press(&mut app, &typed("5"));
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(app.mode, InputMode::Normal);
        let counter = app.visible()[0].as_counter().copied().unwrap();
        assert_eq!((counter.current(), counter.goal()), (0, 5));

        press(&mut app, &[KeyCode::Char('+'), KeyCode::Right, KeyCode::Char('l')]);
        press(&mut app, &[KeyCode::Char('-')]);
        let counter = app.visible()[0].as_counter().copied().unwrap();
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn type_selector_switches_with_arrows() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Tab, KeyCode::Right]);
        assert_eq!(app.draft.task_type, TaskType::Counter);
        press(&mut app, &[KeyCode::Char(' ')]);
        assert_eq!(app.draft.task_type, TaskType::Boolean);
    }

    #[test]
    fn alert_swallows_next_key() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n')]);
        press(&mut app, &typed("x"));
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.mode, InputMode::Alert);

        assert!(!press(&mut app, &[KeyCode::Char('q')]));
        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.draft.text, "x");
    }

    #[test]
    fn clear_flow_and_quit() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('a')]);
        press(&mut app, &typed("done soon"));
        press(&mut app, &[KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('c')]);
        assert_eq!(app.mode, InputMode::ConfirmClear(1));

        press(&mut app, &[KeyCode::Char('y')]);
        assert!(app.visible().is_empty());
        assert_eq!(app.tasks().stats().to_string(), "0 tasks");

        assert!(press(&mut app, &[KeyCode::Char('q')]));
    }

    #[test]
    fn number_keys_pick_filters() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('3')]);
        assert_eq!(app.tasks().filter(), Filter::Completed);
        press(&mut app, &[KeyCode::Char('f')]);
        assert_eq!(app.tasks().filter(), Filter::All);
    }

    fn screen(app: &App<InMemoryStore>) -> String {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn empty_list_explains_itself_per_filter() {
        let mut app = app();
        assert!(screen(&app).contains("No tasks yet. Add one above!"));

        press(&mut app, &[KeyCode::Char('a')]);
        press(&mut app, &typed("only one"));
        press(&mut app, &[KeyCode::Enter]);
        assert!(!screen(&app).contains("No tasks yet"));

        press(&mut app, &[KeyCode::Char('3')]);
        assert!(screen(&app).contains("No completed tasks"));

        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char(' ')]);
        assert!(screen(&app).contains("No active tasks"));
    }

    #[test]
    fn counter_rows_show_progress() {
        let mut task = Task::boolean(1, "x");
        task.kind = TaskKind::Counter(crate::domain::task::Counter::from_parts(3, 5).unwrap());
        let rendered: String = task_line(&task)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(rendered.contains("3/5"));
        assert!(rendered.contains(&progress_bar(0.6, BAR_WIDTH)));
    }
}
