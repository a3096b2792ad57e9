mod app;
mod domain;
mod error;
mod repo;
mod ui;
mod usecase;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use domain::task::{Counter, Filter, Task, TaskKind};
use repo::Storage;
use repo::memory::InMemoryStore;
use repo::sqlite::SqliteStore;
use usecase::ids::IdSource;
use usecase::task_list::TaskList;

#[derive(Parser, Debug)]
#[command(author, version, about = "tally: checklist and counter tasks in the terminal", long_about = None)]
struct Args {
    /// Tick interval of render loop in milliseconds
    #[arg(long, default_value_t = 120)]
    tick_ms: u64,

    /// Start with demo tasks
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Use in-memory store instead of SQLite
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Path to SQLite DB file (default: OS data dir)
    #[arg(long, env = "TALLY_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Filter shown at startup
    #[arg(long, value_enum, default_value_t = Filter::All)]
    filter: Filter,

    /// Log level (trace, debug, info, warn, error); RUST_LOG directives also apply
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level).context("failed to set up logging")?;

    let store: Box<dyn Storage> = if args.demo {
        Box::new(InMemoryStore::with_seed(seed_tasks())?)
    } else if args.memory {
        Box::new(InMemoryStore::default())
    } else if let Some(path) = args.db_path.as_ref() {
        Box::new(SqliteStore::open(path)?)
    } else {
        Box::new(SqliteStore::open_default()?)
    };

    let mut tasks = TaskList::load(store)?;
    tasks.set_filter(args.filter);
    info!(count = tasks.tasks().len(), filter = ?args.filter, "starting");

    ui::run(App::new(tasks), Duration::from_millis(args.tick_ms))
}

fn seed_tasks() -> Vec<Task> {
    let kinds = [
        ("Post the parcel", Some(TaskKind::Boolean { done: true })),
        ("Buy milk", Some(TaskKind::Boolean { done: false })),
        ("Stretch 3 times", Counter::from_parts(1, 3).map(TaskKind::Counter)),
        ("Read 5 pages", Counter::new(5).map(TaskKind::Counter)),
    ];
    let mut ids = IdSource::default();
    let mut tasks: Vec<Task> = std::iter::from_fn(|| ids.next())
        .zip(kinds)
        .filter_map(|(id, (text, kind))| {
            let mut task = Task::boolean(id, text);
            task.kind = kind?;
            Some(task)
        })
        .collect();
    // newest first
    tasks.reverse();
    tasks
}

fn setup_logging(level: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("logs");
    fs::create_dir_all(&log_dir).context("failed to create log directory")?;

    let level: tracing::Level = level.parse().unwrap_or_else(|_| {
        eprintln!("Warning: unknown log level '{level}', defaulting to INFO");
        tracing::Level::INFO
    });
    let log_file = fs::File::create(log_dir.join("tally.log")).context("failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(?level, "logging initialized");
    Ok(())
}
