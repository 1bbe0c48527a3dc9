use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use todostore::render::{format_due_date, render_list};
use todostore::{Backend, Config, FileStorage, SqliteStorage, Storage, TaskStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - Local to-do list with due dates")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the stored tasks (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task description
        text: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks
    List {
        /// Which tasks to show: all, active or completed
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Mark a task done, or not done again
    Toggle {
        /// List position or task id
        task: String,
    },

    /// Delete a task
    Delete {
        /// List position or task id
        task: String,
    },

    /// Change a task's text and/or due date
    Edit {
        /// List position or task id
        task: String,

        #[arg(long)]
        text: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Remove all completed tasks
    ClearCompleted,

    /// Show or change the display theme
    Theme {
        #[arg(value_enum)]
        mode: Option<Theme>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Theme {
    Dark,
    Light,
    Toggle,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with_writer(std::io::stderr)
        .init();

    match &config.source {
        Some(path) => info!(path = %path.display(), "Loaded config"),
        None => debug!("No config file, using defaults"),
    }
    debug!(data_dir = %config.data_dir.display(), backend = ?config.backend, "Starting");

    let storage: Box<dyn Storage> = match config.backend {
        Backend::File => Box::new(FileStorage::open(&config.data_dir)?),
        Backend::Sqlite => Box::new(SqliteStorage::open(&config.data_dir)?),
    };

    let mut store = TaskStore::open(storage);
    let outcome = run(&mut store, cli.command);
    store.close()?;
    outcome
}

fn run<S: Storage>(store: &mut TaskStore<S>, command: Commands) -> Result<()> {
    match command {
        Commands::Add { text, due } => {
            let id = store.add_task(&text, due.as_deref())?;
            if let Some(task) = store.get(&id) {
                println!("Added \"{}\" (due {})", task.text, format_due_date(task.due_date));
            }
        }
        Commands::List { filter } => {
            store.set_filter_str(&filter)?;
            print!("{}", render_list(store));
        }
        Commands::Toggle { task } => {
            let id = resolve_task(store, &task)?;
            store.toggle_completed(&id);
            if let Some(task) = store.get(&id) {
                let state = if task.completed { "done" } else { "not done" };
                println!("Marked \"{}\" as {}", task.text, state);
            }
        }
        Commands::Delete { task } => {
            let id = resolve_task(store, &task)?;
            let text = store.get(&id).map(|t| t.text.clone()).unwrap_or_default();
            store.delete_task(&id);
            println!("Deleted \"{}\"", text);
        }
        Commands::Edit { task, text, due } => {
            let id = resolve_task(store, &task)?;
            store.begin_edit(&id);
            if let Some(text) = text {
                store.set_edit_text(text);
            }
            if let Some(due) = due {
                store.set_edit_date(due);
            }
            store.save_edit(&id)?;
            println!("Updated task {}", task);
        }
        Commands::ClearCompleted => {
            let removed = store.clear_completed();
            println!("Cleared {} completed task(s)", removed);
        }
        Commands::Theme { mode } => {
            match mode {
                Some(Theme::Dark) => store.set_dark_mode(true),
                Some(Theme::Light) => store.set_dark_mode(false),
                Some(Theme::Toggle) => {
                    store.toggle_dark_mode();
                }
                None => {}
            }
            let name = if store.dark_mode() { "dark" } else { "light" };
            println!("Theme: {}", name.bold());
        }
    }

    debug!(filter = %store.filter(), remaining = store.remaining_count(), "Command complete");
    Ok(())
}

/// Turn a 1-based list position or a full task id into a task id
fn resolve_task<S: Storage>(store: &TaskStore<S>, reference: &str) -> Result<String> {
    if let Some(task) = store.get(reference) {
        return Ok(task.id.clone());
    }

    let position: usize = reference
        .parse()
        .map_err(|_| eyre!("No task with id or position {}", reference))?;

    store
        .tasks()
        .get(position.wrapping_sub(1))
        .map(|t| t.id.clone())
        .ok_or_else(|| eyre!("No task at position {} ({} task(s) in list)", position, store.tasks().len()))
}
