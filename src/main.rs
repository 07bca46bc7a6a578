use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::path::PathBuf;
use std::process;
use todostore::{Backend, Config, Filter, Notice, NoticeKind, Stats, Task, TaskError, TaskStore, View, transfer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore CLI - add, complete, edit and filter short text tasks")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task store (overrides config)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Persistence backend (overrides config)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks
    List {
        #[arg(short, long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },

    /// Mark a task completed, or active again
    Toggle { id: String },

    /// Replace the text of a task
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    Delete { id: String },

    /// Delete all completed tasks
    ClearCompleted,

    /// Show task counts
    Stats,

    /// Export tasks to todos-YYYY-MM-DD.json
    Export {
        /// Output directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Replace all tasks with the contents of a JSON file
    Import { file: PathBuf },
}

/// Prints the list, counts and notices to the terminal
struct TerminalView {
    show_list: bool,
}

impl View for TerminalView {
    fn render(&mut self, tasks: &[Task]) {
        if !self.show_list {
            return;
        }
        if tasks.is_empty() {
            println!("{}", "No tasks here yet".dimmed());
            return;
        }
        for task in tasks {
            if task.completed {
                println!("{} {} {}", "[x]".green(), task.short_id().yellow(), task.text.dimmed());
            } else {
                println!("[ ] {} {}", task.short_id().yellow(), task.text);
            }
        }
    }

    fn update_stats(&mut self, stats: Stats) {
        if self.show_list {
            print_stats(stats);
        }
    }

    fn show_notice(&mut self, notice: &Notice) {
        print_notice(notice);
    }
}

fn print_stats(stats: Stats) {
    println!(
        "{} total, {} active, {} completed",
        stats.total.to_string().bold(),
        stats.active.to_string().bold(),
        stats.completed.to_string().bold()
    );
}

fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("{}", notice.message.green()),
        NoticeKind::Error => eprintln!("{}", notice.message.red()),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red(), e);
        process::exit(2);
    }
}

fn run() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(store_path) = cli.store_path {
        config.store_dir = store_path;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let mut store = TaskStore::open(config.open_slot()?);

    let show_list = matches!(cli.command, Commands::List { .. });
    store.subscribe(Box::new(TerminalView { show_list }));

    let result = execute(&mut store, &config, cli.command);

    if let Err(e) = result {
        print_notice(&Notice::error(e.to_string()));
        process::exit(1);
    }
    if store.is_dirty() {
        process::exit(1);
    }

    Ok(())
}

fn execute<S: todostore::Slot>(store: &mut TaskStore<S>, config: &Config, command: Commands) -> Result<(), TaskError> {
    match command {
        Commands::Add { text } => {
            store.add(&text.join(" "))?;
        }
        Commands::List { filter } => {
            store.set_filter(filter);
        }
        Commands::Toggle { id } => {
            let id = store.resolve_id(&id)?;
            store.toggle(&id)?;
        }
        Commands::Edit { id, text } => {
            let id = store.resolve_id(&id)?;
            let before = store.get(&id).map(|t| t.text.clone());
            let task = store.edit(&id, &text.join(" "))?;
            if before.as_deref() == Some(task.text.as_str()) {
                println!("{}", "Task unchanged".dimmed());
            }
        }
        Commands::Delete { id } => {
            let id = store.resolve_id(&id)?;
            store.delete(&id)?;
        }
        Commands::ClearCompleted => {
            if store.clear_completed() == 0 {
                println!("{}", "No completed tasks to clear".dimmed());
            }
        }
        Commands::Stats => {
            print_stats(store.stats());
        }
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = transfer::export_to_dir(store, &dir)
                .map_err(|e| TaskError::PersistenceWriteFailed(format!("{:#}", e)))?;
            println!("{}", path.display());
        }
        Commands::Import { file } => {
            transfer::import_from_file(store, &file)?;
        }
    }
    Ok(())
}
