use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use archon_core::{FileTaskStore, Task, TaskService, TokenAuthority};

mod config;
mod table;

#[derive(Parser, Debug)]
#[command(name = "archon", version, about = "Archon task orchestration toolkit")]
struct Cli {
    /// Path to a configuration file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task
    Create {
        /// Title of the task
        #[arg(long)]
        title: String,

        /// Owner responsible for the task
        #[arg(long)]
        owner: String,

        /// One of: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Optional task description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List all tasks
    List,

    /// Mark a task as completed and print its completion token
    Complete { task_id: String },

    /// Export all tasks to a YAML file
    Export { output: PathBuf },

    /// Replace the whole collection from a YAML or JSON file
    Import { input: PathBuf },

    /// Remove every task from the store
    Purge {
        /// Confirm deletion of all tasks
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    tracing::debug!(
        environment = %config.environment,
        database_path = %config.database_path.display(),
        email_notifications = config.notifications.email_enabled,
        sms_notifications = config.notifications.sms_enabled,
        "configuration loaded"
    );

    let store = FileTaskStore::open(&config.database_path)
        .with_context(|| format!("open task store at {}", config.database_path.display()))?;
    let service = TaskService::new(store, TokenAuthority::new(config.token_ttl));

    match cli.command {
        Command::Create {
            title,
            owner,
            priority,
            description,
        } => {
            let task = service.create(&title, &owner, &priority, &description)?;
            println!("Task created with id {}", task.identifier);
        }

        Command::List => {
            let tasks = service.list()?;
            println!("{}", table::format_task_table(&tasks));
        }

        Command::Complete { task_id } => {
            let token = service.complete(&task_id)?;
            println!(
                "{}",
                serde_json::json!({ "task_id": task_id, "completion_token": token })
            );
        }

        Command::Export { output } => {
            let tasks = service.list()?;
            write_yaml(&tasks, &output)?;
            println!("Exported {} tasks to {}", tasks.len(), output.display());
        }

        Command::Import { input } => {
            let tasks = read_task_file(&input)?;
            let count = tasks.len();
            service.import(&tasks)?;
            println!("Imported {} tasks from {}", count, input.display());
        }

        Command::Purge { force } => {
            if !force {
                bail!("refusing to purge without --force");
            }
            let count = service.purge()?;
            println!("Purged {} tasks", count);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn write_yaml(tasks: &[Task], output: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(tasks).context("serialize tasks to YAML")?;
    fs::write(output, yaml).with_context(|| format!("write {}", output.display()))?;
    Ok(())
}

fn read_task_file(input: &Path) -> Result<Vec<Task>> {
    let raw =
        fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let is_yaml = matches!(
        input.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    );
    let tasks = if is_yaml {
        serde_yaml::from_str(&raw).with_context(|| format!("parse {}", input.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parse {}", input.display()))?
    };
    Ok(tasks)
}
