use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::{Path, PathBuf};
use todostore::{
    CreateInput, Priority, SearchFilter, SortKey, SortOrder, Task, TaskPatch, TaskStore,
    sort_tasks,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - In-memory task list backed by a JSON session file")]
#[command(version)]
struct Cli {
    /// Path to the session file (default: <data dir>/todostore/tasks.json)
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        text: String,

        /// Priority: high, medium, or low
        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks, optionally filtered and sorted
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,

        /// Only pending tasks
        #[arg(long)]
        pending: bool,

        #[arg(short, long)]
        priority: Option<String>,

        /// Case-insensitive category substring
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,

        /// Tasks due on this calendar day
        #[arg(long)]
        due: Option<String>,

        /// Sort key: createdAt, updatedAt, completedAt, dueDate, priority
        #[arg(long, default_value = "createdAt")]
        sort: SortKey,

        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
    },

    /// Mark a task completed
    Done { id: u64 },

    /// Mark a task not completed
    Undone { id: u64 },

    /// Edit fields of an existing task
    Edit {
        id: u64,

        #[arg(short, long)]
        text: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        due: Option<String>,
    },

    /// Delete a task
    Rm { id: u64 },

    /// Delete every completed task
    Clear,

    /// Show aggregate statistics
    Stats,

    /// List distinct categories
    Categories,

    /// Write the store as a versioned JSON document
    Export {
        /// Output path (stdout when omitted)
        output: Option<PathBuf>,
    },

    /// Import tasks from an exported JSON document
    Import {
        input: PathBuf,

        /// Merge into the current tasks instead of replacing them
        #[arg(long)]
        merge: bool,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let path = match cli.file {
        Some(path) => path,
        None => default_session_path()?,
    };

    let mut store = load_store(&path)?;

    let mutated = match cli.command {
        Commands::Add {
            text,
            priority,
            category,
            due,
        } => {
            let task = store.create(CreateInput::Full {
                text,
                priority: priority.map(Priority::from),
                category,
                due_date: due,
            })?;
            println!("Added task {}", task.id);
            print_task(&task);
            true
        }
        Commands::List {
            completed,
            pending,
            priority,
            category,
            search,
            due,
            sort,
            order,
        } => {
            let filter = SearchFilter {
                completed: if completed {
                    Some(true)
                } else if pending {
                    Some(false)
                } else {
                    None
                },
                priority: priority.map(Priority::from),
                category,
                text: search,
                due_date: due,
            };

            let tasks = sort_tasks(store.search(&filter), sort, order);
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in &tasks {
                print_task(task);
            }
            false
        }
        Commands::Done { id } => {
            let task = store
                .complete(id)?
                .ok_or_else(|| eyre!("task {} not found", id))?;
            print_task(&task);
            true
        }
        Commands::Undone { id } => {
            let task = store
                .uncomplete(id)?
                .ok_or_else(|| eyre!("task {} not found", id))?;
            print_task(&task);
            true
        }
        Commands::Edit {
            id,
            text,
            priority,
            category,
            due,
        } => {
            let patch = TaskPatch {
                text,
                priority: priority.map(Priority::from),
                category,
                due_date: due,
            };
            if patch.is_empty() {
                return Err(eyre!("nothing to update: pass at least one field"));
            }
            let task = store
                .update(id, patch)?
                .ok_or_else(|| eyre!("task {} not found", id))?;
            print_task(&task);
            true
        }
        Commands::Rm { id } => {
            if !store.delete(id)? {
                return Err(eyre!("task {} not found", id));
            }
            println!("Deleted task {}", id);
            true
        }
        Commands::Clear => {
            let removed = store.clear_completed();
            println!("Removed {} completed task(s)", removed);
            removed > 0
        }
        Commands::Stats => {
            print_stats(&store);
            false
        }
        Commands::Categories => {
            for category in store.categories() {
                println!("{}", category);
            }
            false
        }
        Commands::Export { output } => {
            let json = serde_json::to_string_pretty(&store.export())?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write export to {}", path.display()))?;
                    println!("Exported {} task(s) to {}", store.len(), path.display());
                }
                None => println!("{}", json),
            }
            false
        }
        Commands::Import { input, merge } => {
            let data = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let summary = store.import(&data, merge)?;
            println!(
                "Imported {} task(s), skipped {} of {}",
                summary.imported, summary.skipped, summary.total
            );
            true
        }
    };

    if mutated {
        save_store(&store, &path)?;
    }

    Ok(())
}

fn default_session_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| eyre!("could not determine data directory"))?;
    Ok(data_dir.join("todostore").join("tasks.json"))
}

/// Load the session file if it exists; a missing file is an empty store.
fn load_store(path: &Path) -> Result<TaskStore> {
    let mut store = TaskStore::new();

    if path.exists() {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        let summary = store.import(&data, false)?;
        if summary.skipped > 0 {
            warn!(
                skipped = summary.skipped,
                path = %path.display(),
                "session file contained unreadable task records"
            );
        }
    }

    Ok(store)
}

/// Persist the store as an export document.
fn save_store(store: &TaskStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&store.export())?;
    fs::write(path, json)
        .with_context(|| format!("failed to write session file {}", path.display()))?;
    Ok(())
}

fn print_task(task: &Task) {
    let marker = if task.completed {
        "✓".green()
    } else {
        " ".normal()
    };

    let priority = match task.priority {
        Priority::High => task.priority.to_string().red(),
        Priority::Medium => task.priority.to_string().yellow(),
        Priority::Low => task.priority.to_string().blue(),
        Priority::Other(_) => task.priority.to_string().normal(),
    };

    let text = if task.completed {
        task.text.dimmed()
    } else {
        task.text.normal()
    };

    let mut extras = Vec::new();
    if let Some(category) = &task.category {
        extras.push(format!("#{}", category));
    }
    if let Some(due) = &task.due_date {
        extras.push(format!("due {}", due));
    }
    let extras = if extras.is_empty() {
        String::new()
    } else {
        format!("  ({})", extras.join(", "))
    };

    println!("{:>4} [{}] {} {}{}", task.id, marker, priority, text, extras);
}

fn print_stats(store: &TaskStore) {
    let stats = store.stats();
    println!("Total:      {}", stats.total);
    println!("Completed:  {}", stats.completed);
    println!("Pending:    {}", stats.pending);
    println!("Overdue:    {}", stats.overdue);
    println!("Completion: {}%", stats.completion_rate);
    println!(
        "Priority:   high {}, medium {}, low {}",
        stats.priority_stats.high, stats.priority_stats.medium, stats.priority_stats.low
    );
    if !stats.category_stats.is_empty() {
        println!("Categories:");
        for (category, count) in &stats.category_stats {
            println!("  {:<12} {}", category, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = load_store(&temp.path().join("tasks.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tasks.json");

        let mut store = TaskStore::new();
        store
            .create(CreateInput::Full {
                text: "water plants".to_string(),
                priority: Some(Priority::Low),
                category: Some("Home".to_string()),
                due_date: Some("2026-09-05".to_string()),
            })
            .unwrap();
        store.create("read book").unwrap();
        store.complete(2).unwrap();

        save_store(&store, &path).unwrap();
        let restored = load_store(&path).unwrap();

        assert_eq!(restored.len(), 2);
        let plants = restored.get(1).unwrap().unwrap();
        assert_eq!(plants.text, "water plants");
        assert_eq!(plants.priority, Priority::Low);
        assert_eq!(plants.category.as_deref(), Some("Home"));
        assert_eq!(plants.due_date.as_deref(), Some("2026-09-05"));
        assert!(restored.get(2).unwrap().unwrap().completed);
    }

    #[test]
    fn test_load_store_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(load_store(&path).is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
