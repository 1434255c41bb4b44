//! Command-line interface for kanban
//!
//! This module defines the CLI structure using clap derive macros.
//! Item commands live in `task`, schedule views in `schedule`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::model::TaskType;
use crate::output::OutputOptions;
use crate::storage::FileStore;

mod schedule;
mod task;

/// kanban - tasks, epics and subtasks with schedule conflict checks
#[derive(Parser, Debug)]
#[command(name = "kanban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// CSV data file (defaults to storage.file from kanban.toml)
    #[arg(long, global = true, env = "KANBAN_FILE")]
    pub file: Option<PathBuf>,

    /// Configuration file (defaults to ./kanban.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plain tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epics and their subtasks
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Subtasks of an epic
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Show any item by id (recorded in the history)
    Show {
        /// Item id
        id: u32,
    },

    /// Recently viewed items, oldest first
    History,

    /// Scheduled tasks and subtasks by start time
    Next,

    /// Time slot queries
    #[command(subcommand)]
    Slot(SlotCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change a task
    Update {
        id: u32,
        #[command(flatten)]
        changes: ItemChanges,
    },
    /// Delete a task
    Rm { id: u32 },
    /// List all tasks
    List,
    /// Delete all tasks
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename or redescribe an epic
    Update {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an epic and all of its subtasks
    Rm { id: u32 },
    /// List all epics
    List,
    /// Delete all epics and subtasks
    Clear,
    /// List the subtasks of an epic
    Subtasks { id: u32 },
}

#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Create a subtask under an epic
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Owning epic id
        #[arg(long)]
        epic: u32,
    },
    /// Change a subtask
    Update {
        id: u32,
        #[command(flatten)]
        changes: ItemChanges,
    },
    /// Delete a subtask
    Rm { id: u32 },
    /// List all subtasks
    List,
    /// Delete all subtasks
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SlotCommands {
    /// Find the earliest free stretch
    Free {
        /// Length in minutes
        #[arg(long)]
        duration: u32,
        /// Search from this time (yyyy-MM-dd HH:mm:ss); defaults to now
        #[arg(long)]
        after: Option<String>,
    },
    /// Occupancy of the time grid
    Stats,
}

/// Field changes accepted by `task update` and `subtask update`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ItemChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// NEW, IN_PROGRESS or DONE
    #[arg(long)]
    pub status: Option<String>,
    /// Duration in minutes
    #[arg(long, allow_hyphen_values = true)]
    pub duration: Option<i64>,
    /// Start time (yyyy-MM-dd HH:mm:ss)
    #[arg(long, conflicts_with = "clear_start")]
    pub start: Option<String>,
    /// Remove the start time
    #[arg(long)]
    pub clear_start: bool,
}

/// Global options shared by every command
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub file: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl StoreOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Open the data file named by the flags or the configuration
    pub fn open(&self) -> Result<FileStore> {
        let (config, root) = match &self.config {
            Some(path) => (
                Config::load(path)?,
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
            ),
            None => (Config::load_from_dir(Path::new(".")), PathBuf::new()),
        };
        let file = match &self.file {
            Some(file) => file.clone(),
            None => root.join(&config.storage.file),
        };
        FileStore::open(file, &config.schedule)
    }
}

impl Commands {
    /// Name reported in the JSON envelope, e.g. `epic subtasks`
    pub fn name(&self) -> String {
        let (group, verb) = match self {
            Commands::Task(cmd) => ("task", cmd.verb()),
            Commands::Epic(cmd) => ("epic", cmd.verb()),
            Commands::Subtask(cmd) => ("subtask", cmd.verb()),
            Commands::Slot(SlotCommands::Free { .. }) => ("slot", "free"),
            Commands::Slot(SlotCommands::Stats) => ("slot", "stats"),
            Commands::Show { .. } => return "show".to_string(),
            Commands::History => return "history".to_string(),
            Commands::Next => return "next".to_string(),
        };
        format!("{group} {verb}")
    }
}

impl TaskCommands {
    fn verb(&self) -> &'static str {
        match self {
            TaskCommands::New { .. } => "new",
            TaskCommands::Update { .. } => "update",
            TaskCommands::Rm { .. } => "rm",
            TaskCommands::List => "list",
            TaskCommands::Clear => "clear",
        }
    }
}

impl EpicCommands {
    fn verb(&self) -> &'static str {
        match self {
            EpicCommands::New { .. } => "new",
            EpicCommands::Update { .. } => "update",
            EpicCommands::Rm { .. } => "rm",
            EpicCommands::List => "list",
            EpicCommands::Clear => "clear",
            EpicCommands::Subtasks { .. } => "subtasks",
        }
    }
}

impl SubtaskCommands {
    fn verb(&self) -> &'static str {
        match self {
            SubtaskCommands::New { .. } => "new",
            SubtaskCommands::Update { .. } => "update",
            SubtaskCommands::Rm { .. } => "rm",
            SubtaskCommands::List => "list",
            SubtaskCommands::Clear => "clear",
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let store = StoreOptions {
            file: self.file,
            config: self.config,
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Task(cmd) => match cmd {
                TaskCommands::New { name, description } => task::run_new(task::NewOptions {
                    kind: TaskType::Task,
                    name,
                    description,
                    epic: None,
                    store,
                }),
                TaskCommands::Update { id, changes } => task::run_update(task::UpdateOptions {
                    kind: TaskType::Task,
                    id,
                    changes,
                    store,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    kind: TaskType::Task,
                    id,
                    store,
                }),
                TaskCommands::List => task::run_list(task::ListOptions {
                    kind: TaskType::Task,
                    store,
                }),
                TaskCommands::Clear => task::run_clear(task::ListOptions {
                    kind: TaskType::Task,
                    store,
                }),
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::New { name, description } => task::run_new(task::NewOptions {
                    kind: TaskType::Epic,
                    name,
                    description,
                    epic: None,
                    store,
                }),
                EpicCommands::Update {
                    id,
                    name,
                    description,
                } => task::run_update(task::UpdateOptions {
                    kind: TaskType::Epic,
                    id,
                    changes: ItemChanges {
                        name,
                        description,
                        ..ItemChanges::default()
                    },
                    store,
                }),
                EpicCommands::Rm { id } => task::run_rm(task::RmOptions {
                    kind: TaskType::Epic,
                    id,
                    store,
                }),
                EpicCommands::List => task::run_list(task::ListOptions {
                    kind: TaskType::Epic,
                    store,
                }),
                EpicCommands::Clear => task::run_clear(task::ListOptions {
                    kind: TaskType::Epic,
                    store,
                }),
                EpicCommands::Subtasks { id } => {
                    task::run_epic_subtasks(task::ShowOptions { id, store })
                }
            },
            Commands::Subtask(cmd) => match cmd {
                SubtaskCommands::New {
                    name,
                    description,
                    epic,
                } => task::run_new(task::NewOptions {
                    kind: TaskType::Subtask,
                    name,
                    description,
                    epic: Some(epic),
                    store,
                }),
                SubtaskCommands::Update { id, changes } => task::run_update(task::UpdateOptions {
                    kind: TaskType::Subtask,
                    id,
                    changes,
                    store,
                }),
                SubtaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    kind: TaskType::Subtask,
                    id,
                    store,
                }),
                SubtaskCommands::List => task::run_list(task::ListOptions {
                    kind: TaskType::Subtask,
                    store,
                }),
                SubtaskCommands::Clear => task::run_clear(task::ListOptions {
                    kind: TaskType::Subtask,
                    store,
                }),
            },
            Commands::Show { id } => task::run_show(task::ShowOptions { id, store }),
            Commands::History => schedule::run_history(store),
            Commands::Next => schedule::run_next(store),
            Commands::Slot(cmd) => match cmd {
                SlotCommands::Free { duration, after } => {
                    schedule::run_free(schedule::FreeOptions {
                        duration,
                        after,
                        store,
                    })
                }
                SlotCommands::Stats => schedule::run_stats(store),
            },
        }
    }
}
