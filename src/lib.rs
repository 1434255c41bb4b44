//! kanban - in-memory work item store
//!
//! Tasks, epics and subtasks share one id space. Epics derive their status
//! and time span from their subtasks, every read is recorded in a
//! duplicate-free view history, and scheduled items are checked against a
//! bitset time grid so no two of them overlap.
//!
//! # Module Organization
//!
//! - `model`: work item types, statuses and timestamps
//! - `id`: id generator shared by all kinds
//! - `epic`: epic status and time aggregation
//! - `history`: O(1) move-to-tail view history
//! - `timeslot`: slot grid used for conflict checks and free-slot search
//! - `priority`: start-time ordering of scheduled items
//! - `manager`: the store tying everything together
//! - `shared`: mutex-guarded handle for multi-threaded use
//! - `storage`: CSV encoding and the file-backed store
//! - `lock`: file locking and atomic writes
//! - `config`: configuration loading from `kanban.toml`
//! - `error`: error types and result aliases
//! - `output`: JSON and human output for the CLI
//! - `cli`: command-line interface using clap

pub mod cli;
pub mod config;
pub mod epic;
pub mod error;
pub mod history;
pub mod id;
pub mod lock;
pub mod manager;
pub mod model;
pub mod output;
pub mod priority;
pub mod shared;
pub mod storage;
pub mod timeslot;

pub use error::{Error, Result};
pub use manager::{Snapshot, TaskManager};
pub use model::{Task, TaskId, TaskKind, TaskStatus, TaskType};
pub use shared::SharedTaskManager;
