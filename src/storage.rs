//! CSV persistence
//!
//! File layout:
//!
//! ```text
//! id,type,name,status,description,epic,duration,startTime
//! 1,TASK,Write report,NEW,"Numbers, charts",,90,2026-04-01 09:00:00
//! 2,EPIC,Release,IN_PROGRESS,,,0,
//! 3,SUBTASK,Tag build,DONE,,2,30,2026-04-02 10:00:00
//!
//! 3,1
//! ```
//!
//! One row per item (tasks, then epics, then subtasks), a blank line, then
//! the history ids oldest first. Fields containing a comma, quote or line
//! break are quoted with embedded quotes doubled. Duration is whole minutes,
//! rounded up.
//!
//! Loading is lenient: malformed rows and history ids are skipped and
//! malformed optional fields fall back to their defaults, each with a
//! warning. Epic status and time fields are recomputed after loading.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use tracing::{debug, warn};

use crate::config::ScheduleConfig;
use crate::error::Result;
use crate::lock::{lock_path_for, write_atomic, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::manager::{Snapshot, TaskManager};
use crate::model::{format_date_time, parse_date_time, Task, TaskId, TaskStatus, TaskType};

/// Header row
pub const CSV_HEADER: &str = "id,type,name,status,description,epic,duration,startTime";

/// Render a snapshot in the file format
pub fn encode(snapshot: &Snapshot) -> String {
    let mut out = String::with_capacity(64 * (snapshot.records.len() + 2));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in &snapshot.records {
        out.push_str(&encode_record(record));
        out.push('\n');
    }
    out.push('\n');
    let history: Vec<String> = snapshot.history.iter().map(TaskId::to_string).collect();
    out.push_str(&history.join(","));
    out
}

fn encode_record(task: &Task) -> String {
    let epic = task.epic_id().map(|id| id.to_string()).unwrap_or_default();
    let start = task
        .start_time()
        .map(|start| format_date_time(&start))
        .unwrap_or_default();
    [
        task.id().to_string(),
        task.task_type().to_string(),
        escape_field(task.name()),
        task.status().to_string(),
        escape_field(task.description()),
        epic,
        whole_minutes(task.duration()).to_string(),
        start,
    ]
    .join(",")
}

/// Minutes covering `duration`; a partial minute counts as a whole one
fn whole_minutes(duration: Duration) -> i64 {
    let minutes = duration.num_minutes();
    if duration > Duration::minutes(minutes) {
        minutes + 1
    } else {
        minutes
    }
}

/// Quote `value` if it contains a separator, quote or line break
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Parse the file format; never fails
pub fn decode(content: &str) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut records = split_records(content).into_iter();

    match records.next() {
        Some(header) if header.trim() == CSV_HEADER => {}
        Some(header) => warn!(header = %header.trim(), "unexpected header row"),
        None => return snapshot,
    }

    let mut in_history = false;
    for (offset, line) in records.enumerate() {
        let row = offset + 2;
        if line.trim().is_empty() {
            in_history = true;
            continue;
        }
        if in_history {
            snapshot.history = decode_history(&line);
            break;
        }
        if let Some(task) = decode_record(&line, row) {
            snapshot.records.push(task);
        }
    }
    snapshot
}

fn decode_history(line: &str) -> Vec<TaskId> {
    line.split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| match raw.parse::<TaskId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(value = raw, "skipping malformed history id");
                None
            }
        })
        .collect()
}

fn decode_record(line: &str, row: usize) -> Option<Task> {
    let fields = split_fields(line);
    if fields.len() < 5 {
        warn!(row, fields = fields.len(), "skipping short row");
        return None;
    }
    let field = |idx: usize| fields.get(idx).map(|value| value.trim()).unwrap_or("");

    let id = match field(0).parse::<TaskId>() {
        Ok(id) => id,
        Err(_) => {
            warn!(row, value = field(0), "skipping row with malformed id");
            return None;
        }
    };
    let kind = match field(1).parse::<TaskType>() {
        Ok(kind) => kind,
        Err(err) => {
            warn!(row, id, error = %err, "skipping row with unknown type");
            return None;
        }
    };
    let status = match field(3).parse::<TaskStatus>() {
        Ok(status) => status,
        Err(err) => {
            warn!(row, id, error = %err, "skipping row with unknown status");
            return None;
        }
    };
    let name = fields[2].as_str();
    let description = fields[4].as_str();

    let built = match kind {
        TaskType::Task => Task::task(id, name, description),
        TaskType::Epic => Task::epic(id, name, description),
        TaskType::Subtask => match field(5).parse::<TaskId>() {
            Ok(epic_id) => Task::subtask(id, name, description, epic_id),
            Err(_) => {
                warn!(row, id, value = field(5), "skipping subtask without a valid epic id");
                return None;
            }
        },
    };
    let mut task = match built {
        Ok(task) => task,
        Err(err) => {
            warn!(row, id, error = %err, "skipping invalid row");
            return None;
        }
    };
    task.set_status(status);

    if !field(6).is_empty() {
        let duration = field(6).parse::<i64>().ok().and_then(Duration::try_minutes);
        match duration.map(|duration| task.set_duration(duration)) {
            Some(Ok(())) => {}
            _ => warn!(row, id, value = field(6), "ignoring malformed duration"),
        }
    }
    if !field(7).is_empty() {
        match parse_date_time(field(7)) {
            Ok(start) => task.set_start_time(Some(start)),
            Err(_) => warn!(row, id, value = field(7), "ignoring malformed start time"),
        }
    }
    Some(task)
}

/// Split into records at line breaks outside quotes
///
/// A trailing `\r` is dropped from each record.
pub fn split_records(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in content.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '\n' if !in_quotes => {
                if current.ends_with('\r') {
                    current.pop();
                }
                records.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        if current.ends_with('\r') {
            current.pop();
        }
        records.push(current);
    }
    records
}

/// Split one record into unescaped fields
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// A store backed by a CSV file
///
/// Holds an exclusive lock on `<file>.lock` while open.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    manager: TaskManager,
    _lock: FileLock,
}

impl FileStore {
    /// Lock `path` and load it, or start empty when it does not exist
    pub fn open(path: impl AsRef<Path>, schedule: &ScheduleConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let manager = if path.exists() {
            let content = fs::read_to_string(&path)?;
            TaskManager::from_snapshot(schedule, decode(&content))?
        } else {
            debug!(path = %path.display(), "no data file yet, starting empty");
            TaskManager::with_schedule(schedule)?
        };

        Ok(Self {
            path,
            manager,
            _lock: lock,
        })
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut TaskManager {
        &mut self.manager
    }

    /// Write the current state back to the file
    pub fn save(&self) -> Result<()> {
        let snapshot = self.manager.snapshot();
        write_atomic(&self.path, encode(&snapshot).as_bytes())?;
        debug!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            "saved store"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
