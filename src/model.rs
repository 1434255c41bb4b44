//! Work item model
//!
//! Every work item is a [`Task`]: a common record (id, name, description,
//! status, duration, start time) plus a [`TaskKind`] payload that says
//! whether it is a plain task, an epic that owns subtasks, or a subtask that
//! belongs to exactly one epic. Epics and subtasks refer to each other by id
//! only; the store resolves those ids.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Identifier shared by tasks, epics and subtasks
pub type TaskId = u32;

/// Timestamp format used for start times in files and on the command line
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `yyyy-MM-dd HH:mm:ss` timestamp
pub fn parse_date_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT).map_err(|err| {
        Error::InvalidArgument(format!(
            "invalid timestamp '{}' (expected yyyy-MM-dd HH:mm:ss): {err}",
            value.trim()
        ))
    })
}

/// Format a timestamp as `yyyy-MM-dd HH:mm:ss`
pub fn format_date_time(value: &NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

// =============================================================================
// Status
// =============================================================================

/// Progress state of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    New,
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::New => write!(f, "NEW"),
            TaskStatus::InProgress => write!(f, "IN_PROGRESS"),
            TaskStatus::Done => write!(f, "DONE"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NEW" => Ok(TaskStatus::New),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid status '{}'. Expected: NEW, IN_PROGRESS, DONE",
                s
            ))),
        }
    }
}

// =============================================================================
// Kind
// =============================================================================

/// Discriminator of a work item, as written to files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Task,
    Epic,
    Subtask,
}

impl TaskType {
    /// Human label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Task => "Task",
            TaskType::Epic => "Epic",
            TaskType::Subtask => "Subtask",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Task => write!(f, "TASK"),
            TaskType::Epic => write!(f, "EPIC"),
            TaskType::Subtask => write!(f, "SUBTASK"),
        }
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "TASK" => Ok(TaskType::Task),
            "EPIC" => Ok(TaskType::Epic),
            "SUBTASK" => Ok(TaskType::Subtask),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid task type '{}'. Expected: TASK, EPIC, SUBTASK",
                s
            ))),
        }
    }
}

/// Kind-specific payload of a work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Task,
    Epic {
        /// Owned subtasks in insertion order
        subtask_ids: Vec<TaskId>,
        /// Latest end among the subtasks
        #[serde(skip_serializing_if = "Option::is_none")]
        end_time: Option<NaiveDateTime>,
    },
    Subtask {
        epic_id: TaskId,
    },
}

impl TaskKind {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskKind::Task => TaskType::Task,
            TaskKind::Epic { .. } => TaskType::Epic,
            TaskKind::Subtask { .. } => TaskType::Subtask,
        }
    }
}

// =============================================================================
// Task
// =============================================================================

/// A task, epic or subtask
///
/// Equality and hashing use the kind and the id only.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    id: TaskId,
    name: String,
    description: String,
    status: TaskStatus,
    #[serde(rename = "duration_minutes", serialize_with = "serialize_minutes")]
    duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<NaiveDateTime>,
    #[serde(flatten)]
    kind: TaskKind,
}

impl Task {
    fn with_kind(
        id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: TaskKind,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            id,
            name,
            description: description.into(),
            status: TaskStatus::New,
            duration: Duration::zero(),
            start_time: None,
            kind,
        })
    }

    /// Rebuild a plain task with a known id
    pub fn task(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        Self::with_kind(id, name, description, TaskKind::Task)
    }

    /// Rebuild an epic with a known id and no subtasks
    pub fn epic(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        Self::with_kind(
            id,
            name,
            description,
            TaskKind::Epic {
                subtask_ids: Vec::new(),
                end_time: None,
            },
        )
    }

    /// Rebuild a subtask with a known id, owned by `epic_id`
    pub fn subtask(
        id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
        epic_id: TaskId,
    ) -> Result<Self> {
        if id == epic_id {
            return Err(Error::Validation(format!(
                "subtask id {id} cannot equal its epic id"
            )));
        }
        Self::with_kind(id, name, description, TaskKind::Subtask { epic_id })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn task_type(&self) -> TaskType {
        self.kind.task_type()
    }

    /// Owning epic for subtasks
    pub fn epic_id(&self) -> Option<TaskId> {
        match self.kind {
            TaskKind::Subtask { epic_id } => Some(epic_id),
            _ => None,
        }
    }

    /// Subtask ids for epics, empty otherwise
    pub fn subtask_ids(&self) -> &[TaskId] {
        match &self.kind {
            TaskKind::Epic { subtask_ids, .. } => subtask_ids,
            _ => &[],
        }
    }

    /// End of the scheduled interval
    ///
    /// For epics this is the latest end among their subtasks.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        match &self.kind {
            TaskKind::Epic { end_time, .. } => *end_time,
            _ => self
                .start_time
                .and_then(|start| start.checked_add_signed(self.duration)),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<()> {
        if duration < Duration::zero() {
            return Err(Error::Validation(format!(
                "duration cannot be negative ({} minutes)",
                duration.num_minutes()
            )));
        }
        self.duration = duration;
        Ok(())
    }

    pub fn set_start_time(&mut self, start_time: Option<NaiveDateTime>) {
        self.start_time = start_time;
    }

    /// Set start time and duration together
    pub fn schedule(&mut self, start_time: NaiveDateTime, duration: Duration) -> Result<()> {
        self.set_duration(duration)?;
        self.start_time = Some(start_time);
        Ok(())
    }

    /// Whether both items occupy a common, non-empty stretch of time
    ///
    /// Intervals are half-open: touching at a boundary is not an overlap.
    pub fn overlaps(&self, other: &Task) -> bool {
        if self.id == other.id {
            return false;
        }
        let (Some(start), Some(end)) = (self.start_time, self.end_time()) else {
            return false;
        };
        let (Some(other_start), Some(other_end)) = (other.start_time, other.end_time()) else {
            return false;
        };
        if start == end || other_start == other_end {
            return false;
        }
        start < other_end && other_start < end
    }

    pub(crate) fn subtask_ids_mut(&mut self) -> Option<&mut Vec<TaskId>> {
        match &mut self.kind {
            TaskKind::Epic { subtask_ids, .. } => Some(subtask_ids),
            _ => None,
        }
    }

    pub(crate) fn set_derived_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub(crate) fn set_end_time(&mut self, value: Option<NaiveDateTime>) {
        if let TaskKind::Epic { end_time, .. } = &mut self.kind {
            *end_time = value;
        }
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.task_type() == other.task_type()
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.task_type().hash(state);
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name cannot be empty".to_string()));
    }
    Ok(())
}

fn serialize_minutes<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_minutes())
}
