//! Epic status aggregation
//!
//! An epic's status, duration, start and end are derived from its subtasks
//! every time they change. Nothing here is cached between calls.

use chrono::{Duration, NaiveDateTime};

use crate::model::{Task, TaskStatus};

/// Derived fields of an epic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpicSummary {
    pub status: TaskStatus,
    pub duration: Duration,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl Default for EpicSummary {
    fn default() -> Self {
        Self {
            status: TaskStatus::New,
            duration: Duration::zero(),
            start_time: None,
            end_time: None,
        }
    }
}

/// Compute an epic's derived fields from its subtasks
///
/// - no subtasks: NEW, zero duration, no start or end
/// - every subtask DONE: DONE
/// - every subtask NEW: NEW
/// - anything else: IN_PROGRESS
pub fn summarize<'a, I>(subtasks: I) -> EpicSummary
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut summary = EpicSummary::default();
    let mut seen = 0usize;
    let mut all_new = true;
    let mut all_done = true;

    for subtask in subtasks {
        seen += 1;
        all_new &= subtask.status() == TaskStatus::New;
        all_done &= subtask.status() == TaskStatus::Done;

        summary.duration = summary
            .duration
            .checked_add(&subtask.duration())
            .unwrap_or(summary.duration);

        if let Some(start) = subtask.start_time() {
            summary.start_time = Some(match summary.start_time {
                Some(current) => current.min(start),
                None => start,
            });
        }
        if let Some(end) = subtask.end_time() {
            summary.end_time = Some(match summary.end_time {
                Some(current) => current.max(end),
                None => end,
            });
        }
    }

    summary.status = if seen == 0 || all_new {
        TaskStatus::New
    } else if all_done {
        TaskStatus::Done
    } else {
        TaskStatus::InProgress
    };
    summary
}

/// Overwrite an epic's derived fields from its subtasks
pub fn recompute<'a, I>(epic: &mut Task, subtasks: I) -> EpicSummary
where
    I: IntoIterator<Item = &'a Task>,
{
    let summary = summarize(subtasks);
    epic.set_status(summary.status);
    epic.set_derived_duration(summary.duration);
    epic.set_start_time(summary.start_time);
    epic.set_end_time(summary.end_time);
    tracing::debug!(epic = epic.id(), status = %summary.status, "recomputed epic");
    summary
}
