//! kanban task, epic and subtask command implementations.

use chrono::Duration;
use serde::Serialize;

use crate::cli::{ItemChanges, StoreOptions};
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::model::{format_date_time, parse_date_time, Task, TaskId, TaskStatus, TaskType};
use crate::output::{emit, Report};

pub struct NewOptions {
    pub kind: TaskType,
    pub name: String,
    pub description: String,
    pub epic: Option<TaskId>,
    pub store: StoreOptions,
}

pub struct UpdateOptions {
    pub kind: TaskType,
    pub id: TaskId,
    pub changes: ItemChanges,
    pub store: StoreOptions,
}

pub struct RmOptions {
    pub kind: TaskType,
    pub id: TaskId,
    pub store: StoreOptions,
}

pub struct ListOptions {
    pub kind: TaskType,
    pub store: StoreOptions,
}

pub struct ShowOptions {
    pub id: TaskId,
    pub store: StoreOptions,
}

#[derive(Serialize)]
struct ItemList {
    #[serde(rename = "type")]
    kind: TaskType,
    count: usize,
    items: Vec<Task>,
}

#[derive(Serialize)]
struct RemovedOutput {
    #[serde(rename = "type")]
    kind: TaskType,
    id: TaskId,
    removed: bool,
}

#[derive(Serialize)]
struct ClearedOutput {
    #[serde(rename = "type")]
    kind: TaskType,
    removed: usize,
}

#[derive(Serialize)]
struct EpicSubtasksOutput {
    epic: Task,
    subtasks: Vec<Task>,
}

fn command_name(kind: TaskType, verb: &str) -> String {
    format!("{} {verb}", kind.label().to_lowercase())
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut store = options.store.open()?;
    let manager = store.manager_mut();
    let id = match (options.kind, options.epic) {
        (TaskType::Task, _) => manager.create_task(&options.name, &options.description)?,
        (TaskType::Epic, _) => manager.create_epic(&options.name, &options.description)?,
        (TaskType::Subtask, Some(epic)) => {
            manager.create_subtask(&options.name, &options.description, epic)?
        }
        (TaskType::Subtask, None) => {
            return Err(Error::InvalidArgument(
                "subtask needs an owning epic (--epic <id>)".to_string(),
            ))
        }
    };
    let created = stored(store.manager(), options.kind, id)?;
    store.save()?;

    let mut report = Report::new(format!("{} created", options.kind.label()));
    summarize_item(&mut report, &created);
    report.hint(format!("kanban show {id}"));
    if options.kind == TaskType::Epic {
        report.hint(format!("kanban subtask new <name> --epic {id}"));
    }

    emit(
        options.store.output(),
        &command_name(options.kind, "new"),
        &created,
        &report,
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let mut store = options.store.open()?;
    let mut item = stored(store.manager(), options.kind, options.id)?;
    apply_changes(&mut item, &options.changes)?;

    let manager = store.manager_mut();
    match options.kind {
        TaskType::Task => manager.update_task(&item)?,
        TaskType::Epic => manager.update_epic(&item)?,
        TaskType::Subtask => manager.update_subtask(&item)?,
    };
    let updated = stored(store.manager(), options.kind, options.id)?;
    store.save()?;

    let mut report = Report::new(format!("{} updated", options.kind.label()));
    summarize_item(&mut report, &updated);
    if options.kind == TaskType::Subtask {
        if let Some(epic_id) = updated.epic_id() {
            if let Some(epic) = store.manager().lookup(epic_id) {
                report.line(format!("epic {epic_id} is now {}", epic.status()));
            }
        }
    }

    emit(
        options.store.output(),
        &command_name(options.kind, "update"),
        &updated,
        &report,
    )
}

fn apply_changes(item: &mut Task, changes: &ItemChanges) -> Result<()> {
    if let Some(name) = &changes.name {
        item.set_name(name.as_str())?;
    }
    if let Some(description) = &changes.description {
        item.set_description(description.as_str());
    }
    if item.task_type() == TaskType::Epic {
        return Ok(());
    }
    if let Some(status) = &changes.status {
        item.set_status(status.parse::<TaskStatus>()?);
    }
    if let Some(minutes) = changes.duration {
        let duration = Duration::try_minutes(minutes).ok_or_else(|| {
            Error::InvalidArgument(format!("duration of {minutes} minutes is out of range"))
        })?;
        item.set_duration(duration)?;
    }
    if let Some(start) = &changes.start {
        item.set_start_time(Some(parse_date_time(start)?));
    }
    if changes.clear_start {
        item.set_start_time(None);
    }
    Ok(())
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut store = options.store.open()?;
    let manager = store.manager_mut();
    let removed = match options.kind {
        TaskType::Task => manager.delete_task(options.id),
        TaskType::Epic => manager.delete_epic(options.id),
        TaskType::Subtask => manager.delete_subtask(options.id),
    };
    store.save()?;

    let label = options.kind.label();
    let mut report = if removed {
        Report::new(format!("{label} {} removed", options.id))
    } else {
        let mut report = Report::new("Nothing removed");
        report.warning(format!("{label} {} does not exist", options.id));
        report
    };
    if removed && options.kind == TaskType::Epic {
        report.line("its subtasks were removed too");
    }

    emit(
        options.store.output(),
        &command_name(options.kind, "rm"),
        &RemovedOutput {
            kind: options.kind,
            id: options.id,
            removed,
        },
        &report,
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let store = options.store.open()?;
    let items = all_of(store.manager(), options.kind);
    store.save()?;

    let mut report = Report::new(format!("{}s: {}", options.kind.label(), items.len()));
    for item in &items {
        report.line(one_line(item));
    }

    emit(
        options.store.output(),
        &command_name(options.kind, "list"),
        &ItemList {
            kind: options.kind,
            count: items.len(),
            items,
        },
        &report,
    )
}

pub fn run_clear(options: ListOptions) -> Result<()> {
    let mut store = options.store.open()?;
    let removed = all_of(store.manager(), options.kind).len();
    let manager = store.manager_mut();
    match options.kind {
        TaskType::Task => manager.delete_all_tasks(),
        TaskType::Epic => manager.delete_all_epics(),
        TaskType::Subtask => manager.delete_all_subtasks(),
    }
    store.save()?;

    let mut report = Report::new(format!("Removed {removed} {}s", options.kind.label().to_lowercase()));
    if options.kind == TaskType::Epic {
        report.line("all subtasks were removed too");
    }

    emit(
        options.store.output(),
        &command_name(options.kind, "clear"),
        &ClearedOutput {
            kind: options.kind,
            removed,
        },
        &report,
    )
}

pub fn run_epic_subtasks(options: ShowOptions) -> Result<()> {
    let store = options.store.open()?;
    let epic = stored(store.manager(), TaskType::Epic, options.id)?;
    let subtasks = store.manager().get_epic_subtasks(options.id);
    store.save()?;

    let mut report = Report::new(format!("Epic {}: {}", epic.id(), epic.name()));
    report.field("Status", epic.status().to_string());
    report.field("Subtasks", subtasks.len().to_string());
    for subtask in &subtasks {
        report.line(one_line(subtask));
    }

    emit(
        options.store.output(),
        "epic subtasks",
        &EpicSubtasksOutput { epic, subtasks },
        &report,
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let mut store = options.store.open()?;
    let item = store
        .manager_mut()
        .get_by_id(options.id)
        .ok_or_else(|| {
            Error::InvalidArgument(format!("no task, epic or subtask with id {}", options.id))
        })?;
    store.save()?;

    let mut report = Report::new(format!("{} {}", item.task_type().label(), item.id()));
    summarize_item(&mut report, &item);

    emit(options.store.output(), "show", &item, &report)
}

/// Stored copy of `id`, which must be of `kind`
fn stored(manager: &TaskManager, kind: TaskType, id: TaskId) -> Result<Task> {
    manager
        .lookup(id)
        .filter(|item| item.task_type() == kind)
        .ok_or(Error::NotFound { kind, id })
}

fn all_of(manager: &TaskManager, kind: TaskType) -> Vec<Task> {
    match kind {
        TaskType::Task => manager.get_all_tasks(),
        TaskType::Epic => manager.get_all_epics(),
        TaskType::Subtask => manager.get_all_subtasks(),
    }
}

pub(crate) fn one_line(item: &Task) -> String {
    let mut line = format!("{} [{}] {}", item.id(), item.status(), item.name());
    if let Some(start) = item.start_time() {
        line.push_str(&format!(
            " @ {} ({}m)",
            format_date_time(&start),
            item.duration().num_minutes()
        ));
    }
    line
}

fn summarize_item(report: &mut Report, item: &Task) {
    report.field("ID", item.id().to_string());
    report.field("Type", item.task_type().to_string());
    report.field("Name", item.name());
    report.field("Status", item.status().to_string());
    if !item.description().is_empty() {
        report.field("Description", item.description());
    }
    if let Some(epic_id) = item.epic_id() {
        report.field("Epic", epic_id.to_string());
    }
    if item.task_type() == TaskType::Epic {
        let ids: Vec<String> = item.subtask_ids().iter().map(TaskId::to_string).collect();
        report.field("Subtasks", ids.join(", "));
    }
    report.field("Duration", format!("{}m", item.duration().num_minutes()));
    if let Some(start) = item.start_time() {
        report.field("Start", format_date_time(&start));
    }
    if let Some(end) = item.end_time() {
        report.field("End", format_date_time(&end));
    }
}
