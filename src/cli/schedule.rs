//! kanban history, next and slot commands.

use chrono::{Duration, Local};
use serde::Serialize;

use crate::cli::task::one_line;
use crate::cli::StoreOptions;
use crate::error::Result;
use crate::model::{format_date_time, parse_date_time, Task};
use crate::output::{emit, Report};

pub struct FreeOptions {
    pub duration: u32,
    pub after: Option<String>,
    pub store: StoreOptions,
}

#[derive(Serialize)]
struct ItemsOutput {
    count: usize,
    items: Vec<Task>,
}

#[derive(Serialize)]
struct FreeSlotOutput {
    duration_minutes: u32,
    after: String,
    start: Option<String>,
    end: Option<String>,
}

pub fn run_history(store: StoreOptions) -> Result<()> {
    let file = store.open()?;
    let items = file.manager().get_history();
    file.save()?;

    let mut report = Report::new(format!("History: {} items", items.len()));
    for item in &items {
        report.line(format!("{} {}", item.task_type(), one_line(item)));
    }

    emit(
        store.output(),
        "history",
        &ItemsOutput {
            count: items.len(),
            items,
        },
        &report,
    )
}

pub fn run_next(store: StoreOptions) -> Result<()> {
    let file = store.open()?;
    let items = file.manager().get_prioritized_tasks();
    file.save()?;

    let mut report = Report::new(format!("Scheduled: {} items", items.len()));
    for item in &items {
        report.line(one_line(item));
    }
    if items.is_empty() {
        report.hint("kanban task update <id> --start \"<yyyy-MM-dd HH:mm:ss>\" --duration <minutes>");
    }

    emit(
        store.output(),
        "next",
        &ItemsOutput {
            count: items.len(),
            items,
        },
        &report,
    )
}

pub fn run_free(options: FreeOptions) -> Result<()> {
    let after = match options.after.as_deref() {
        Some(raw) => parse_date_time(raw)?,
        None => Local::now().naive_local(),
    };
    let file = options.store.open()?;
    let found = file.manager().find_next_free_slot(options.duration, after);
    file.save()?;

    let end = found.map(|start| start + Duration::minutes(i64::from(options.duration)));
    let output = FreeSlotOutput {
        duration_minutes: options.duration,
        after: format_date_time(&after),
        start: found.as_ref().map(format_date_time),
        end: end.as_ref().map(format_date_time),
    };

    let mut report = match (&output.start, &output.end) {
        (Some(start), Some(end)) => {
            let mut report = Report::new(format!("Free from {start}"));
            report.field("Until", end.as_str());
            report
        }
        _ => {
            let mut report = Report::new("No free slot");
            report.warning(format!(
                "no {} minute stretch left before the end of the horizon",
                options.duration
            ));
            report
        }
    };
    report.field("Searched from", output.after.as_str());

    emit(options.store.output(), "slot free", &output, &report)
}

pub fn run_stats(store: StoreOptions) -> Result<()> {
    let file = store.open()?;
    let stats = file.manager().slot_stats();
    let base = file.manager().schedule_base();
    file.save()?;

    let mut report = Report::new("Time grid");
    report.field("Starts", format_date_time(&base));
    report.field("Slots", stats.total_slots.to_string());
    report.field("Slot width", format!("{}m", stats.slot_minutes));
    report.field("Occupied", stats.occupied_slots.to_string());
    report.line(stats.to_string());

    emit(store.output(), "slot stats", &stats, &report)
}
