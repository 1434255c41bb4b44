//! Entity store
//!
//! [`TaskManager`] owns every task, epic and subtask together with the
//! indices derived from them:
//!
//! - an id generator shared by all three kinds
//! - the view history
//! - the time slot conflict index
//! - the start-time priority ordering
//!
//! Items are created only through the `create_*` methods. Reads hand out
//! copies, so callers can never alias stored state. Every mutation keeps the
//! epic/subtask links, epic aggregates and all indices consistent before it
//! returns.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::config::ScheduleConfig;
use crate::epic;
use crate::error::{Error, Result};
use crate::history::HistoryTracker;
use crate::id::IdGenerator;
use crate::model::{Task, TaskId, TaskType};
use crate::priority::PriorityIndex;
use crate::timeslot::{SlotStats, TimeSlotIndex};

/// Flat view of a store, as exchanged with persistence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Tasks, then epics, then subtasks, each in id order
    pub records: Vec<Task>,
    /// Viewed ids, oldest first
    pub history: Vec<TaskId>,
}

#[derive(Debug, Clone)]
pub struct TaskManager {
    ids: IdGenerator,
    tasks: BTreeMap<TaskId, Task>,
    epics: BTreeMap<TaskId, Task>,
    subtasks: BTreeMap<TaskId, Task>,
    history: HistoryTracker,
    slots: TimeSlotIndex,
    priority: PriorityIndex,
}

impl TaskManager {
    /// Empty store whose conflict horizon starts at `base`
    pub fn new(base: NaiveDateTime) -> Self {
        Self::with_index(TimeSlotIndex::new(base))
    }

    /// Empty store laid out by `schedule`
    pub fn with_schedule(schedule: &ScheduleConfig) -> Result<Self> {
        let base = schedule.base_time()?;
        Ok(Self::with_index(TimeSlotIndex::with_layout(
            base,
            schedule.slot_minutes,
            schedule.horizon_days,
        )))
    }

    fn with_index(slots: TimeSlotIndex) -> Self {
        Self {
            ids: IdGenerator::new(),
            tasks: BTreeMap::new(),
            epics: BTreeMap::new(),
            subtasks: BTreeMap::new(),
            history: HistoryTracker::new(),
            slots,
            priority: PriorityIndex::new(),
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    pub fn create_task(&mut self, name: &str, description: &str) -> Result<TaskId> {
        let id = self.peek_id()?;
        let task = Task::task(id, name, description)?;
        self.ids.next_id()?;
        self.tasks.insert(id, task);
        debug!(id, "created task");
        Ok(id)
    }

    pub fn create_epic(&mut self, name: &str, description: &str) -> Result<TaskId> {
        let id = self.peek_id()?;
        let epic = Task::epic(id, name, description)?;
        self.ids.next_id()?;
        self.epics.insert(id, epic);
        debug!(id, "created epic");
        Ok(id)
    }

    /// Create a subtask and append it to `epic_id`'s subtask list
    pub fn create_subtask(&mut self, name: &str, description: &str, epic_id: TaskId) -> Result<TaskId> {
        if !self.epics.contains_key(&epic_id) {
            return Err(Error::NotFound {
                kind: TaskType::Epic,
                id: epic_id,
            });
        }
        let id = self.peek_id()?;
        let subtask = Task::subtask(id, name, description, epic_id)?;
        self.ids.next_id()?;
        self.subtasks.insert(id, subtask);
        if let Some(list) = self.epics.get_mut(&epic_id).and_then(Task::subtask_ids_mut) {
            list.push(id);
        }
        self.refresh_epic(epic_id);
        debug!(id, epic_id, "created subtask");
        Ok(id)
    }

    fn peek_id(&self) -> Result<TaskId> {
        self.ids.peek().ok_or(Error::IdSpaceExhausted)
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Copy of task `id`; a hit is recorded in the history
    pub fn get_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.get(&id)?.clone();
        self.history.record(&task);
        Some(task)
    }

    /// Copy of epic `id`; a hit is recorded in the history
    pub fn get_epic(&mut self, id: TaskId) -> Option<Task> {
        let epic = self.epics.get(&id)?.clone();
        self.history.record(&epic);
        Some(epic)
    }

    /// Copy of subtask `id`; a hit is recorded in the history
    pub fn get_subtask(&mut self, id: TaskId) -> Option<Task> {
        let subtask = self.subtasks.get(&id)?.clone();
        self.history.record(&subtask);
        Some(subtask)
    }

    /// Copy of the item with `id`, whatever its kind; a hit is recorded in the history
    pub fn get_by_id(&mut self, id: TaskId) -> Option<Task> {
        let item = self.find(id)?.clone();
        self.history.record(&item);
        Some(item)
    }

    /// Copy of the item with `id` without recording a view
    pub fn lookup(&self, id: TaskId) -> Option<Task> {
        self.find(id).cloned()
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    pub fn get_all_epics(&self) -> Vec<Task> {
        self.epics.values().cloned().collect()
    }

    pub fn get_all_subtasks(&self) -> Vec<Task> {
        self.subtasks.values().cloned().collect()
    }

    /// Subtasks of `epic_id` in insertion order; empty for unknown epics
    pub fn get_epic_subtasks(&self, epic_id: TaskId) -> Vec<Task> {
        let Some(epic) = self.epics.get(&epic_id) else {
            return Vec::new();
        };
        epic.subtask_ids()
            .iter()
            .filter_map(|id| self.subtasks.get(id))
            .cloned()
            .collect()
    }

    /// Viewed items, oldest first
    pub fn get_history(&self) -> Vec<Task> {
        self.history.list()
    }

    /// Scheduled tasks and subtasks by start time, then id
    pub fn get_prioritized_tasks(&self) -> Vec<Task> {
        self.priority
            .iter()
            .filter_map(|id| self.tasks.get(&id).or_else(|| self.subtasks.get(&id)))
            .cloned()
            .collect()
    }

    fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks
            .get(&id)
            .or_else(|| self.epics.get(&id))
            .or_else(|| self.subtasks.get(&id))
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replace a stored task
    ///
    /// Returns `Ok(false)` when no task has this id. Fails with
    /// `TimeConflict` before anything changes if the new schedule overlaps
    /// another scheduled item.
    pub fn update_task(&mut self, task: &Task) -> Result<bool> {
        expect_kind(task, TaskType::Task)?;
        if !self.tasks.contains_key(&task.id()) {
            return Ok(false);
        }
        self.ensure_no_conflict(task)?;
        self.index_schedule(task);
        self.tasks.insert(task.id(), task.clone());
        debug!(id = task.id(), "updated task");
        Ok(true)
    }

    /// Replace a stored subtask and refresh its epic
    ///
    /// The owning epic cannot change.
    pub fn update_subtask(&mut self, subtask: &Task) -> Result<bool> {
        expect_kind(subtask, TaskType::Subtask)?;
        let Some(stored_epic) = self.subtasks.get(&subtask.id()).and_then(Task::epic_id) else {
            return Ok(false);
        };
        if subtask.epic_id() != Some(stored_epic) {
            return Err(Error::Validation(format!(
                "subtask {} belongs to epic {stored_epic}",
                subtask.id()
            )));
        }
        self.ensure_no_conflict(subtask)?;
        self.index_schedule(subtask);
        self.subtasks.insert(subtask.id(), subtask.clone());
        self.refresh_epic(stored_epic);
        debug!(id = subtask.id(), epic_id = stored_epic, "updated subtask");
        Ok(true)
    }

    /// Take name and description from `epic`
    ///
    /// Status and time fields always come from the subtasks.
    pub fn update_epic(&mut self, epic: &Task) -> Result<bool> {
        expect_kind(epic, TaskType::Epic)?;
        let Some(stored) = self.epics.get_mut(&epic.id()) else {
            return Ok(false);
        };
        stored.set_name(epic.name())?;
        stored.set_description(epic.description());
        self.refresh_epic(epic.id());
        debug!(id = epic.id(), "updated epic");
        Ok(true)
    }

    fn ensure_no_conflict(&self, task: &Task) -> Result<()> {
        if self.slots.has_conflict(task) {
            return Err(Error::TimeConflict { id: task.id() });
        }
        Ok(())
    }

    fn index_schedule(&mut self, task: &Task) {
        self.slots.add(task);
        self.priority.upsert(task);
    }

    fn unindex(&mut self, id: TaskId) {
        self.history.remove(id);
        self.slots.remove(id);
        self.priority.remove(id);
    }

    fn refresh_epic(&mut self, epic_id: TaskId) {
        let Some(epic) = self.epics.get_mut(&epic_id) else {
            return;
        };
        let members: Vec<&Task> = epic
            .subtask_ids()
            .iter()
            .filter_map(|id| self.subtasks.get(id))
            .collect();
        epic::recompute(epic, members);
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove a task; returns whether it existed
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        if self.tasks.remove(&id).is_none() {
            return false;
        }
        self.unindex(id);
        debug!(id, "deleted task");
        true
    }

    /// Remove a subtask and unlink it from its epic
    pub fn delete_subtask(&mut self, id: TaskId) -> bool {
        let Some(subtask) = self.subtasks.remove(&id) else {
            return false;
        };
        self.unindex(id);
        if let Some(epic_id) = subtask.epic_id() {
            if let Some(list) = self.epics.get_mut(&epic_id).and_then(Task::subtask_ids_mut) {
                list.retain(|member| *member != id);
            }
            self.refresh_epic(epic_id);
        }
        debug!(id, "deleted subtask");
        true
    }

    /// Remove an epic together with all of its subtasks
    pub fn delete_epic(&mut self, id: TaskId) -> bool {
        let Some(epic) = self.epics.remove(&id) else {
            return false;
        };
        for subtask_id in epic.subtask_ids() {
            self.subtasks.remove(subtask_id);
            self.unindex(*subtask_id);
        }
        self.unindex(id);
        debug!(id, subtasks = epic.subtask_ids().len(), "deleted epic");
        true
    }

    pub fn delete_all_tasks(&mut self) {
        let ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        for id in ids {
            self.unindex(id);
        }
        self.tasks.clear();
        debug!("deleted all tasks");
    }

    /// Remove every subtask and reset every epic to its empty state
    pub fn delete_all_subtasks(&mut self) {
        let ids: Vec<TaskId> = self.subtasks.keys().copied().collect();
        for id in ids {
            self.unindex(id);
        }
        self.subtasks.clear();
        let epic_ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for epic_id in epic_ids {
            if let Some(list) = self.epics.get_mut(&epic_id).and_then(Task::subtask_ids_mut) {
                list.clear();
            }
            self.refresh_epic(epic_id);
        }
        debug!("deleted all subtasks");
    }

    /// Remove every epic and, with them, every subtask
    pub fn delete_all_epics(&mut self) {
        self.delete_all_subtasks();
        let ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for id in ids {
            self.unindex(id);
        }
        self.epics.clear();
        debug!("deleted all epics");
    }

    // =========================================================================
    // Schedule
    // =========================================================================

    /// Whether `task` would overlap another scheduled item
    pub fn has_time_conflict(&self, task: &Task) -> bool {
        self.slots.has_conflict(task)
    }

    /// Earliest free start of `duration_minutes` at or after `after`
    pub fn find_next_free_slot(&self, duration_minutes: u32, after: NaiveDateTime) -> Option<NaiveDateTime> {
        self.slots.find_next_free_slot(duration_minutes, after)
    }

    pub fn slot_stats(&self) -> SlotStats {
        self.slots.stats()
    }

    /// Start of the conflict horizon
    pub fn schedule_base(&self) -> NaiveDateTime {
        self.slots.base()
    }

    // =========================================================================
    // Persistence boundary
    // =========================================================================

    /// Every record plus the history ids
    pub fn snapshot(&self) -> Snapshot {
        let records = self
            .tasks
            .values()
            .chain(self.epics.values())
            .chain(self.subtasks.values())
            .cloned()
            .collect();
        Snapshot {
            records,
            history: self.history.ids(),
        }
    }

    /// Rebuild a store from persisted records
    ///
    /// Ids are kept and the id generator continues after the largest one.
    /// Epic subtask lists are rebuilt from the subtasks' epic ids and every
    /// epic is recomputed. Duplicate ids and subtasks of unknown epics are
    /// skipped. A record whose schedule collides with an earlier one is kept
    /// but stays out of the conflict index.
    pub fn from_snapshot(schedule: &ScheduleConfig, snapshot: Snapshot) -> Result<Self> {
        let mut manager = Self::with_schedule(schedule)?;
        let mut seen = HashSet::new();
        let mut pending_subtasks = Vec::new();

        for mut record in snapshot.records {
            if !seen.insert(record.id()) {
                warn!(id = record.id(), kind = %record.task_type(), "skipping duplicate id");
                continue;
            }
            manager.ids.observe(record.id());
            match record.task_type() {
                TaskType::Task => {
                    manager.restore_schedule(&record);
                    manager.tasks.insert(record.id(), record);
                }
                TaskType::Epic => {
                    if let Some(list) = record.subtask_ids_mut() {
                        list.clear();
                    }
                    manager.epics.insert(record.id(), record);
                }
                TaskType::Subtask => pending_subtasks.push(record),
            }
        }

        for record in pending_subtasks {
            let Some(epic_id) = record.epic_id() else {
                continue;
            };
            let Some(list) = manager.epics.get_mut(&epic_id).and_then(Task::subtask_ids_mut) else {
                warn!(id = record.id(), epic_id, "skipping subtask of unknown epic");
                continue;
            };
            list.push(record.id());
            manager.restore_schedule(&record);
            manager.subtasks.insert(record.id(), record);
        }

        let epic_ids: Vec<TaskId> = manager.epics.keys().copied().collect();
        for epic_id in epic_ids {
            manager.refresh_epic(epic_id);
        }

        for id in snapshot.history {
            match manager.find(id).cloned() {
                Some(item) => manager.history.record(&item),
                None => warn!(id, "skipping history entry for unknown id"),
            }
        }

        debug!(
            tasks = manager.tasks.len(),
            epics = manager.epics.len(),
            subtasks = manager.subtasks.len(),
            "restored store"
        );
        Ok(manager)
    }

    fn restore_schedule(&mut self, record: &Task) {
        self.priority.upsert(record);
        if record.start_time().is_none() || record.duration() == Duration::zero() {
            return;
        }
        if self.slots.has_conflict(record) {
            warn!(id = record.id(), "schedule overlaps an earlier record; not indexed");
            return;
        }
        self.slots.add(record);
    }
}

fn expect_kind(task: &Task, expected: TaskType) -> Result<()> {
    if task.task_type() != expected {
        return Err(Error::Validation(format!(
            "expected {}, got {} {}",
            expected.label().to_lowercase(),
            task.task_type().label().to_lowercase(),
            task.id()
        )));
    }
    Ok(())
}
