mod support;

use chrono::Duration;
use kanban::{Error, Task, TaskStatus, TaskType};

use support::{at, manager};

#[test]
fn epic_status_follows_subtasks() {
    let mut store = manager();
    let epic = store.create_epic("Release", "ship 1.0").expect("epic");
    let s1 = store.create_subtask("Build", "", epic).expect("s1");
    let s2 = store.create_subtask("Tag", "", epic).expect("s2");
    assert_eq!(store.get_epic(epic).expect("epic").status(), TaskStatus::New);

    let mut first = store.get_subtask(s1).expect("s1");
    first.set_status(TaskStatus::InProgress);
    store.update_subtask(&first).expect("update");
    assert_eq!(store.get_epic(epic).expect("epic").status(), TaskStatus::InProgress);

    for id in [s1, s2] {
        let mut subtask = store.get_subtask(id).expect("subtask");
        subtask.set_status(TaskStatus::Done);
        store.update_subtask(&subtask).expect("update");
    }
    assert_eq!(store.get_epic(epic).expect("epic").status(), TaskStatus::Done);

    assert!(store.delete_subtask(s1));
    let epic = store.get_epic(epic).expect("epic");
    assert_eq!(epic.subtask_ids(), &[s2]);
    assert_eq!(epic.status(), TaskStatus::Done);
}

#[test]
fn epic_update_ignores_derived_fields() {
    let mut store = manager();
    let epic_id = store.create_epic("Epic", "").expect("epic");
    let sub = store.create_subtask("Sub", "", epic_id).expect("sub");
    let mut subtask = store.get_subtask(sub).expect("sub");
    subtask
        .schedule(at(2, 3, 9, 0), Duration::minutes(45))
        .expect("schedule");
    store.update_subtask(&subtask).expect("update");

    let mut edited = store.get_epic(epic_id).expect("epic");
    edited.set_name("Renamed").expect("rename");
    edited.set_description("new text");
    edited.set_status(TaskStatus::Done);
    edited.set_start_time(None);
    edited.set_duration(Duration::hours(9)).expect("duration");
    assert!(store.update_epic(&edited).expect("update"));

    let stored = store.get_epic(epic_id).expect("epic");
    assert_eq!(stored.name(), "Renamed");
    assert_eq!(stored.description(), "new text");
    assert_eq!(stored.status(), TaskStatus::New);
    assert_eq!(stored.duration(), Duration::minutes(45));
    assert_eq!(stored.start_time(), Some(at(2, 3, 9, 0)));
    assert_eq!(stored.end_time(), Some(at(2, 3, 9, 45)));
}

#[test]
fn overlapping_update_is_rejected_and_touching_is_accepted() {
    let mut store = manager();
    let t1 = store.create_task("T1", "").expect("t1");
    let t2 = store.create_task("T2", "").expect("t2");

    let mut first = store.get_task(t1).expect("t1");
    first
        .schedule(at(3, 10, 10, 0), Duration::hours(2))
        .expect("schedule");
    store.update_task(&first).expect("update t1");

    let mut second = store.get_task(t2).expect("t2");
    second
        .schedule(at(3, 10, 11, 0), Duration::hours(2))
        .expect("schedule");
    assert!(store.has_time_conflict(&second));
    let err = store.update_task(&second).expect_err("overlap");
    assert!(matches!(err, Error::TimeConflict { id } if id == t2));

    second
        .schedule(at(3, 10, 12, 0), Duration::hours(2))
        .expect("schedule");
    assert!(store.update_task(&second).expect("touching"));

    let order: Vec<_> = store.get_prioritized_tasks().iter().map(Task::id).collect();
    assert_eq!(order, vec![t1, t2]);
}

#[test]
fn subtasks_conflict_with_tasks() {
    let mut store = manager();
    let task = store.create_task("Meeting", "").expect("task");
    let epic = store.create_epic("Epic", "").expect("epic");
    let sub = store.create_subtask("Work", "", epic).expect("sub");

    let mut meeting = store.get_task(task).expect("task");
    meeting
        .schedule(at(4, 1, 14, 0), Duration::minutes(30))
        .expect("schedule");
    store.update_task(&meeting).expect("update");

    let mut work = store.get_subtask(sub).expect("sub");
    work.schedule(at(4, 1, 14, 15), Duration::hours(1))
        .expect("schedule");
    assert!(matches!(
        store.update_subtask(&work),
        Err(Error::TimeConflict { .. })
    ));
    let epic = store.get_epic(epic).expect("epic");
    assert_eq!(epic.start_time(), None);
}

#[test]
fn deleted_task_frees_its_slot() {
    let mut store = manager();
    let a = store.create_task("A", "").expect("a");
    let b = store.create_task("B", "").expect("b");
    let mut first = store.get_task(a).expect("a");
    first
        .schedule(at(5, 5, 8, 0), Duration::hours(1))
        .expect("schedule");
    store.update_task(&first).expect("update");

    assert!(store.delete_task(a));
    let mut second = store.get_task(b).expect("b");
    second
        .schedule(at(5, 5, 8, 0), Duration::hours(1))
        .expect("schedule");
    assert!(store.update_task(&second).expect("reuse slot"));
}

#[test]
fn lookups_distinguish_kinds() {
    let mut store = manager();
    let task = store.create_task("Task", "").expect("task");
    let epic = store.create_epic("Epic", "").expect("epic");

    assert!(store.get_epic(task).is_none());
    assert!(store.get_task(epic).is_none());
    assert!(store.get_subtask(epic).is_none());
    assert_eq!(
        store.get_by_id(epic).expect("any").task_type(),
        TaskType::Epic
    );
    assert!(store.get_by_id(99).is_none());
}

#[test]
fn delete_twice_is_a_noop() {
    let mut store = manager();
    let task = store.create_task("Task", "").expect("task");
    assert!(store.delete_task(task));
    let after_first = store.snapshot();
    assert!(!store.delete_task(task));
    assert!(!store.delete_subtask(task));
    assert!(!store.delete_epic(task));
    assert_eq!(store.snapshot(), after_first);
}

#[test]
fn clear_operations_cascade() {
    let mut store = manager();
    store.create_task("Task", "").expect("task");
    let epic = store.create_epic("Epic", "").expect("epic");
    store.create_subtask("Sub", "", epic).expect("sub");
    store.get_by_id(1);
    store.get_by_id(3);

    store.delete_all_tasks();
    assert!(store.get_all_tasks().is_empty());
    assert_eq!(store.get_history().len(), 1);

    store.delete_all_epics();
    assert!(store.get_all_epics().is_empty());
    assert!(store.get_all_subtasks().is_empty());
    assert!(store.get_history().is_empty());
}

#[test]
fn free_slot_search_skips_scheduled_items() {
    let mut store = manager();
    let id = store.create_task("Busy", "").expect("task");
    let mut busy = store.get_task(id).expect("task");
    busy.schedule(at(6, 1, 9, 0), Duration::hours(3))
        .expect("schedule");
    store.update_task(&busy).expect("update");

    let found = store
        .find_next_free_slot(60, at(6, 1, 10, 0))
        .expect("free slot");
    assert_eq!(found, at(6, 1, 12, 0));
    assert_eq!(store.slot_stats().occupied_slots, 12);
}
