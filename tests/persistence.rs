mod support;

use std::fs;

use chrono::Duration;
use kanban::error::Error;
use kanban::storage::{decode, encode, FileStore, CSV_HEADER};
use kanban::{Task, TaskManager, TaskStatus};

use support::{at, manager, schedule};

#[test]
fn save_and_reload_preserves_everything() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tasks.csv");

    {
        let mut store = FileStore::open(&path, &schedule())?;
        let manager = store.manager_mut();
        let task = manager.create_task("Report, final", "with \"quotes\"\nand a newline")?;
        let epic = manager.create_epic("Release", "")?;
        let sub = manager.create_subtask("Tag", "", epic)?;

        let mut scheduled = manager.lookup(task).expect("task");
        scheduled.schedule(at(3, 2, 9, 0), Duration::minutes(90))?;
        manager.update_task(&scheduled)?;

        let mut done = manager.lookup(sub).expect("sub");
        done.set_status(TaskStatus::Done);
        done.schedule(at(3, 2, 13, 0), Duration::minutes(30))?;
        manager.update_subtask(&done)?;

        manager.get_subtask(sub);
        manager.get_task(task);
        store.save()?;
    }

    let mut store = FileStore::open(&path, &schedule())?;
    let manager = store.manager_mut();
    let task = manager.lookup(1).expect("task");
    assert_eq!(task.name(), "Report, final");
    assert_eq!(task.description(), "with \"quotes\"\nand a newline");
    assert_eq!(task.start_time(), Some(at(3, 2, 9, 0)));
    assert_eq!(task.duration(), Duration::minutes(90));

    let epic = manager.lookup(2).expect("epic");
    assert_eq!(epic.status(), TaskStatus::Done);
    assert_eq!(epic.subtask_ids(), &[3]);
    assert_eq!(epic.end_time(), Some(at(3, 2, 13, 30)));

    let history: Vec<_> = manager.get_history().iter().map(Task::id).collect();
    assert_eq!(history, vec![3, 1]);
    assert_eq!(manager.get_prioritized_tasks().len(), 2);
    assert_eq!(manager.create_task("Next", "")?, 4);

    let mut clash = manager.lookup(4).expect("new task");
    clash.schedule(at(3, 2, 10, 0), Duration::minutes(15))?;
    assert!(matches!(manager.update_task(&clash), Err(Error::TimeConflict { .. })));
    Ok(())
}

#[test]
fn file_rows_follow_kind_then_id_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = manager();
    let epic = store.create_epic("Epic", "")?;
    store.create_subtask("Sub", "", epic)?;
    store.create_task("Task", "")?;

    let text = encode(&store.snapshot());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("3,TASK,"));
    assert!(lines[2].starts_with("1,EPIC,"));
    assert!(lines[3].starts_with("2,SUBTASK,Sub,NEW,,1,"));
    assert_eq!(lines[4], "");
    Ok(())
}

#[test]
fn stored_epic_fields_are_recomputed() -> Result<(), Box<dyn std::error::Error>> {
    let content = format!(
        "{CSV_HEADER}\n\
         1,EPIC,Epic,DONE,,,500,2026-09-09 09:00:00\n\
         2,SUBTASK,Sub,NEW,,1,15,\n\
         \n"
    );
    let restored = TaskManager::from_snapshot(&schedule(), decode(&content))?;
    let epic = restored.lookup(1).expect("epic");
    assert_eq!(epic.status(), TaskStatus::New);
    assert_eq!(epic.duration(), Duration::minutes(15));
    assert_eq!(epic.start_time(), None);
    assert_eq!(epic.subtask_ids(), &[2]);
    Ok(())
}

#[test]
fn lenient_load_keeps_good_rows() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tasks.csv");
    fs::write(
        &path,
        format!(
            "{CSV_HEADER}\n\
             1,TASK,Good,DONE,,,30,2026-02-02 10:00:00\n\
             2,TASK,Broken start,NEW,,,15,yesterday\n\
             garbage line\n\
             4,SUBTASK,Orphan,NEW,,77,,\n\
             \n\
             2,x,1,4"
        ),
    )?;

    let store = FileStore::open(&path, &schedule())?;
    let manager = store.manager();
    assert_eq!(manager.get_all_tasks().len(), 2);
    assert!(manager.get_all_subtasks().is_empty());
    assert_eq!(manager.lookup(2).expect("task").start_time(), None);
    let history: Vec<_> = manager.get_history().iter().map(Task::id).collect();
    assert_eq!(history, vec![2, 1]);
    Ok(())
}

#[test]
fn open_store_holds_the_file_lock() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tasks.csv");
    let lock_path = kanban::lock::lock_path_for(&path);

    let first = FileStore::open(&path, &schedule())?;
    let contender = lock_path.clone();
    let blocked = std::thread::spawn(move || {
        kanban::lock::FileLock::try_acquire(&contender)
            .map(|lock| lock.is_none())
            .unwrap_or(false)
    })
    .join()
    .expect("join");
    assert!(blocked);

    drop(first);
    assert!(kanban::lock::FileLock::try_acquire(&lock_path)?.is_some());
    Ok(())
}

#[test]
fn open_without_file_starts_empty_and_save_creates_it() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("board.csv");
    let store = FileStore::open(&path, &schedule())?;
    assert!(store.manager().get_all_tasks().is_empty());
    assert!(!path.exists());
    store.save()?;
    assert_eq!(fs::read_to_string(&path)?, format!("{CSV_HEADER}\n\n"));
    assert_eq!(store.path(), path.as_path());
    Ok(())
}
