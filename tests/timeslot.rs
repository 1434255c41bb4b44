mod support;

use chrono::Duration;
use kanban::epic::summarize;
use kanban::timeslot::TimeSlotIndex;
use kanban::{Task, TaskStatus};
use proptest::prelude::*;

use support::{at, base};

fn scheduled(id: u32, start_minutes: i64, duration_minutes: i64) -> Task {
    let mut task = Task::task(id, format!("task {id}"), "").expect("task");
    task.schedule(
        base() + Duration::minutes(start_minutes),
        Duration::minutes(duration_minutes),
    )
    .expect("schedule");
    task
}

#[test]
fn touching_intervals_never_conflict() {
    let mut index = TimeSlotIndex::new(base());
    index.add(&scheduled(1, 600, 60));
    assert!(!index.has_conflict(&scheduled(2, 540, 60)));
    assert!(!index.has_conflict(&scheduled(3, 660, 60)));
    assert!(index.has_conflict(&scheduled(4, 659, 60)));
    assert!(index.has_conflict(&scheduled(5, 630, 1)));
}

#[test]
fn horizon_edges() {
    let mut index = TimeSlotIndex::new(base());
    let last_hour = scheduled(1, 365 * 24 * 60 - 60, 60);
    assert!(index.add(&last_hour));
    let spilling = scheduled(2, 365 * 24 * 60 - 30, 60);
    assert!(!index.add(&spilling));
    assert!(!index.has_conflict(&spilling));
    assert!(index.find_next_free_slot(60, at(12, 31, 23, 0)).is_none());
}

#[test]
fn finer_slots_separate_sub_quarter_neighbours() {
    let mut coarse = TimeSlotIndex::new(base());
    let mut fine = TimeSlotIndex::with_layout(base(), 1, 30);
    let first = scheduled(1, 600, 5);
    let second = scheduled(2, 605, 5);
    coarse.add(&first);
    fine.add(&first);
    assert!(coarse.has_conflict(&second));
    assert!(!fine.has_conflict(&second));
}

proptest! {
    #[test]
    fn slot_aligned_conflicts_match_overlap(
        s1 in 0i64..400,
        d1 in 1i64..40,
        s2 in 0i64..400,
        d2 in 1i64..40,
    ) {
        let a = scheduled(1, s1 * 15, d1 * 15);
        let b = scheduled(2, s2 * 15, d2 * 15);
        let mut index = TimeSlotIndex::new(base());
        prop_assert!(index.add(&a));

        let expected = s1 < s2 + d2 && s2 < s1 + d1;
        prop_assert_eq!(index.has_conflict(&b), expected);
        prop_assert_eq!(a.overlaps(&b), expected);
    }

    #[test]
    fn real_overlaps_are_always_caught(
        s1 in 0i64..6000,
        d1 in 1i64..300,
        s2 in 0i64..6000,
        d2 in 1i64..300,
    ) {
        let a = scheduled(1, s1, d1);
        let b = scheduled(2, s2, d2);
        let mut index = TimeSlotIndex::new(base());
        index.add(&a);
        if a.overlaps(&b) {
            prop_assert!(index.has_conflict(&b));
        }
    }

    #[test]
    fn free_slot_answer_is_free(
        busy in proptest::collection::vec((0i64..200, 1i64..12), 0..12),
        wanted in 1u32..240,
        from in 0i64..3000,
    ) {
        let mut index = TimeSlotIndex::new(base());
        for (id, (start, len)) in busy.into_iter().enumerate() {
            let task = scheduled(id as u32 + 1, start * 15, len * 15);
            if !index.has_conflict(&task) {
                index.add(&task);
            }
        }
        let after = base() + Duration::minutes(from);
        let found = index.find_next_free_slot(wanted, after).expect("year has room");
        prop_assert!(found >= after);
        let candidate = {
            let mut task = Task::task(999, "candidate", "").expect("task");
            task.schedule(found, Duration::minutes(i64::from(wanted))).expect("schedule");
            task
        };
        prop_assert!(!index.has_conflict(&candidate));
    }

    #[test]
    fn epic_status_rule(codes in proptest::collection::vec(0u8..3, 0..10)) {
        let subtasks: Vec<Task> = codes
            .iter()
            .enumerate()
            .map(|(idx, code)| {
                let mut task = Task::subtask(idx as u32 + 2, "sub", "", 1).expect("subtask");
                task.set_status(match code {
                    0 => TaskStatus::New,
                    1 => TaskStatus::InProgress,
                    _ => TaskStatus::Done,
                });
                task
            })
            .collect();
        let status = summarize(&subtasks).status;

        let all_new = subtasks.iter().all(|t| t.status() == TaskStatus::New);
        let all_done = !subtasks.is_empty() && subtasks.iter().all(|t| t.status() == TaskStatus::Done);
        let expected = if all_new {
            TaskStatus::New
        } else if all_done {
            TaskStatus::Done
        } else {
            TaskStatus::InProgress
        };
        prop_assert_eq!(status, expected);
    }
}
