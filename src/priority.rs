//! Start-time ordering
//!
//! Scheduled tasks and subtasks ordered by start time, ties broken by id.
//! Items without a start time are not part of the ordering.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;

use crate::model::{Task, TaskId};

#[derive(Debug, Clone, Default)]
pub struct PriorityIndex {
    order: BTreeSet<(NaiveDateTime, TaskId)>,
    starts: HashMap<TaskId, NaiveDateTime>,
}

impl PriorityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or reposition `task`
    ///
    /// A task without a start time is dropped from the ordering.
    pub fn upsert(&mut self, task: &Task) {
        self.remove(task.id());
        if let Some(start) = task.start_time() {
            self.order.insert((start, task.id()));
            self.starts.insert(task.id(), start);
        }
    }

    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.starts.remove(&id) {
            Some(start) => self.order.remove(&(start, id)),
            None => false,
        }
    }

    /// Ids in ascending start order
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.order.iter().map(|(_, id)| *id)
    }

    /// Earliest scheduled id
    pub fn first(&self) -> Option<TaskId> {
        self.order.iter().next().map(|(_, id)| *id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.starts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid time")
    }

    fn timed(id: TaskId, start: Option<NaiveDateTime>) -> Task {
        let mut task = Task::task(id, format!("task {id}"), "").expect("task");
        if let Some(start) = start {
            task.schedule(start, Duration::minutes(30)).expect("schedule");
        }
        task
    }

    #[test]
    fn orders_by_start_then_id() {
        let mut index = PriorityIndex::new();
        index.upsert(&timed(5, Some(at(12))));
        index.upsert(&timed(2, Some(at(9))));
        index.upsert(&timed(4, Some(at(12))));
        index.upsert(&timed(9, None));

        assert_eq!(index.iter().collect::<Vec<_>>(), vec![2, 4, 5]);
        assert_eq!(index.first(), Some(2));
        assert!(!index.contains(9));
    }

    #[test]
    fn upsert_repositions_and_drops_untimed() {
        let mut index = PriorityIndex::new();
        index.upsert(&timed(1, Some(at(8))));
        index.upsert(&timed(2, Some(at(10))));
        index.upsert(&timed(1, Some(at(11))));
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![2, 1]);

        index.upsert(&timed(2, None));
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut index = PriorityIndex::new();
        assert!(!index.remove(3));
        index.upsert(&timed(3, Some(at(7))));
        assert!(index.remove(3));
        assert!(index.is_empty());
    }
}
