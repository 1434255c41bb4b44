//! View history
//!
//! Keeps snapshots of recently viewed items, oldest first, with at most one
//! entry per id. Viewing an id again moves it to the tail. Both `record` and
//! `remove` are O(1): entries live in a slab of linked nodes and an id index
//! points at each node.

use std::collections::HashMap;

use crate::model::{Task, TaskId};

#[derive(Debug, Clone)]
struct Node {
    task: Task,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Duplicate-free, most-recent-last view history
#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<TaskId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a view of `task`, storing a copy of it at the tail
    pub fn record(&mut self, task: &Task) {
        if let Some(slot) = self.index.get(&task.id()).copied() {
            self.unlink(slot);
        }
        self.link_last(task.clone());
    }

    /// Drop the entry for `id`; returns whether one existed
    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.index.get(&id).copied() {
            Some(slot) => {
                self.unlink(slot);
                true
            }
            None => false,
        }
    }

    /// Entries oldest first
    pub fn list(&self) -> Vec<Task> {
        self.iter().cloned().collect()
    }

    /// Ids oldest first
    pub fn ids(&self) -> Vec<TaskId> {
        self.iter().map(Task::id).collect()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tracker: self,
            cursor: self.head,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn link_last(&mut self, task: Task) {
        let id = task.id();
        let node = Node {
            task,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.nodes[tail].as_mut() {
                    tail_node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(id, slot);
    }

    fn unlink(&mut self, slot: usize) {
        let Some(node) = self.nodes[slot].take() else {
            return;
        };
        self.index.remove(&node.task.id());
        self.free.push(slot);

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.nodes[prev].as_mut() {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.nodes[next].as_mut() {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
    }
}

/// Iterator over history entries, oldest first
pub struct Iter<'a> {
    tracker: &'a HistoryTracker,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tracker.nodes.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.task)
    }
}
