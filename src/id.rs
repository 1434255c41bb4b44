//! Identifier generation
//!
//! One counter is shared by tasks, epics and subtasks, so an id never
//! names two items of any kind. The counter refuses to wrap.

use crate::error::{Error, Result};
use crate::model::TaskId;

/// Issues increasing ids starting at 1
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose first issued id is `first`
    pub fn starting_at(first: TaskId) -> Self {
        Self {
            next: u64::from(first),
        }
    }

    /// Issue the next id
    pub fn next_id(&mut self) -> Result<TaskId> {
        let id = TaskId::try_from(self.next).map_err(|_| Error::IdSpaceExhausted)?;
        self.next += 1;
        Ok(id)
    }

    /// Make sure ids issued from now on are greater than `id`
    pub fn observe(&mut self, id: TaskId) {
        self.next = self.next.max(u64::from(id) + 1);
    }

    /// The id the next call would issue, if any remain
    pub fn peek(&self) -> Option<TaskId> {
        TaskId::try_from(self.next).ok()
    }
}
