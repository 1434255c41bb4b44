//! Time slot conflict index
//!
//! The planning horizon (by default one year from a base instant) is cut into
//! fixed-width slots (15 minutes by default). A bitset marks occupied slots
//! and each indexed item remembers the slot range it holds, so:
//!
//! - a conflict check only looks at the slots the candidate would cover,
//!   independent of how many items are indexed;
//! - removal clears exactly the slots the item held.
//!
//! Slot ranges are half-open `[first, end)`: an interval that ends on a slot
//! boundary does not hold the slot starting there, so touching intervals do
//! not conflict. A partial slot counts as a whole slot, so any positive
//! overlap is caught.
//!
//! Items without a start time, with a zero duration, or reaching outside the
//! horizon are never indexed and never conflict.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use chrono::{Duration, NaiveDateTime};
use fixedbitset::FixedBitSet;
use serde::Serialize;

use crate::model::{Task, TaskId};

/// Default slot width in minutes
pub const DEFAULT_SLOT_MINUTES: u32 = 15;

/// Default horizon length in days
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Bitset-backed occupancy grid over the planning horizon
#[derive(Debug, Clone)]
pub struct TimeSlotIndex {
    base: NaiveDateTime,
    slot_minutes: u32,
    total_slots: usize,
    occupied: FixedBitSet,
    spans: HashMap<TaskId, Range<usize>>,
}

/// Occupancy figures for the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotStats {
    pub total_slots: usize,
    pub slot_minutes: u32,
    pub occupied_slots: usize,
    pub occupancy_percent: f64,
}

impl fmt::Display for SlotStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time grid: {} slots of {} minutes, occupied: {} ({:.2}%)",
            self.total_slots, self.slot_minutes, self.occupied_slots, self.occupancy_percent
        )
    }
}

impl TimeSlotIndex {
    /// Grid starting at `base` with the default slot width and horizon
    pub fn new(base: NaiveDateTime) -> Self {
        Self::with_layout(base, DEFAULT_SLOT_MINUTES, DEFAULT_HORIZON_DAYS)
    }

    /// Grid starting at `base` with `slot_minutes`-wide slots over `horizon_days`
    ///
    /// Both values must be positive; configuration validates them first.
    pub fn with_layout(base: NaiveDateTime, slot_minutes: u32, horizon_days: u32) -> Self {
        let slot_minutes = slot_minutes.max(1);
        let horizon_minutes = u64::from(horizon_days.max(1)) * 24 * 60;
        let total_slots = (horizon_minutes / u64::from(slot_minutes)) as usize;
        Self {
            base,
            slot_minutes,
            total_slots,
            occupied: FixedBitSet::with_capacity(total_slots),
            spans: HashMap::new(),
        }
    }

    pub fn base(&self) -> NaiveDateTime {
        self.base
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// First instant past the horizon
    pub fn horizon_end(&self) -> NaiveDateTime {
        self.slot_start(self.total_slots)
    }

    /// Start of the slot with the given index
    pub fn slot_start(&self, slot: usize) -> NaiveDateTime {
        let minutes = slot as i64 * i64::from(self.slot_minutes);
        self.base + Duration::minutes(minutes)
    }

    /// Slot range currently held by `id`
    pub fn slots_of(&self, id: TaskId) -> Option<Range<usize>> {
        self.spans.get(&id).cloned()
    }

    /// Mark the slots of `task` as occupied
    ///
    /// Replaces any slots the same id held before. Returns whether the task
    /// ended up indexed.
    pub fn add(&mut self, task: &Task) -> bool {
        self.remove(task.id());
        let Some(range) = self.slot_range(task) else {
            return false;
        };
        self.occupied.set_range(range.clone(), true);
        self.spans.insert(task.id(), range);
        true
    }

    /// Free the slots held by `id`; returns whether it was indexed
    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.spans.remove(&id) {
            Some(range) => {
                self.occupied.set_range(range, false);
                true
            }
            None => false,
        }
    }

    /// Whether `task` would cover a slot held by another item
    ///
    /// Slots held by the task's own id are ignored, so an indexed item can be
    /// checked against its new schedule before it is moved.
    pub fn has_conflict(&self, task: &Task) -> bool {
        let Some(range) = self.slot_range(task) else {
            return false;
        };
        match self.spans.get(&task.id()) {
            None => self.occupied.count_ones(range) > 0,
            Some(own) => range
                .filter(|slot| !own.contains(slot))
                .any(|slot| self.occupied.contains(slot)),
        }
    }

    /// Earliest start at or after `search_start` with `duration_minutes` of
    /// free, contiguous slots
    ///
    /// Candidates start on slot boundaries. Returns `None` when the horizon
    /// runs out first.
    pub fn find_next_free_slot(
        &self,
        duration_minutes: u32,
        search_start: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let first = self.first_boundary_at_or_after(search_start)?;
        let required = duration_minutes.div_ceil(self.slot_minutes) as usize;
        if required == 0 {
            return Some(self.slot_start(first));
        }

        let mut run = 0usize;
        for slot in first..self.total_slots {
            if self.occupied.contains(slot) {
                run = 0;
                continue;
            }
            run += 1;
            if run == required {
                return Some(self.slot_start(slot + 1 - required));
            }
        }
        None
    }

    pub fn stats(&self) -> SlotStats {
        let occupied_slots = self.occupied.count_ones(..);
        let occupancy_percent = if self.total_slots == 0 {
            0.0
        } else {
            occupied_slots as f64 / self.total_slots as f64 * 100.0
        };
        SlotStats {
            total_slots: self.total_slots,
            slot_minutes: self.slot_minutes,
            occupied_slots,
            occupancy_percent,
        }
    }

    fn slot_width_ms(&self) -> i64 {
        i64::from(self.slot_minutes) * 60 * 1000
    }

    fn slot_range(&self, task: &Task) -> Option<Range<usize>> {
        let start = task.start_time()?;
        let duration = task.duration();
        if duration <= Duration::zero() {
            return None;
        }
        let end = start.checked_add_signed(duration)?;
        if start < self.base || end > self.horizon_end() {
            return None;
        }

        let width = self.slot_width_ms();
        let start_ms = (start - self.base).num_milliseconds();
        let end_ms = (end - self.base).num_milliseconds();
        let first = usize::try_from(start_ms / width).ok()?;
        let last = usize::try_from((end_ms + width - 1) / width).ok()?;
        Some(first..last.min(self.total_slots))
    }

    fn first_boundary_at_or_after(&self, instant: NaiveDateTime) -> Option<usize> {
        if instant <= self.base {
            return Some(0);
        }
        let width = self.slot_width_ms();
        let offset_ms = (instant - self.base).num_milliseconds();
        let slot = usize::try_from((offset_ms + width - 1) / width).ok()?;
        (slot <= self.total_slots).then_some(slot)
    }
}
