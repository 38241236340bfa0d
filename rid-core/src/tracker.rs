//! Shared, synchronized handle to the tracking table.
//!
//! One producer (the frame callback) and one periodic consumer (the report
//! loop) share a `Tracker`, usually through an `Arc`. A single mutex guards
//! the whole table: each frame's stamp + merge + re-free happens under one
//! lock acquisition, so the consumer never sees a half-applied update and a
//! dirty-clear cannot interleave with a merge.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::table::{SlotRef, SlotTable, TrackedEntry, DEFAULT_CAPACITY, STALE_TIMEOUT};
use crate::types::{DecodedFields, FrameMeta, MacAddr};

/// Thread-safe tracking table.
#[derive(Debug)]
pub struct Tracker {
    table: Mutex<SlotTable>,
}

impl Tracker {
    pub fn new(capacity: usize, stale_timeout: f64) -> Self {
        Tracker {
            table: Mutex::new(SlotTable::new(capacity, stale_timeout)),
        }
    }

    // Every mutation leaves the table consistent, so a panic elsewhere
    // while holding the lock does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, SlotTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attribute one frame to `address` and merge its decoded fields.
    pub fn record(&self, address: &MacAddr, meta: &FrameMeta, fields: &DecodedFields) -> SlotRef {
        self.lock().record(address, meta, fields)
    }

    /// Visit each dirty entry and clear it. Returns the number visited.
    pub fn for_each_dirty<F: FnMut(&TrackedEntry)>(&self, f: F) -> usize {
        self.lock().for_each_dirty(f)
    }

    /// Evict stale entries. Returns the number evicted.
    pub fn sweep(&self, now: f64) -> usize {
        self.lock().sweep(now)
    }

    /// Queue a sentinel report for the consumer. See [`SlotTable::heartbeat`].
    pub fn heartbeat(&self, now: f64) {
        self.lock().heartbeat(now);
    }

    /// Copies of all occupied regular slots.
    pub fn occupied(&self) -> Vec<TrackedEntry> {
        self.lock().occupied().copied().collect()
    }

    /// Copy of the overflow sentinel.
    pub fn sentinel(&self) -> TrackedEntry {
        *self.lock().sentinel()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Run `f` with read access to the table.
    pub fn with_table<R>(&self, f: impl FnOnce(&SlotTable) -> R) -> R {
        f(&self.lock())
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker::new(DEFAULT_CAPACITY, STALE_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
