//! Fixed-capacity table of tracked aircraft keyed by hardware address.
//!
//! `N` regular slots plus one overflow sentinel. A regular slot is free when
//! its address is all zero. Lookup and allocation are linear scans; the
//! table is small and never grows after construction.
//!
//! Slot lifecycle:
//! - free -> occupied: `find_or_allocate` on an unseen address
//! - occupied -> free: `sweep` after `stale_timeout` seconds of silence, or
//!   `release_if_empty` when a frame produced nothing worth keeping
//!
//! The sentinel absorbs traffic when every regular slot holds another live
//! transmitter. It never stores an address, is never matched by lookup, and
//! is never evicted.

use serde::{Serialize, Serializer};

use crate::types::{
    mac_is_empty, mac_to_string, DecodedFields, FrameMeta, IdString, MacAddr, OperatorLocation,
    Position, EMPTY_MAC,
};

/// Entries are evicted after this many seconds without a frame.
pub const STALE_TIMEOUT: f64 = 300.0;

/// Default number of regular slots.
pub const DEFAULT_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Tracked entry
// ---------------------------------------------------------------------------

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedEntry {
    #[serde(serialize_with = "serialize_mac")]
    pub address: MacAddr,
    pub last_seen: f64,
    /// Changed since the consumer last looked.
    #[serde(skip)]
    pub dirty: bool,
    pub rssi: i8,
    pub operator_id: IdString,
    pub uav_id: IdString,
    pub position: Option<Position>,
    pub operator_location: Option<OperatorLocation>,
}

fn serialize_mac<S: Serializer>(mac: &MacAddr, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&mac_to_string(mac))
}

impl TrackedEntry {
    pub const EMPTY: TrackedEntry = TrackedEntry {
        address: EMPTY_MAC,
        last_seen: 0.0,
        dirty: false,
        rssi: 0,
        operator_id: IdString::EMPTY,
        uav_id: IdString::EMPTY,
        position: None,
        operator_location: None,
    };

    pub fn is_free(&self) -> bool {
        mac_is_empty(&self.address)
    }

    /// True if the entry holds neither identity nor position.
    pub fn is_blank(&self) -> bool {
        self.operator_id.is_empty() && self.uav_id.is_empty() && self.position.is_none()
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.last_seen
    }

    /// Overwrite the fields present in `fields`. Returns true if anything
    /// was applied (and the entry is now dirty).
    pub fn merge(&mut self, fields: &DecodedFields) -> bool {
        if fields.is_empty() {
            return false;
        }
        if let Some(id) = fields.operator_id {
            self.operator_id = id;
        }
        if let Some(id) = fields.uav_id {
            self.uav_id = id;
        }
        if let Some(pos) = fields.position {
            self.position = Some(pos);
        }
        if let Some(base) = fields.operator_location {
            self.operator_location = Some(base);
        }
        self.dirty = true;
        true
    }
}

impl Default for TrackedEntry {
    fn default() -> Self {
        TrackedEntry::EMPTY
    }
}

/// Handle to a slot returned by lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    Regular(usize),
    Sentinel,
}

// ---------------------------------------------------------------------------
// Slot table
// ---------------------------------------------------------------------------

/// The unsynchronized table. See [`crate::tracker::Tracker`] for the shared
/// wrapper used across the producer and consumer.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<TrackedEntry>,
    sentinel: TrackedEntry,
    stale_timeout: f64,
    overflowing: bool,
}

impl SlotTable {
    pub fn new(capacity: usize, stale_timeout: f64) -> Self {
        SlotTable {
            slots: vec![TrackedEntry::EMPTY; capacity],
            sentinel: TrackedEntry::EMPTY,
            stale_timeout,
            overflowing: false,
        }
    }

    /// Number of regular slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn stale_timeout(&self) -> f64 {
        self.stale_timeout
    }

    /// Index of the occupied regular slot holding `address`.
    pub fn find(&self, address: &MacAddr) -> Option<usize> {
        if mac_is_empty(address) {
            return None;
        }
        self.slots.iter().position(|s| s.address == *address)
    }

    /// Look up `address`, claiming a free slot if unseen. Falls back to the
    /// sentinel when no free slot remains (or the address is all zero).
    pub fn find_or_allocate(&mut self, address: &MacAddr) -> SlotRef {
        if mac_is_empty(address) {
            return SlotRef::Sentinel;
        }
        if let Some(i) = self.find(address) {
            return SlotRef::Regular(i);
        }

        if let Some(i) = self.slots.iter().position(TrackedEntry::is_free) {
            self.slots[i] = TrackedEntry {
                address: *address,
                ..TrackedEntry::EMPTY
            };
            if self.overflowing {
                log::info!("tracking table has room again");
                self.overflowing = false;
            }
            log::debug!("slot {i} allocated to {}", mac_to_string(address));
            return SlotRef::Regular(i);
        }

        if !self.overflowing {
            log::warn!(
                "tracking table full ({} slots), {} attributed to overflow",
                self.slots.len(),
                mac_to_string(address)
            );
            self.overflowing = true;
        }
        SlotRef::Sentinel
    }

    pub fn get(&self, slot: SlotRef) -> &TrackedEntry {
        match slot {
            SlotRef::Regular(i) => &self.slots[i],
            SlotRef::Sentinel => &self.sentinel,
        }
    }

    fn get_mut(&mut self, slot: SlotRef) -> &mut TrackedEntry {
        match slot {
            SlotRef::Regular(i) => &mut self.slots[i],
            SlotRef::Sentinel => &mut self.sentinel,
        }
    }

    /// Refresh timestamp and signal strength from frame metadata.
    pub fn stamp(&mut self, slot: SlotRef, meta: &FrameMeta) {
        let entry = self.get_mut(slot);
        entry.last_seen = meta.timestamp;
        entry.rssi = meta.rssi;
    }

    /// Apply decoded fields to a slot.
    pub fn merge(&mut self, slot: SlotRef, fields: &DecodedFields) -> bool {
        self.get_mut(slot).merge(fields)
    }

    /// Free a regular slot that holds neither identity nor position.
    pub fn release_if_empty(&mut self, slot: SlotRef) -> bool {
        let SlotRef::Regular(i) = slot else {
            return false;
        };
        if self.slots[i].is_free() || !self.slots[i].is_blank() {
            return false;
        }
        self.slots[i] = TrackedEntry::EMPTY;
        true
    }

    /// Stamp, merge and apply the empty-result rule for one frame.
    pub fn record(&mut self, address: &MacAddr, meta: &FrameMeta, fields: &DecodedFields) -> SlotRef {
        let slot = self.find_or_allocate(address);
        self.stamp(slot, meta);
        self.merge(slot, fields);
        self.release_if_empty(slot);
        slot
    }

    /// Evict regular slots silent for longer than the stale timeout.
    /// Returns the number evicted.
    pub fn sweep(&mut self, now: f64) -> usize {
        let mut evicted = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_free() && slot.age(now) > self.stale_timeout {
                log::info!(
                    "slot {i} evicted: {} silent for {:.0}s",
                    mac_to_string(&slot.address),
                    slot.age(now)
                );
                *slot = TrackedEntry::EMPTY;
                evicted += 1;
            }
        }
        evicted
    }

    /// Visit every dirty entry (regular slots, then the sentinel) and clear
    /// its dirty flag. Returns the number visited.
    pub fn for_each_dirty<F: FnMut(&TrackedEntry)>(&mut self, mut f: F) -> usize {
        let mut visited = 0;
        for entry in self.slots.iter_mut().chain(std::iter::once(&mut self.sentinel)) {
            if entry.dirty {
                f(entry);
                entry.dirty = false;
                visited += 1;
            }
        }
        visited
    }

    /// Stamp the sentinel with `now` and mark it dirty, so the next
    /// `for_each_dirty` reports it even when nothing was heard.
    pub fn heartbeat(&mut self, now: f64) {
        self.sentinel.last_seen = now;
        self.sentinel.dirty = true;
    }

    /// Occupied regular slots.
    pub fn occupied(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.slots.iter().filter(|s| !s.is_free())
    }

    pub fn sentinel(&self) -> &TrackedEntry {
        &self.sentinel
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        SlotTable::new(DEFAULT_CAPACITY, STALE_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
