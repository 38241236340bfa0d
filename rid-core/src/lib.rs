//! rid-core: Pure decode + tracking library for WiFi drone remote ID.
//!
//! No threads, no radio, no rendering. Raw 802.11 frames go in through
//! [`Dispatcher::dispatch`]; a bounded [`Tracker`] holds the aircraft seen
//! recently for a reporting loop to drain.

pub mod adapter;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod frame;
pub mod french;
pub mod odid;
pub mod table;
pub mod tlv;
pub mod tracker;
pub mod types;
pub mod vendor;

#[cfg(test)]
mod testutil;

// Re-export commonly used types at crate root
pub use dispatch::{DispatchStats, Dispatcher};
pub use frame::{classify, FrameClass, RawFrame};
pub use french::FrenchVersionPolicy;
pub use odid::{OdidDecoder, OpenDroneId, UasData};
pub use table::{SlotRef, SlotTable, TrackedEntry};
pub use tracker::Tracker;
pub use types::*;
