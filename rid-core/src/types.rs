//! Shared types, error enum, and decoded field records for rid-core.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// All errors produced by rid-core.
#[derive(Debug, Error)]
pub enum RidError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("message truncated: needed {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unrecognized message type: {0:#x}")]
    UnknownMessageType(u8),
    #[error("invalid message pack: {0}")]
    InvalidMessagePack(&'static str),
    #[error("invalid action frame: {0}")]
    InvalidActionFrame(&'static str),
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RidError>;

// ---------------------------------------------------------------------------
// Hardware address helpers
// ---------------------------------------------------------------------------

/// 6-byte link-layer address of a transmitter.
pub type MacAddr = [u8; 6];

/// The all-zero address marks a free table slot.
pub const EMPTY_MAC: MacAddr = [0; 6];

/// True if the address is all zero.
pub fn mac_is_empty(mac: &MacAddr) -> bool {
    *mac == EMPTY_MAC
}

/// Format an address as colon-separated lowercase hex.
pub fn mac_to_string(mac: &MacAddr) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Copy six bytes at `offset` out of a frame, if present.
pub fn mac_at(frame: &[u8], offset: usize) -> Option<MacAddr> {
    frame.get(offset..offset + 6)?.try_into().ok()
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if !hex.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Bounded identity strings
// ---------------------------------------------------------------------------

/// Maximum stored length of an operator or UAV identifier.
pub const ID_CAPACITY: usize = 20;

/// Fixed-capacity identifier. Copies truncate silently at `ID_CAPACITY`.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct IdString {
    len: u8,
    bytes: [u8; ID_CAPACITY],
}

impl IdString {
    pub const EMPTY: IdString = IdString {
        len: 0,
        bytes: [0; ID_CAPACITY],
    };

    /// Copy `src`, truncated to capacity.
    pub fn from_bytes(src: &[u8]) -> Self {
        let n = src.len().min(ID_CAPACITY);
        let mut bytes = [0u8; ID_CAPACITY];
        bytes[..n].copy_from_slice(&src[..n]);
        IdString {
            len: n as u8,
            bytes,
        }
    }

    /// Copy up to the first NUL (open-standard ids are NUL-padded).
    pub fn from_padded(src: &[u8]) -> Self {
        let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
        Self::from_bytes(&src[..end])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Serialize for IdString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Decoded field records
// ---------------------------------------------------------------------------

/// Aircraft position and motion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    /// Altitude above mean sea level, meters.
    pub altitude_msl_m: f64,
    /// Height above ground (or takeoff), meters.
    pub height_agl_m: f64,
    /// Horizontal speed, meters per second.
    pub speed_mps: f64,
    /// Track direction, degrees clockwise from north.
    pub heading_deg: f64,
}

/// Operator (base station) location.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OperatorLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Result of decoding one frame: every field is optional.
///
/// `None` means the decode did not touch that field, not that the value is
/// zero. Merging only overwrites what is present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodedFields {
    pub operator_id: Option<IdString>,
    pub uav_id: Option<IdString>,
    pub position: Option<Position>,
    pub operator_location: Option<OperatorLocation>,
}

impl DecodedFields {
    /// True if no sub-record is present.
    pub fn is_empty(&self) -> bool {
        self.operator_id.is_none()
            && self.uav_id.is_none()
            && self.position.is_none()
            && self.operator_location.is_none()
    }

    /// Overlay `other` on top of `self`; present fields in `other` win.
    pub fn absorb(&mut self, other: DecodedFields) {
        if other.operator_id.is_some() {
            self.operator_id = other.operator_id;
        }
        if other.uav_id.is_some() {
            self.uav_id = other.uav_id;
        }
        if other.position.is_some() {
            self.position = other.position;
        }
        if other.operator_location.is_some() {
            self.operator_location = other.operator_location;
        }
    }
}

/// Out-of-band metadata delivered with a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMeta {
    /// Received signal strength, dBm.
    pub rssi: i8,
    /// Capture time, seconds on a monotonic timeline.
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
