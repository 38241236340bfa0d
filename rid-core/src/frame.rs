//! Classify raw 802.11 frames by structure.
//!
//! Responsibilities:
//! - Recognize NAN service discovery action frames by their destination
//!   address (51:6F:9A:01:00:00)
//! - Recognize beacons by the first frame-control byte (0x80)
//! - Extract the transmitter address and the body to decode
//!
//! Anything else is `Other` and dropped silently; the radio delivers all
//! traffic on the channel.

use crate::tlv::TlvIter;
use crate::types::{mac_at, mac_to_string, FrameMeta, MacAddr};

/// Frame-control byte 0 of a beacon.
pub const BEACON_FC: u8 = 0x80;

/// Multicast destination of NAN discovery frames.
pub const NAN_DESTINATION: MacAddr = [0x51, 0x6F, 0x9A, 0x01, 0x00, 0x00];

/// Management frame MAC header length.
pub const MAC_HEADER_LEN: usize = 24;

/// Beacon information elements start after the header plus timestamp (8),
/// beacon interval (2) and capability info (2).
pub const BEACON_ELEMENTS_OFFSET: usize = MAC_HEADER_LEN + 12;

const DEST_OFFSET: usize = 4;
const SOURCE_OFFSET: usize = 10;

/// A captured frame and its radio metadata, borrowed for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub data: &'a [u8],
    pub meta: FrameMeta,
}

impl<'a> RawFrame<'a> {
    pub fn new(data: &'a [u8], rssi: i8, timestamp: f64) -> Self {
        RawFrame {
            data,
            meta: FrameMeta { rssi, timestamp },
        }
    }
}

/// Structural category of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass<'a> {
    /// NAN action frame; `body` follows the MAC header.
    Action { source: MacAddr, body: &'a [u8] },
    /// Beacon; `elements` is the information element area.
    Beacon {
        source: MacAddr,
        elements: &'a [u8],
    },
    Other,
}

impl<'a> FrameClass<'a> {
    /// Transmitter address, if the frame is one we track.
    pub fn source(&self) -> Option<MacAddr> {
        match self {
            FrameClass::Action { source, .. } | FrameClass::Beacon { source, .. } => Some(*source),
            FrameClass::Other => None,
        }
    }

    /// Information elements of a beacon; empty for other classes.
    pub fn elements(&self) -> TlvIter<'a> {
        match self {
            FrameClass::Beacon { elements, .. } => TlvIter::over(elements),
            _ => TlvIter::over(&[]),
        }
    }
}

/// Classify a raw frame.
pub fn classify(data: &[u8]) -> FrameClass<'_> {
    if data.len() < MAC_HEADER_LEN {
        return FrameClass::Other;
    }
    let Some(source) = mac_at(data, SOURCE_OFFSET) else {
        return FrameClass::Other;
    };

    if mac_at(data, DEST_OFFSET) == Some(NAN_DESTINATION) {
        log::trace!("NAN action frame from {}", mac_to_string(&source));
        return FrameClass::Action {
            source,
            body: &data[MAC_HEADER_LEN..],
        };
    }

    if data[0] == BEACON_FC {
        log::trace!("beacon from {}", mac_to_string(&source));
        return FrameClass::Beacon {
            source,
            elements: data.get(BEACON_ELEMENTS_OFFSET..).unwrap_or(&[]),
        };
    }

    FrameClass::Other
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    #[test]
    fn test_classify_beacon() {
        let frame = beacon_frame(mac(7), &[ssid_element(b"cafe")]);
        let class = classify(&frame);
        assert_eq!(class.source(), Some(mac(7)));
        match class {
            FrameClass::Beacon { elements, .. } => assert_eq!(elements, &ssid_element(b"cafe")[..]),
            other => panic!("expected beacon, got {other:?}"),
        }
        assert_eq!(class.elements().count(), 1);
    }

    #[test]
    fn test_classify_action() {
        let frame = nan_frame(mac(3), &[0x04, 0x09]);
        match classify(&frame) {
            FrameClass::Action { source, body } => {
                assert_eq!(source, mac(3));
                assert_eq!(body, &[0x04, 0x09]);
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_action_wins_over_subtype() {
        // NAN destination decides even if byte 0 looks like a beacon.
        let mut frame = nan_frame(mac(3), &[]);
        frame[0] = BEACON_FC;
        assert!(matches!(classify(&frame), FrameClass::Action { .. }));
    }

    #[test]
    fn test_classify_other() {
        // Probe request
        let mut frame = beacon_frame(mac(1), &[]);
        frame[0] = 0x40;
        assert_eq!(classify(&frame), FrameClass::Other);
        assert!(classify(&frame).source().is_none());
        assert_eq!(classify(&frame).elements().count(), 0);
    }

    #[test]
    fn test_short_frames() {
        assert_eq!(classify(&[]), FrameClass::Other);
        assert_eq!(classify(&[0x80; 20]), FrameClass::Other);

        // Header-only beacon has no elements.
        let frame = beacon_frame(mac(2), &[]);
        let class = classify(&frame[..MAC_HEADER_LEN]);
        assert!(matches!(class, FrameClass::Beacon { .. }));
        assert_eq!(class.elements().count(), 0);
    }

    #[test]
    fn test_raw_frame_meta() {
        let data = [0u8; 4];
        let raw = RawFrame::new(&data, -61, 12.5);
        assert_eq!(raw.meta.rssi, -61);
        assert_eq!(raw.meta.timestamp, 12.5);
    }
}
