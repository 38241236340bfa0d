//! Per-frame entry point: classify, decode, and record into the tracker.
//!
//! Decoding happens outside the table lock; only the final stamp + merge
//! takes it. Every classified frame refreshes its transmitter's slot even
//! when nothing decodes, and the table then frees slots left blank.

use std::sync::Arc;

use serde::Serialize;

use crate::adapter;
use crate::frame::{classify, FrameClass, RawFrame};
use crate::french::{decode_french, FrenchVersionPolicy};
use crate::odid::{OdidDecoder, OpenDroneId};
use crate::table::SlotRef;
use crate::tracker::Tracker;
use crate::types::DecodedFields;
use crate::vendor::{VendorElement, VendorKind};

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub frames: u64,
    pub beacons: u64,
    pub action_frames: u64,
    pub ignored: u64,
    pub french_elements: u64,
    pub french_version_mismatches: u64,
    pub odid_decodes: u64,
    pub odid_failures: u64,
    pub overflow: u64,
}

/// Feeds frames from the radio into a shared [`Tracker`].
pub struct Dispatcher {
    tracker: Arc<Tracker>,
    decoder: Box<dyn OdidDecoder>,
    french_policy: FrenchVersionPolicy,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Dispatcher using the built-in open-standard decoder.
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self::with_decoder(tracker, Box::new(OpenDroneId))
    }

    pub fn with_decoder(tracker: Arc<Tracker>, decoder: Box<dyn OdidDecoder>) -> Self {
        Dispatcher {
            tracker,
            decoder,
            french_policy: FrenchVersionPolicy::default(),
            stats: DispatchStats::default(),
        }
    }

    pub fn french_policy(mut self, policy: FrenchVersionPolicy) -> Self {
        self.french_policy = policy;
        self
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Process one frame. Returns the slot it was attributed to, or `None`
    /// for frames that are neither beacons nor NAN action frames.
    pub fn dispatch(&mut self, frame: &RawFrame) -> Option<SlotRef> {
        self.stats.frames += 1;
        let class = classify(frame.data);
        let Some(source) = class.source() else {
            self.stats.ignored += 1;
            log::trace!("ignoring {}-byte frame", frame.data.len());
            return None;
        };

        let fields = self.decode(&class);
        let slot = self.tracker.record(&source, &frame.meta, &fields);
        if slot == SlotRef::Sentinel {
            self.stats.overflow += 1;
        }
        Some(slot)
    }

    /// Decode every recognized payload in a classified frame.
    pub fn decode(&mut self, class: &FrameClass) -> DecodedFields {
        match class {
            FrameClass::Action { source, body } => {
                self.stats.action_frames += 1;
                self.record_odid(adapter::decode_action_frame(
                    self.decoder.as_ref(),
                    source,
                    body,
                ))
            }
            FrameClass::Beacon { .. } => {
                self.stats.beacons += 1;
                let mut fields = DecodedFields::default();
                for tlv in class.elements() {
                    let Some(element) = VendorElement::from_tlv(&tlv) else {
                        continue;
                    };
                    fields.absorb(self.decode_vendor(&element));
                }
                fields
            }
            FrameClass::Other => DecodedFields::default(),
        }
    }

    fn decode_vendor(&mut self, element: &VendorElement) -> DecodedFields {
        match element.kind() {
            VendorKind::FrenchDialect => {
                self.stats.french_elements += 1;
                let out = decode_french(element, self.french_policy);
                if out.version_mismatch {
                    self.stats.french_version_mismatches += 1;
                }
                out.fields
            }
            VendorKind::OpenStandard => {
                let decoded = adapter::decode_beacon_element(self.decoder.as_ref(), element);
                self.record_odid(decoded)
            }
            VendorKind::Unrecognized => DecodedFields::default(),
        }
    }

    fn record_odid(&mut self, decoded: Option<DecodedFields>) -> DecodedFields {
        match decoded {
            Some(fields) => {
                self.stats.odid_decodes += 1;
                fields
            }
            None => {
                self.stats.odid_failures += 1;
                DecodedFields::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::french_encode_degrees;
    use crate::table::STALE_TIMEOUT;
    use crate::testutil::*;

    fn dispatcher(capacity: usize) -> Dispatcher {
        Dispatcher::new(Arc::new(Tracker::new(capacity, STALE_TIMEOUT)))
    }

    fn located_beacon(last: u8) -> Vec<u8> {
        beacon_frame(
            mac(last),
            &[
                ssid_element(b"DRONE"),
                odid_element(&location_msg(51.5, -0.1, 100.0, 30.0, 90.0, 4.0)),
            ],
        )
    }

    fn french_beacon(last: u8, version: u8) -> Vec<u8> {
        beacon_frame(
            mac(last),
            &[french_element(&[
                (1, &[version]),
                (2, b"FRA000OP-77"),
                (3, b"FR-UAV-9"),
                (4, &french_encode_degrees(48.8566).to_be_bytes()),
                (5, &french_encode_degrees(2.3522).to_be_bytes()),
                (6, &120i16.to_be_bytes()),
                (7, &50i16.to_be_bytes()),
                (8, &french_encode_degrees(48.85).to_be_bytes()),
                (9, &french_encode_degrees(2.35).to_be_bytes()),
                (10, &[9]),
                (11, &270i16.to_be_bytes()),
            ])],
        )
    }

    #[test]
    fn test_location_only_beacon() {
        let mut d = dispatcher(4);
        let frame = located_beacon(1);
        let slot = d.dispatch(&RawFrame::new(&frame, -55, 1.0));
        assert_eq!(slot, Some(SlotRef::Regular(0)));

        let entries = d.tracker().occupied();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.address, mac(1));
        assert!(e.dirty);
        assert_eq!(e.rssi, -55);
        assert!(e.uav_id.is_empty());
        assert!(e.operator_id.is_empty());
        let pos = e.position.unwrap();
        assert!((pos.lat - 51.5).abs() < 1e-6);
        assert_eq!(pos.altitude_msl_m, 100.0);
        assert_eq!(d.stats().odid_decodes, 1);
    }

    #[test]
    fn test_french_beacon() {
        let mut d = dispatcher(4);
        let frame = french_beacon(2, 1);
        d.dispatch(&RawFrame::new(&frame, -70, 5.0));

        let e = d.tracker().occupied()[0];
        assert_eq!(e.operator_id.to_string(), "OP-77");
        assert_eq!(e.uav_id.to_string(), "FR-UAV-9");
        let pos = e.position.unwrap();
        assert!((pos.lat - 48.8566).abs() < 1e-5);
        assert_eq!(pos.heading_deg, 270.0);
        assert_eq!(pos.speed_mps, 9.0);
        assert!(e.operator_location.is_some());
        assert_eq!(d.stats().french_elements, 1);
    }

    #[test]
    fn test_french_bad_version_leaves_no_slot() {
        let mut d = dispatcher(4);
        let frame = french_beacon(2, 9);
        assert_eq!(
            d.dispatch(&RawFrame::new(&frame, -70, 5.0)),
            Some(SlotRef::Regular(0))
        );
        // Version is the first tag, so nothing decoded and the slot is freed.
        assert!(d.tracker().occupied().is_empty());
        assert_eq!(d.stats().french_version_mismatches, 1);
    }

    #[test]
    fn test_plain_access_point_not_tracked() {
        let mut d = dispatcher(2);
        let frame = beacon_frame(mac(3), &[ssid_element(b"home")]);
        d.dispatch(&RawFrame::new(&frame, -40, 1.0));
        assert!(d.tracker().occupied().is_empty());
        assert_eq!(d.stats().beacons, 1);
    }

    #[test]
    fn test_other_frames_ignored() {
        let mut d = dispatcher(2);
        let mut frame = located_beacon(1);
        frame[0] = 0x40;
        assert_eq!(d.dispatch(&RawFrame::new(&frame, -40, 1.0)), None);
        assert_eq!(d.dispatch(&RawFrame::new(&[0x80, 0x00], -40, 1.0)), None);
        assert_eq!(d.stats().ignored, 2);
        assert!(d.tracker().occupied().is_empty());
    }

    #[test]
    fn test_nan_action_frame() {
        let mut d = dispatcher(4);
        let frame = nan_frame(
            mac(9),
            &nan_body(&pack(&[
                basic_id_msg(b"NAN-SERIAL"),
                operator_id_msg(b"NAN-OP"),
                location_msg(37.0, -122.0, 60.0, 20.0, 180.0, 6.0),
                system_msg(37.001, -122.001),
            ])),
        );
        d.dispatch(&RawFrame::new(&frame, -65, 2.0));

        let e = d.tracker().occupied()[0];
        assert_eq!(e.address, mac(9));
        assert_eq!(e.uav_id.to_string(), "NAN-SERIAL");
        assert_eq!(e.operator_id.to_string(), "NAN-OP");
        assert_eq!(e.position.unwrap().heading_deg, 180.0);
        assert!(e.operator_location.is_some());
        assert_eq!(d.stats().action_frames, 1);
    }

    #[test]
    fn test_undecodable_action_frame() {
        let mut d = dispatcher(4);
        let frame = nan_frame(mac(9), &[0x04, 0x09, 0x00]);
        d.dispatch(&RawFrame::new(&frame, -65, 2.0));
        assert!(d.tracker().occupied().is_empty());
        assert_eq!(d.stats().odid_failures, 1);
    }

    #[test]
    fn test_capacity_overflow() {
        let n = 3;
        let mut d = dispatcher(n);
        for i in 0..n as u8 {
            let frame = located_beacon(i + 1);
            assert_eq!(
                d.dispatch(&RawFrame::new(&frame, -50, 1.0)),
                Some(SlotRef::Regular(i as usize))
            );
        }
        let frame = located_beacon(n as u8 + 1);
        assert_eq!(
            d.dispatch(&RawFrame::new(&frame, -50, 1.0)),
            Some(SlotRef::Sentinel)
        );
        assert_eq!(d.tracker().occupied().len(), n);
        assert_eq!(d.stats().overflow, 1);

        let sentinel = d.tracker().sentinel();
        assert!(sentinel.is_free());
        assert!(sentinel.position.is_some());
    }

    #[test]
    fn test_sweep_frees_and_reuses_slot() {
        let mut d = dispatcher(2);
        d.dispatch(&RawFrame::new(&located_beacon(1), -50, 0.0));
        d.dispatch(&RawFrame::new(&located_beacon(2), -50, 250.0));

        assert_eq!(d.tracker().sweep(301.0), 1);
        let free = d.tracker().with_table(|t| t.get(SlotRef::Regular(0)).is_free());
        assert!(free);

        let slot = d.dispatch(&RawFrame::new(&located_beacon(3), -50, 302.0));
        assert_eq!(slot, Some(SlotRef::Regular(0)));
    }

    #[test]
    fn test_truncated_element_keeps_earlier_elements() {
        let mut frame = located_beacon(1);
        // Append a vendor element that claims more bytes than remain.
        frame.extend_from_slice(&[0xDD, 0x40, 0x6A, 0x5C, 0x35]);
        let mut d = dispatcher(2);
        d.dispatch(&RawFrame::new(&frame, -50, 1.0));
        assert!(d.tracker().occupied()[0].position.is_some());
    }

    #[test]
    fn test_identity_survives_later_location() {
        let mut d = dispatcher(2);
        let id_frame = beacon_frame(mac(1), &[odid_element(&basic_id_msg(b"STICKY"))]);
        d.dispatch(&RawFrame::new(&id_frame, -50, 1.0));
        d.dispatch(&RawFrame::new(&located_beacon(1), -52, 2.0));

        let e = d.tracker().occupied()[0];
        assert_eq!(e.uav_id.to_string(), "STICKY");
        assert!(e.position.is_some());
        assert_eq!(e.last_seen, 2.0);
        assert_eq!(e.rssi, -52);
    }

    #[test]
    fn test_discard_policy() {
        let frame = beacon_frame(
            mac(4),
            &[french_element(&[(3, b"BEFORE"), (1, &[2])])],
        );
        let mut keep = dispatcher(2);
        keep.dispatch(&RawFrame::new(&frame, -50, 1.0));
        assert_eq!(keep.tracker().occupied()[0].uav_id.to_string(), "BEFORE");

        let mut discard = dispatcher(2).french_policy(FrenchVersionPolicy::Discard);
        discard.dispatch(&RawFrame::new(&frame, -50, 1.0));
        assert!(discard.tracker().occupied().is_empty());
    }
}
