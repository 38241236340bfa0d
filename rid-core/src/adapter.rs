//! Map open-standard decoder output onto tracked-entry fields.
//!
//! Only sub-messages the decoder reported are copied; anything else stays
//! absent so the tracked entry keeps its previous values. A decoder error
//! means the whole payload contributes nothing.

use crate::odid::{OdidDecoder, UasData};
use crate::types::{DecodedFields, MacAddr, OperatorLocation, Position};
use crate::vendor::VendorElement;

/// Offset of the first message within a beacon element body (after the
/// OUI type byte and the message counter).
const ELEMENT_MESSAGE_OFFSET: usize = 2;

/// Convert a decoded record into field updates.
pub fn map_uas(uas: &UasData) -> DecodedFields {
    let mut fields = DecodedFields::default();

    if let Some(basic) = &uas.basic_id {
        if !basic.uas_id.is_empty() {
            fields.uav_id = Some(basic.uas_id);
        }
    }
    if let Some(op) = &uas.operator_id {
        if !op.operator_id.is_empty() {
            fields.operator_id = Some(op.operator_id);
        }
    }
    if let Some(loc) = &uas.location {
        fields.position = Some(Position {
            lat: loc.lat,
            lon: loc.lon,
            altitude_msl_m: loc.altitude_geo_m,
            height_agl_m: loc.height_m,
            speed_mps: loc.speed_horizontal_mps,
            heading_deg: loc.direction_deg,
        });
    }
    if let Some(sys) = &uas.system {
        fields.operator_location = Some(OperatorLocation {
            lat: sys.operator_lat,
            lon: sys.operator_lon,
        });
    }

    fields
}

/// Decode an open-standard beacon vendor element.
///
/// Returns `None` when the decoder rejects the payload.
pub fn decode_beacon_element(
    decoder: &dyn OdidDecoder,
    element: &VendorElement,
) -> Option<DecodedFields> {
    let payload = element.body.get(ELEMENT_MESSAGE_OFFSET..)?;
    match decoder.decode_element(payload) {
        Ok(uas) => Some(map_uas(&uas)),
        Err(e) => {
            log::debug!("open-standard beacon element rejected: {e}");
            None
        }
    }
}

/// Decode a NAN action frame body from `source`.
///
/// Returns `None` when the decoder rejects the payload.
pub fn decode_action_frame(
    decoder: &dyn OdidDecoder,
    source: &MacAddr,
    body: &[u8],
) -> Option<DecodedFields> {
    match decoder.decode_action_frame(source, body) {
        Ok(uas) => Some(map_uas(&uas)),
        Err(e) => {
            log::debug!("open-standard action frame rejected: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
