//! Decode the French remote-ID vendor element.
//!
//! Layout of the element body (after the OUI):
//! - 1 byte vendor type
//! - nested TLVs, tags 1-11:
//!   - 1:  protocol version (must be 1)
//!   - 2:  operator id, 6-byte prefix then the id
//!   - 3:  UAV id
//!   - 4/5: aircraft lat/lon, i32 BE, 1e-5 degree
//!   - 6/7: altitude MSL / height above takeoff, i16 BE, meters
//!   - 8/9: operator lat/lon, i32 BE, 1e-5 degree
//!   - 10: horizontal speed, u8, m/s
//!   - 11: heading, i16 BE, degrees
//!
//! Unknown tags are skipped. A wrong version aborts the walk; what happens
//! to tags already decoded is governed by [`FrenchVersionPolicy`].

use serde::{Deserialize, Serialize};

use crate::codec::{be_i16, be_i32, french_degrees};
use crate::tlv::TlvIter;
use crate::types::{DecodedFields, IdString, OperatorLocation, Position};
use crate::vendor::VendorElement;

/// Expected value of the version tag.
pub const FRENCH_PROTOCOL_VERSION: u8 = 1;

/// Bytes skipped at the start of the operator id tag.
const OPERATOR_ID_PREFIX: usize = 6;

const TAG_VERSION: u8 = 1;
const TAG_OPERATOR_ID: u8 = 2;
const TAG_UAV_ID: u8 = 3;
const TAG_LAT: u8 = 4;
const TAG_LON: u8 = 5;
const TAG_ALT_MSL: u8 = 6;
const TAG_HEIGHT: u8 = 7;
const TAG_BASE_LAT: u8 = 8;
const TAG_BASE_LON: u8 = 9;
const TAG_SPEED: u8 = 10;
const TAG_HEADING: u8 = 11;

/// What to do with fields decoded before a failing version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrenchVersionPolicy {
    /// Merge every tag seen before the version check failed.
    #[default]
    KeepPartial,
    /// Drop the whole element.
    Discard,
}

/// Result of decoding one French element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrenchDecode {
    pub fields: DecodedFields,
    /// The version tag was present and wrong.
    pub version_mismatch: bool,
}

/// Raw values collected while walking; converted once at the end.
#[derive(Default)]
struct Collected {
    operator_id: Option<IdString>,
    uav_id: Option<IdString>,
    lat: Option<i32>,
    lon: Option<i32>,
    alt_msl: Option<i16>,
    height: Option<i16>,
    base_lat: Option<i32>,
    base_lon: Option<i32>,
    speed: Option<u8>,
    heading: Option<i16>,
}

impl Collected {
    fn into_fields(self) -> DecodedFields {
        let position = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Position {
                lat: french_degrees(lat),
                lon: french_degrees(lon),
                altitude_msl_m: self.alt_msl.unwrap_or(0) as f64,
                height_agl_m: self.height.unwrap_or(0) as f64,
                speed_mps: self.speed.unwrap_or(0) as f64,
                heading_deg: self.heading.unwrap_or(0) as f64,
            }),
            _ => None,
        };
        let operator_location = match (self.base_lat, self.base_lon) {
            (Some(lat), Some(lon)) => Some(OperatorLocation {
                lat: french_degrees(lat),
                lon: french_degrees(lon),
            }),
            _ => None,
        };
        DecodedFields {
            operator_id: self.operator_id,
            uav_id: self.uav_id,
            position,
            operator_location,
        }
    }
}

/// Decode a vendor element already classified as French.
pub fn decode_french(element: &VendorElement, policy: FrenchVersionPolicy) -> FrenchDecode {
    // First body byte is the vendor type; TLVs follow.
    let mut c = Collected::default();
    let mut version_mismatch = false;

    for tlv in TlvIter::new(element.body, 1, element.body.len()) {
        let v = tlv.value;
        match tlv.tag {
            TAG_VERSION => {
                if v.first() != Some(&FRENCH_PROTOCOL_VERSION) {
                    log::debug!("French element version {:?} rejected", v.first());
                    version_mismatch = true;
                    break;
                }
            }
            TAG_OPERATOR_ID => {
                if let Some(id) = v.get(OPERATOR_ID_PREFIX..) {
                    c.operator_id = Some(IdString::from_bytes(id));
                }
            }
            TAG_UAV_ID => c.uav_id = Some(IdString::from_bytes(v)),
            TAG_LAT => c.lat = be_i32(v).or(c.lat),
            TAG_LON => c.lon = be_i32(v).or(c.lon),
            TAG_ALT_MSL => c.alt_msl = be_i16(v).or(c.alt_msl),
            TAG_HEIGHT => c.height = be_i16(v).or(c.height),
            TAG_BASE_LAT => c.base_lat = be_i32(v).or(c.base_lat),
            TAG_BASE_LON => c.base_lon = be_i32(v).or(c.base_lon),
            TAG_SPEED => c.speed = v.first().copied().or(c.speed),
            TAG_HEADING => c.heading = be_i16(v).or(c.heading),
            _ => {}
        }
    }

    if version_mismatch && policy == FrenchVersionPolicy::Discard {
        return FrenchDecode {
            fields: DecodedFields::default(),
            version_mismatch,
        };
    }

    FrenchDecode {
        fields: c.into_fields(),
        version_mismatch,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
