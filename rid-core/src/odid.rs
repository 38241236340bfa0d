//! Open-standard remote-ID message decoding (ASTM F3411 / ASD-STAN 4709-002).
//!
//! Every message is 25 bytes. The first byte carries the message type in
//! the high nibble and the protocol version in the low nibble:
//! - 0x0: Basic ID (UAS serial / registration)
//! - 0x1: Location/vector
//! - 0x2: Authentication (ignored)
//! - 0x3: Self ID (free text)
//! - 0x4: System (operator location, area)
//! - 0x5: Operator ID
//! - 0xF: Message pack (up to 9 messages, one per 25-byte slot)
//!
//! Multi-byte fields are little-endian. Over WiFi the messages arrive either
//! inside a beacon vendor element or inside a NAN service discovery action
//! frame; the [`OdidDecoder`] trait covers both entry points.

use crate::codec::{le_i32, le_u16, le_u32, odid_altitude, odid_degrees};
use crate::types::{IdString, MacAddr, RidError, Result};

/// Size of one encoded message.
pub const MESSAGE_SIZE: usize = 25;

/// Maximum number of messages in a pack.
pub const MAX_PACK_MESSAGES: usize = 9;

/// Size of the pack header (type, single message size, count).
const PACK_HEADER: usize = 3;

/// Size of a self-ID description.
pub const SELF_ID_DESC_SIZE: usize = 23;

// NAN service discovery framing, offsets relative to the action frame body.
const NAN_CATEGORY_PUBLIC: u8 = 0x04;
const NAN_ACTION_VENDOR: u8 = 0x09;
const NAN_WFA_OUI: [u8; 3] = [0x50, 0x6F, 0x9A];
const NAN_OUI_TYPE: u8 = 0x13;
const NAN_ATTR_SERVICE_DESCRIPTOR: u8 = 0x03;
/// First 6 bytes of SHA-256("org.opendroneid.remoteid").
pub const NAN_SERVICE_ID: [u8; 6] = [0x88, 0x69, 0x19, 0x9D, 0x92, 0x09];
const NAN_ATTR_OFFSET: usize = 6;
const NAN_SERVICE_INFO_OFFSET: usize = NAN_ATTR_OFFSET + 13;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    BasicId,
    Location,
    Auth,
    SelfId,
    System,
    OperatorId,
    MessagePack,
}

impl MessageType {
    pub fn from_header(header: u8) -> Option<Self> {
        match header >> 4 {
            0x0 => Some(Self::BasicId),
            0x1 => Some(Self::Location),
            0x2 => Some(Self::Auth),
            0x3 => Some(Self::SelfId),
            0x4 => Some(Self::System),
            0x5 => Some(Self::OperatorId),
            0xF => Some(Self::MessagePack),
            _ => None,
        }
    }
}

/// Basic ID message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicId {
    /// 0 none, 1 serial number, 2 CAA registration, 3 UTM, 4 specific session.
    pub id_type: u8,
    pub ua_type: u8,
    pub uas_id: IdString,
}

/// Location/vector message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub status: u8,
    pub direction_deg: f64,
    pub speed_horizontal_mps: f64,
    pub speed_vertical_mps: f64,
    pub lat: f64,
    pub lon: f64,
    pub altitude_baro_m: f64,
    pub altitude_geo_m: f64,
    /// 0 above takeoff, 1 above ground.
    pub height_type: u8,
    pub height_m: f64,
    /// Tenths of seconds since the hour.
    pub timestamp: u16,
}

/// Self ID message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfId {
    pub desc_type: u8,
    pub description: [u8; SELF_ID_DESC_SIZE],
}

impl SelfId {
    /// Description up to the first NUL.
    pub fn description(&self) -> String {
        let end = self
            .description
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SELF_ID_DESC_SIZE);
        String::from_utf8_lossy(&self.description[..end]).into_owned()
    }
}

/// System message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System {
    pub operator_location_type: u8,
    pub operator_lat: f64,
    pub operator_lon: f64,
    pub area_count: u16,
    pub area_radius_m: u16,
    pub area_ceiling_m: f64,
    pub area_floor_m: f64,
    pub operator_altitude_m: f64,
    /// Seconds since 2019-01-01T00:00:00Z.
    pub timestamp: u32,
}

/// Operator ID message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorId {
    pub id_type: u8,
    pub operator_id: IdString,
}

/// Everything decoded from one element or action frame.
///
/// Each sub-message is independently present; `None` means not received
/// (or not valid) in this payload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UasData {
    pub basic_id: Option<BasicId>,
    pub location: Option<Location>,
    pub self_id: Option<SelfId>,
    pub system: Option<System>,
    pub operator_id: Option<OperatorId>,
}

impl UasData {
    pub fn is_empty(&self) -> bool {
        self.basic_id.is_none()
            && self.location.is_none()
            && self.self_id.is_none()
            && self.system.is_none()
            && self.operator_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Decoder seam
// ---------------------------------------------------------------------------

/// Open-standard decoding collaborator.
pub trait OdidDecoder: Send + Sync {
    /// Decode the message (or message pack) carried by a beacon vendor
    /// element. `data` starts at the first message header byte.
    fn decode_element(&self, data: &[u8]) -> Result<UasData>;

    /// Decode a NAN action frame body (everything after the 24-byte MAC
    /// header) sent by `source`, reassembling its message pack.
    fn decode_action_frame(&self, source: &MacAddr, body: &[u8]) -> Result<UasData>;
}

/// Built-in decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDroneId;

impl OdidDecoder for OpenDroneId {
    fn decode_element(&self, data: &[u8]) -> Result<UasData> {
        let header = *data.first().ok_or(RidError::Truncated {
            needed: MESSAGE_SIZE,
            available: 0,
        })?;
        let mut uas = UasData::default();
        if MessageType::from_header(header) == Some(MessageType::MessagePack) {
            decode_pack(data, &mut uas)?;
        } else {
            decode_message(data, &mut uas)?;
        }
        Ok(uas)
    }

    fn decode_action_frame(&self, source: &MacAddr, body: &[u8]) -> Result<UasData> {
        let pack = nan_service_info(body)?;
        let mut uas = UasData::default();
        decode_pack(pack, &mut uas)?;
        log::trace!(
            "NAN pack from {}: {} bytes",
            crate::types::mac_to_string(source),
            pack.len()
        );
        Ok(uas)
    }
}

/// Locate the message pack inside a NAN service discovery frame body.
fn nan_service_info(body: &[u8]) -> Result<&[u8]> {
    let invalid = RidError::InvalidActionFrame;

    if body.len() < NAN_SERVICE_INFO_OFFSET + 1 {
        return Err(invalid("body shorter than service descriptor"));
    }
    if body[0] != NAN_CATEGORY_PUBLIC || body[1] != NAN_ACTION_VENDOR {
        return Err(invalid("not a public vendor action"));
    }
    if body[2..5] != NAN_WFA_OUI || body[5] != NAN_OUI_TYPE {
        return Err(invalid("not a NAN frame"));
    }

    let attr = &body[NAN_ATTR_OFFSET..];
    if attr[0] != NAN_ATTR_SERVICE_DESCRIPTOR {
        return Err(invalid("first attribute is not a service descriptor"));
    }
    let attr_len = le_u16(&attr[1..]).unwrap_or(0) as usize;
    if 3 + attr_len > attr.len() {
        return Err(invalid("service descriptor overruns frame"));
    }
    if attr[3..9] != NAN_SERVICE_ID {
        return Err(invalid("service id is not remote ID"));
    }

    let info_len = attr[12] as usize;
    let info_end = NAN_SERVICE_INFO_OFFSET + info_len;
    if info_len < 1 || info_end > body.len() {
        return Err(invalid("service info overruns frame"));
    }
    // Skip the 1-byte message counter.
    Ok(&body[NAN_SERVICE_INFO_OFFSET + 1..info_end])
}

/// Decode a message pack into `uas`.
pub fn decode_pack(data: &[u8], uas: &mut UasData) -> Result<()> {
    if data.len() < PACK_HEADER {
        return Err(RidError::Truncated {
            needed: PACK_HEADER,
            available: data.len(),
        });
    }
    if MessageType::from_header(data[0]) != Some(MessageType::MessagePack) {
        return Err(RidError::InvalidMessagePack("header is not a pack"));
    }
    if data[1] as usize != MESSAGE_SIZE {
        return Err(RidError::InvalidMessagePack("single message size is not 25"));
    }
    let count = data[2] as usize;
    if count == 0 || count > MAX_PACK_MESSAGES {
        return Err(RidError::InvalidMessagePack("message count outside 1..=9"));
    }
    let needed = PACK_HEADER + count * MESSAGE_SIZE;
    if data.len() < needed {
        return Err(RidError::Truncated {
            needed,
            available: data.len(),
        });
    }

    for msg in data[PACK_HEADER..needed].chunks_exact(MESSAGE_SIZE) {
        if MessageType::from_header(msg[0]) == Some(MessageType::MessagePack) {
            return Err(RidError::InvalidMessagePack("nested pack"));
        }
        // One bad message does not spoil its siblings.
        if let Err(e) = decode_message(msg, uas) {
            log::debug!("skipping pack message: {e}");
        }
    }
    Ok(())
}

/// Decode one 25-byte message into the matching field of `uas`.
pub fn decode_message(msg: &[u8], uas: &mut UasData) -> Result<()> {
    if msg.len() < MESSAGE_SIZE {
        return Err(RidError::Truncated {
            needed: MESSAGE_SIZE,
            available: msg.len(),
        });
    }
    let msg = &msg[..MESSAGE_SIZE];
    match MessageType::from_header(msg[0]) {
        Some(MessageType::BasicId) => uas.basic_id = Some(decode_basic_id(msg)),
        Some(MessageType::Location) => uas.location = Some(decode_location(msg)?),
        Some(MessageType::Auth) => {}
        Some(MessageType::SelfId) => uas.self_id = Some(decode_self_id(msg)),
        Some(MessageType::System) => uas.system = Some(decode_system(msg)?),
        Some(MessageType::OperatorId) => uas.operator_id = Some(decode_operator_id(msg)),
        Some(MessageType::MessagePack) => {
            return Err(RidError::InvalidMessagePack(
                "pack where a single message was expected",
            ))
        }
        None => return Err(RidError::UnknownMessageType(msg[0] >> 4)),
    }
    Ok(())
}

fn decode_basic_id(msg: &[u8]) -> BasicId {
    BasicId {
        id_type: msg[1] >> 4,
        ua_type: msg[1] & 0x0F,
        uas_id: IdString::from_padded(&msg[2..22]),
    }
}

fn decode_location(msg: &[u8]) -> Result<Location> {
    let flags = msg[1];
    let ew_segment = (flags >> 1) & 1 == 1;
    let speed_mult = flags & 1 == 1;

    let direction_deg = msg[2] as f64 + if ew_segment { 180.0 } else { 0.0 };
    let speed_horizontal_mps = if speed_mult {
        msg[3] as f64 * 0.75 + 255.0 * 0.25
    } else {
        msg[3] as f64 * 0.25
    };

    let (lat, lon) = read_lat_lon(&msg[5..13])?;

    Ok(Location {
        status: flags >> 4,
        direction_deg,
        speed_horizontal_mps,
        speed_vertical_mps: (msg[4] as i8) as f64 * 0.5,
        lat,
        lon,
        altitude_baro_m: odid_altitude(le_u16(&msg[13..]).unwrap_or(0)),
        altitude_geo_m: odid_altitude(le_u16(&msg[15..]).unwrap_or(0)),
        height_type: (flags >> 2) & 1,
        height_m: odid_altitude(le_u16(&msg[17..]).unwrap_or(0)),
        timestamp: le_u16(&msg[21..]).unwrap_or(0),
    })
}

fn decode_self_id(msg: &[u8]) -> SelfId {
    let mut description = [0u8; SELF_ID_DESC_SIZE];
    description.copy_from_slice(&msg[2..2 + SELF_ID_DESC_SIZE]);
    SelfId {
        desc_type: msg[1],
        description,
    }
}

fn decode_system(msg: &[u8]) -> Result<System> {
    let (operator_lat, operator_lon) = read_lat_lon(&msg[2..10])?;
    Ok(System {
        operator_location_type: msg[1] & 0x03,
        operator_lat,
        operator_lon,
        area_count: le_u16(&msg[10..]).unwrap_or(0),
        area_radius_m: msg[12] as u16 * 10,
        area_ceiling_m: odid_altitude(le_u16(&msg[13..]).unwrap_or(0)),
        area_floor_m: odid_altitude(le_u16(&msg[15..]).unwrap_or(0)),
        operator_altitude_m: odid_altitude(le_u16(&msg[18..]).unwrap_or(0)),
        timestamp: le_u32(&msg[20..]).unwrap_or(0),
    })
}

fn decode_operator_id(msg: &[u8]) -> OperatorId {
    OperatorId {
        id_type: msg[1],
        operator_id: IdString::from_padded(&msg[2..22]),
    }
}

/// Read and range-check an 8-byte lat/lon pair.
fn read_lat_lon(data: &[u8]) -> Result<(f64, f64)> {
    let lat = odid_degrees(le_i32(data).unwrap_or(0));
    let lon = odid_degrees(le_i32(&data[4..]).unwrap_or(0));
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(RidError::OutOfRange("latitude/longitude"));
    }
    Ok((lat, lon))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
