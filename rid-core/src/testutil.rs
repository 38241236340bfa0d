//! Byte-level builders for synthetic remote-ID frames used across tests.

use crate::odid::{MESSAGE_SIZE, NAN_SERVICE_ID};
use crate::types::MacAddr;

pub const NAN_DEST: MacAddr = [0x51, 0x6F, 0x9A, 0x01, 0x00, 0x00];

fn encode_alt(m: f64) -> [u8; 2] {
    (((m + 1000.0) / 0.5).round() as u16).to_le_bytes()
}

fn encode_deg(deg: f64) -> [u8; 4] {
    ((deg * 1e7).round() as i32).to_le_bytes()
}

pub fn basic_id_msg(id: &[u8]) -> [u8; MESSAGE_SIZE] {
    let mut msg = [0u8; MESSAGE_SIZE];
    msg[0] = 0x02;
    msg[1] = 0x12; // serial number, helicopter/multirotor
    msg[2..2 + id.len()].copy_from_slice(id);
    msg
}

pub fn location_msg(
    lat: f64,
    lon: f64,
    alt_geo: f64,
    height: f64,
    direction: f64,
    speed: f64,
) -> [u8; MESSAGE_SIZE] {
    let mut msg = [0u8; MESSAGE_SIZE];
    msg[0] = 0x12;
    let mut flags = 0x20; // airborne
    let mut dir = direction;
    if dir >= 180.0 {
        flags |= 0x02;
        dir -= 180.0;
    }
    msg[1] = flags;
    msg[2] = dir as u8;
    msg[3] = (speed / 0.25) as u8;
    msg[5..9].copy_from_slice(&encode_deg(lat));
    msg[9..13].copy_from_slice(&encode_deg(lon));
    msg[13..15].copy_from_slice(&encode_alt(alt_geo));
    msg[15..17].copy_from_slice(&encode_alt(alt_geo));
    msg[17..19].copy_from_slice(&encode_alt(height));
    msg
}

pub fn system_msg(op_lat: f64, op_lon: f64) -> [u8; MESSAGE_SIZE] {
    let mut msg = [0u8; MESSAGE_SIZE];
    msg[0] = 0x42;
    msg[1] = 0x01;
    msg[2..6].copy_from_slice(&encode_deg(op_lat));
    msg[6..10].copy_from_slice(&encode_deg(op_lon));
    msg[10..12].copy_from_slice(&1u16.to_le_bytes());
    msg
}

pub fn operator_id_msg(id: &[u8]) -> [u8; MESSAGE_SIZE] {
    let mut msg = [0u8; MESSAGE_SIZE];
    msg[0] = 0x52;
    msg[2..2 + id.len()].copy_from_slice(id);
    msg
}

pub fn pack(msgs: &[[u8; MESSAGE_SIZE]]) -> Vec<u8> {
    let mut out = vec![0xF2, MESSAGE_SIZE as u8, msgs.len() as u8];
    for m in msgs {
        out.extend_from_slice(m);
    }
    out
}

/// NAN service discovery body wrapping a message pack.
pub fn nan_body(pack: &[u8]) -> Vec<u8> {
    let info_len = 1 + pack.len();
    let attr_len = 6 + 4 + info_len;
    let mut out = vec![0x04, 0x09, 0x50, 0x6F, 0x9A, 0x13, 0x03];
    out.extend_from_slice(&(attr_len as u16).to_le_bytes());
    out.extend_from_slice(&NAN_SERVICE_ID);
    out.extend_from_slice(&[0x01, 0x00, 0x10, info_len as u8, 0x07]);
    out.extend_from_slice(pack);
    out
}

/// Full action frame: 24-byte header to the NAN address plus body.
pub fn nan_frame(src: MacAddr, body: &[u8]) -> Vec<u8> {
    let mut out = vec![0xD0, 0x00, 0x00, 0x00];
    out.extend_from_slice(&NAN_DEST);
    out.extend_from_slice(&src);
    out.extend_from_slice(&src);
    out.extend_from_slice(&[0x00, 0x00]);
    out.extend_from_slice(body);
    out
}

/// Beacon frame carrying the given (already encoded) elements.
pub fn beacon_frame(src: MacAddr, elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0x80, 0x00, 0x00, 0x00];
    out.extend_from_slice(&[0xFF; 6]);
    out.extend_from_slice(&src);
    out.extend_from_slice(&src);
    out.extend_from_slice(&[0x00, 0x00]);
    out.extend_from_slice(&[0u8; 8]); // timestamp
    out.extend_from_slice(&[0x64, 0x00, 0x01, 0x04]); // interval, capability
    for el in elements {
        out.extend_from_slice(el);
    }
    out
}

/// SSID element.
pub fn ssid_element(ssid: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00, ssid.len() as u8];
    out.extend_from_slice(ssid);
    out
}

/// Open-standard vendor element (OUI FA:0B:BC, type 0x0D, counter).
pub fn odid_element(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xDD, (5 + payload.len()) as u8, 0xFA, 0x0B, 0xBC, 0x0D, 0x01];
    out.extend_from_slice(payload);
    out
}

/// French vendor element built from (tag, value) pairs.
pub fn french_element(tlvs: &[(u8, &[u8])]) -> Vec<u8> {
    let mut body = vec![0x6A, 0x5C, 0x35, 0x01];
    for (tag, value) in tlvs {
        body.push(*tag);
        body.push(value.len() as u8);
        body.extend_from_slice(value);
    }
    let mut out = vec![0xDD, body.len() as u8];
    out.extend_from_slice(&body);
    out
}

pub fn mac(last: u8) -> MacAddr {
    [0x60, 0x60, 0x1F, 0x00, 0x00, last]
}
