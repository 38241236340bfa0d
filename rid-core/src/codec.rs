//! Fixed-point numeric decoding for remote-ID payloads.
//!
//! Both wire formats embed sized integers at known offsets:
//! - French dialect: big-endian, lat/lon in units of 1e-5 degree
//! - Open standard: little-endian, lat/lon in units of 1e-7 degree,
//!   altitudes as u16 half-meters offset by -1000 m
//!
//! All readers return `None` when the slice is too short rather than
//! reading out of range.

/// French dialect lat/lon scale (degrees per LSB).
pub const FRENCH_DEGREE_SCALE: f64 = 1e-5;

/// Open-standard lat/lon scale (degrees per LSB).
pub const ODID_DEGREE_SCALE: f64 = 1e-7;

/// Big-endian signed 16-bit integer from the first two bytes.
pub fn be_i16(data: &[u8]) -> Option<i16> {
    let bytes: [u8; 2] = data.get(..2)?.try_into().ok()?;
    Some(i16::from_be_bytes(bytes))
}

/// Big-endian signed 32-bit integer from the first four bytes.
pub fn be_i32(data: &[u8]) -> Option<i32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(i32::from_be_bytes(bytes))
}

/// Little-endian unsigned 16-bit integer from the first two bytes.
pub fn le_u16(data: &[u8]) -> Option<u16> {
    let bytes: [u8; 2] = data.get(..2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

/// Little-endian signed 32-bit integer from the first four bytes.
pub fn le_i32(data: &[u8]) -> Option<i32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(i32::from_le_bytes(bytes))
}

/// Little-endian unsigned 32-bit integer from the first four bytes.
pub fn le_u32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// French dialect degrees from a raw 1e-5 fixed-point value.
pub fn french_degrees(raw: i32) -> f64 {
    raw as f64 * FRENCH_DEGREE_SCALE
}

/// Open-standard degrees from a raw 1e-7 fixed-point value.
pub fn odid_degrees(raw: i32) -> f64 {
    raw as f64 * ODID_DEGREE_SCALE
}

/// Open-standard altitude: half-meter steps offset by -1000 m.
pub fn odid_altitude(raw: u16) -> f64 {
    raw as f64 * 0.5 - 1000.0
}

/// Inverse of [`french_degrees`], rounding to the nearest LSB.
pub fn french_encode_degrees(deg: f64) -> i32 {
    (deg / FRENCH_DEGREE_SCALE).round() as i32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_i16_sign() {
        assert_eq!(be_i16(&[0x00, 0x64]), Some(100));
        assert_eq!(be_i16(&[0xFF, 0x9C]), Some(-100));
        assert_eq!(be_i16(&[0x01]), None);
    }

    #[test]
    fn test_be_i32_sign() {
        assert_eq!(be_i32(&[0x00, 0x4E, 0x98, 0x14]), Some(5_150_740));
        assert_eq!(be_i32(&[0xFF, 0xFF, 0xD8, 0xF0]), Some(-10_000));
        assert_eq!(be_i32(&[0x00, 0x01, 0x02]), None);
    }

    #[test]
    fn test_be_ignores_trailing_bytes() {
        assert_eq!(be_i16(&[0x00, 0x5A, 0xFF, 0xFF]), Some(90));
    }

    #[test]
    fn test_le_readers() {
        assert_eq!(le_u16(&[0xD0, 0x07]), Some(2000));
        assert_eq!(le_i32(&[0x00, 0x00, 0x00, 0x80]), Some(i32::MIN));
        assert_eq!(le_u32(&[0x01, 0x00, 0x00, 0x00]), Some(1));
        assert_eq!(le_i32(&[0x01]), None);
    }

    #[test]
    fn test_french_degrees() {
        assert!((french_degrees(5_150_000) - 51.5).abs() < 1e-9);
        assert!((french_degrees(-10_000) + 0.1).abs() < 1e-9);
        assert_eq!(french_encode_degrees(51.5), 5_150_000);
        assert_eq!(french_encode_degrees(-0.1), -10_000);
    }

    #[test]
    fn test_odid_scales() {
        assert!((odid_degrees(515_000_000) - 51.5).abs() < 1e-9);
        assert_eq!(odid_altitude(2000), 0.0);
        assert_eq!(odid_altitude(2200), 100.0);
    }
}
