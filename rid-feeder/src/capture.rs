//! Capture file input for recorded 802.11 frames.
//!
//! One frame per line: `[timestamp] [rssi] HEX`. The timestamp is in
//! seconds, the RSSI in dBm. Blank lines and `#` comments are skipped.
//! A line without a timestamp is stamped at its line index × 1 ms; a line
//! without an RSSI reads as 0.

use std::fs;
use std::path::{Path, PathBuf};

use rid_core::types::{hex_decode, RidError};

/// Spacing applied to lines that carry no timestamp.
const DEFAULT_SPACING: f64 = 0.001;

/// One frame read from a capture file.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub timestamp: f64,
    pub rssi: i8,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Frame Reader
// ---------------------------------------------------------------------------

/// Read recorded frames from a file.
pub struct FrameReader {
    path: PathBuf,
}

impl FrameReader {
    pub fn new(path: &Path) -> Self {
        FrameReader {
            path: path.to_path_buf(),
        }
    }

    /// Read all frames from the file. Malformed lines are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<CapturedFrame>, RidError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(parse_capture(&content))
    }
}

/// Parse every line of a capture, skipping the ones that don't parse.
pub fn parse_capture(content: &str) -> Vec<CapturedFrame> {
    let mut frames = Vec::new();
    for (i, line) in content.lines().enumerate() {
        match parse_line(line, i) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => {}
            Err(e) => log::warn!("line {}: {e}", i + 1),
        }
    }
    frames
}

/// Parse one capture line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str, index: usize) -> Result<Option<CapturedFrame>, RidError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let (hex, prefix) = match fields.split_last() {
        Some((hex, prefix)) if prefix.len() <= 2 => (*hex, prefix),
        _ => return Err(RidError::Parse(format!("expected 1 to 3 fields: {line:?}"))),
    };

    let data = hex_decode(hex).ok_or_else(|| RidError::InvalidHex(hex.to_string()))?;

    let timestamp = match prefix.first() {
        Some(t) => match t.parse::<f64>() {
            Ok(ts) if ts.is_finite() => ts,
            _ => return Err(RidError::Parse(format!("timestamp {t:?}"))),
        },
        None => index as f64 * DEFAULT_SPACING,
    };
    let rssi = match prefix.get(1) {
        Some(r) => r
            .parse::<i8>()
            .map_err(|_| RidError::Parse(format!("rssi {r:?}")))?,
        None => 0,
    };

    Ok(Some(CapturedFrame {
        timestamp,
        rssi,
        data,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
