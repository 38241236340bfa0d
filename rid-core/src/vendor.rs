//! Vendor-specific information element classification.
//!
//! A vendor element (tag 0xDD) starts with a 3-byte organizationally unique
//! identifier. Exactly two dialects are recognized:
//! - French remote ID: OUI 6A:5C:35
//! - Open-standard remote ID over beacon: OUI FA:0B:BC or 90:3A:E6 (two
//!   registrations, treated identically)
//!
//! Matching is exact equality on all three bytes.

use crate::tlv::Tlv;

/// Information element tag for vendor-specific elements.
pub const VENDOR_ELEMENT_TAG: u8 = 0xDD;

/// French remote-ID organization identifier.
pub const FRENCH_OUI: [u8; 3] = [0x6A, 0x5C, 0x35];

/// Open-standard remote-ID organization identifiers.
pub const ODID_OUIS: [[u8; 3]; 2] = [[0xFA, 0x0B, 0xBC], [0x90, 0x3A, 0xE6]];

/// Recognized vendor element dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorKind {
    FrenchDialect,
    OpenStandard,
    Unrecognized,
}

/// A vendor element located inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorElement<'a> {
    pub oui: [u8; 3],
    /// Value bytes following the OUI.
    pub body: &'a [u8],
}

impl<'a> VendorElement<'a> {
    /// View a TLV triplet as a vendor element. `None` unless the tag is 0xDD
    /// and the value holds at least an OUI.
    pub fn from_tlv(tlv: &Tlv<'a>) -> Option<Self> {
        if tlv.tag != VENDOR_ELEMENT_TAG {
            return None;
        }
        let oui: [u8; 3] = tlv.value.get(..3)?.try_into().ok()?;
        Some(VendorElement {
            oui,
            body: &tlv.value[3..],
        })
    }

    pub fn kind(&self) -> VendorKind {
        classify_oui(&self.oui)
    }
}

/// Classify an organization identifier.
pub fn classify_oui(oui: &[u8; 3]) -> VendorKind {
    if *oui == FRENCH_OUI {
        VendorKind::FrenchDialect
    } else if ODID_OUIS.contains(oui) {
        VendorKind::OpenStandard
    } else {
        VendorKind::Unrecognized
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
