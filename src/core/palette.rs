//! Cell color channel
//!
//! Exported data cells carry one of four fill colors. On import the fill alone
//! decides whether a cell may be written back, so the RGB values below are a
//! file-format constant: workbooks exported by earlier versions must keep
//! round-tripping.

use super::names::is_identity_field;
use crate::types::ResolvedSlot;

/// Fill for schedule summary (grand total) rows
pub const SUMMARY_RGB: u32 = 0xF2F2F2;

/// Fill for header rows
pub const HEADER_RGB: u32 = 0xBDD7EE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellColor {
    /// The element has no such attribute
    Unavailable,
    ReadOnly,
    /// Value comes from the element's type; editing changes every instance
    InheritedFromType,
    Editable,
}

impl CellColor {
    pub const ALL: [CellColor; 4] = [
        CellColor::Unavailable,
        CellColor::ReadOnly,
        CellColor::InheritedFromType,
        CellColor::Editable,
    ];

    pub const fn rgb(self) -> u32 {
        match self {
            CellColor::Unavailable => 0xD9D9D9,
            CellColor::ReadOnly => 0xF4CCCC,
            CellColor::InheritedFromType => 0xFFF2CC,
            CellColor::Editable => 0xD9EAD3,
        }
    }

    pub fn from_rgb(rgb: u32) -> Option<Self> {
        CellColor::ALL.into_iter().find(|c| c.rgb() == rgb & 0x00FF_FFFF)
    }

    /// Parse an "AARRGGBB" or "RRGGBB" string as stored in the workbook
    pub fn from_argb(argb: &str) -> Option<Self> {
        parse_argb(argb).and_then(CellColor::from_rgb)
    }

    /// Whether import may attempt a write for a cell with this color
    pub fn is_writable(self) -> bool {
        matches!(self, CellColor::InheritedFromType | CellColor::Editable)
    }

    pub fn label(self) -> &'static str {
        match self {
            CellColor::Unavailable => "Unavailable",
            CellColor::ReadOnly => "Read-only",
            CellColor::InheritedFromType => "Type parameter",
            CellColor::Editable => "Editable",
        }
    }

    pub fn meaning(self) -> &'static str {
        match self {
            CellColor::Unavailable => "The element does not have this parameter. Ignored on import.",
            CellColor::ReadOnly => "Read-only or identity parameter. Ignored on import.",
            CellColor::InheritedFromType => {
                "Stored on the element's type. Changing it affects every element of that type."
            }
            CellColor::Editable => "Instance parameter. Changes are written back on import.",
        }
    }
}

/// RGB part of an "AARRGGBB" / "RRGGBB" color string
pub fn parse_argb(argb: &str) -> Option<u32> {
    let hex = argb.trim().trim_start_matches('#');
    if hex.len() < 6 || !hex.is_ascii() {
        return None;
    }
    u32::from_str_radix(&hex[hex.len() - 6..], 16).ok()
}

/// Color for one data cell, in priority order: absent, identity field,
/// read-only slot, type-level slot, editable.
pub fn classify(name: &str, slot: Option<&ResolvedSlot>) -> CellColor {
    let Some(slot) = slot else {
        return CellColor::Unavailable;
    };
    if is_identity_field(name) || slot.read_only {
        CellColor::ReadOnly
    } else if slot.tier.is_type_level() {
        CellColor::InheritedFromType
    } else {
        CellColor::Editable
    }
}
