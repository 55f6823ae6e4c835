//! In-memory font model.
//!
//! A `MasterFont` is the unit handed through the preparation steps:
//! family naming, feature text, an order-preserving glyph set, and the
//! metadata block stamped onto every output. Cloning one gives the
//! isolated per-task copy the concurrency model relies on.

use std::{
    borrow::Borrow,
    fmt::{Display, Formatter},
    ops::Deref,
};

use indexmap::IndexMap;

use crate::config::PANOSE;

/// A glyph name, usable as a borrowed `str` key in maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphName(String);

impl GlyphName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for GlyphName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for GlyphName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for GlyphName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for GlyphName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlyphName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for GlyphName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One glyph record. The outline is opaque compiled data; this layer
/// never interprets geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub name: GlyphName,
    pub codepoint: Option<u32>,
    pub outline: Vec<u8>,
    pub width: u16,
}

impl Glyph {
    pub fn new(name: impl Into<GlyphName>, codepoint: Option<u32>) -> Self {
        Self {
            name: name.into(),
            codepoint,
            outline: Vec::new(),
            width: 0,
        }
    }
}

/// Glyph set keyed by name; iteration order is glyph order.
pub type GlyphSet = IndexMap<GlyphName, Glyph>;

/// One `gasp` range: rendering behavior up to and including a PPEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaspRange {
    pub max_ppem: u16,
    pub behavior: u16,
}

pub const GASP_GRIDFIT: u16 = 0x0001;
pub const GASP_DOGRAY: u16 = 0x0002;
pub const GASP_SYMMETRIC_GRIDFIT: u16 = 0x0004;
pub const GASP_SYMMETRIC_SMOOTHING: u16 = 0x0008;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

/// The metadata block stamped identically onto every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMetadata {
    pub version: String,
    pub vertical: VerticalMetrics,
    pub gasp: Vec<GaspRange>,
    pub panose: [u8; 10],
}

impl FontMetadata {
    /// The family-wide fixed metadata: 2048 UPM vertical metrics, the
    /// three-range gasp table, and the monospace PANOSE.
    pub fn family_defaults(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            vertical: VerticalMetrics {
                units_per_em: 2048,
                ascender: 1900,
                descender: -480,
                line_gap: 0,
            },
            gasp: vec![
                GaspRange { max_ppem: 9, behavior: GASP_DOGRAY | GASP_SYMMETRIC_SMOOTHING },
                GaspRange {
                    max_ppem: 50,
                    behavior: GASP_GRIDFIT
                        | GASP_DOGRAY
                        | GASP_SYMMETRIC_GRIDFIT
                        | GASP_SYMMETRIC_SMOOTHING,
                },
                GaspRange { max_ppem: 0xFFFF, behavior: GASP_DOGRAY | GASP_SYMMETRIC_SMOOTHING },
            ],
            panose: PANOSE,
        }
    }
}

/// A named, glyph-bearing source font as loaded from the design
/// sources. Mutated only through owned copies.
#[derive(Debug, Clone)]
pub struct MasterFont {
    pub family_name: String,
    pub style_name: String,
    pub style_map_family_name: Option<String>,
    /// OpenType feature-rule source text.
    pub features: String,
    pub glyphs: GlyphSet,
    pub metadata: FontMetadata,
}

impl MasterFont {
    pub fn new(family_name: impl Into<String>, style_name: impl Into<String>) -> Self {
        Self {
            family_name: family_name.into(),
            style_name: style_name.into(),
            style_map_family_name: None,
            features: String::new(),
            glyphs: GlyphSet::new(),
            metadata: FontMetadata::family_defaults(""),
        }
    }

    pub fn glyph_order(&self) -> impl Iterator<Item = &GlyphName> {
        self.glyphs.keys()
    }
}
