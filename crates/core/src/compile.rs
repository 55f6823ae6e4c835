//! The outline-compiler seam and compiled font binaries.
//!
//! Outline compilation (geometry, overlap removal, interpolation) is
//! an external collaborator behind [`OutlineCompiler`]. On this side
//! of the seam a compiled font is a glyph order plus raw tables, which
//! is all the hint transfer and table fix-up stages need.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use font_types::Tag;
use read_fonts::{FontRef, TableProvider, types::GlyphId16};
use write_fonts::FontBuilder;

use crate::{
    designspace::DesignDocument,
    font::{GlyphName, MasterFont},
    io::write_font,
};

pub const CVT_TAG: Tag = Tag::new(b"cvt ");
pub const CVAR_TAG: Tag = Tag::new(b"cvar");

/// Output flavor. TTF outputs go through the sequential hinting lane,
/// OTF outputs through the parallel one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ttf,
    Otf,
}

impl OutputFormat {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Ttf => "ttf",
            Self::Otf => "otf",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.dir_name()
    }
}

/// Compilation seam. Implementations own outline flattening and
/// binary assembly; tests substitute fakes.
pub trait OutlineCompiler: Sync {
    /// Compile prepared masters into one variable font.
    fn compile_variable(
        &self,
        document: &DesignDocument,
        masters: &[MasterFont],
    ) -> Result<CompiledFont>;

    /// Compile a single interpolated master into a static font.
    fn compile_static(&self, master: &MasterFont, format: OutputFormat) -> Result<CompiledFont>;
}

/// A compiled font: its glyph order and raw tables keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct CompiledFont {
    pub glyph_order: Vec<GlyphName>,
    pub tables: BTreeMap<Tag, Vec<u8>>,
}

impl CompiledFont {
    /// Lift glyph order and raw tables from font binary data.
    pub fn from_font_bytes(data: &[u8]) -> Result<Self> {
        let font = FontRef::new(data).context("Failed to parse font")?;
        let num_glyphs = font.maxp().context("Font has no maxp table")?.num_glyphs();
        let post = font.post().ok();

        let glyph_order = (0..num_glyphs)
            .map(|gid| {
                post.as_ref()
                    .and_then(|p| p.glyph_name(GlyphId16::new(gid)))
                    .map(GlyphName::from)
                    .unwrap_or_else(|| GlyphName::new(format!("glyph{gid:05}")))
            })
            .collect();

        let mut tables = BTreeMap::new();
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if let Some(table_data) = font.table_data(tag) {
                tables.insert(tag, table_data.as_bytes().to_vec());
            }
        }

        Ok(Self { glyph_order, tables })
    }

    pub fn insert_table(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    /// Number of entries in the control value table, zero if absent.
    pub fn control_value_count(&self) -> usize {
        self.tables.get(&CVT_TAG).map(|data| data.len() / 2).unwrap_or(0)
    }

    /// Assemble the binary from the raw tables.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut builder = FontBuilder::new();
        for (tag, data) in &self.tables {
            builder.add_raw(*tag, data.as_slice());
        }
        builder.build()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_font(path, self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use write_fonts::tables::post::Post;

    fn sample_font_bytes() -> Vec<u8> {
        // maxp 0.5 with two glyphs
        let maxp: &[u8] = &[0x00, 0x00, 0x50, 0x00, 0x00, 0x02];
        let post = Post::new_v2([".notdef", "A"]);
        let mut builder = FontBuilder::new();
        builder.add_raw(Tag::new(b"maxp"), maxp);
        builder.add_table(&post).unwrap();
        builder.add_raw(CVT_TAG, vec![0u8, 40, 0, 80]);
        builder.build()
    }

    #[test]
    fn lifts_glyph_order_and_tables() {
        let compiled = CompiledFont::from_font_bytes(&sample_font_bytes()).unwrap();
        let names: Vec<_> = compiled.glyph_order.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, [".notdef", "A"]);
        assert_eq!(compiled.control_value_count(), 2);
    }

    #[test]
    fn raw_tables_survive_reassembly() {
        let compiled = CompiledFont::from_font_bytes(&sample_font_bytes()).unwrap();
        let reparsed = CompiledFont::from_font_bytes(&compiled.to_bytes()).unwrap();
        assert_eq!(compiled.tables, reparsed.tables);
        assert_eq!(compiled.glyph_order, reparsed.glyph_order);
    }
}
