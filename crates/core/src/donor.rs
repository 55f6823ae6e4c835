//! Donor glyph sets lifted from compiled donor fonts.
//!
//! Powerline and symbol donors are supplied as finished font binaries.
//! This walks the character map, pulls the outline and advance for
//! each mapped glyph, and produces the glyph set the merger consumes.

use anyhow::{Context, Result};
use read_fonts::{
    FontRef, TableProvider,
    tables::cmap::{Cmap, CmapSubtable},
    types::{GlyphId, GlyphId16, Tag},
};

use crate::{
    font::{Glyph, GlyphSet},
    merge::glyph_name_for_codepoint,
};

/// Build a donor glyph set from font binary data.
pub fn glyph_set_from_font(data: &[u8]) -> Result<GlyphSet> {
    let font = FontRef::new(data).context("Failed to parse donor font")?;
    let cmap = font.cmap().context("Donor font has no cmap table")?;
    let post = font.post().ok();
    let hmtx = font.hmtx().ok();
    let loca = font.loca(None).ok();
    let glyf = font
        .table_data(Tag::new(b"glyf"))
        .map(|data| data.as_bytes().to_vec())
        .unwrap_or_default();

    let mut set = GlyphSet::new();
    for (codepoint, gid) in extract_mappings(&cmap) {
        let name = post
            .as_ref()
            .and_then(|p| p.glyph_name(GlyphId16::new(gid)))
            .map(Into::into)
            .unwrap_or_else(|| glyph_name_for_codepoint(codepoint));
        if set.contains_key(&name) {
            continue;
        }

        let width = hmtx
            .as_ref()
            .and_then(|h| h.advance(GlyphId::new(gid as u32)))
            .unwrap_or(0);
        let outline = loca
            .as_ref()
            .and_then(|loca| {
                let start = loca.get_raw(gid as usize)? as usize;
                let end = loca.get_raw(gid as usize + 1)? as usize;
                glyf.get(start..end).map(<[u8]>::to_vec)
            })
            .unwrap_or_default();

        set.insert(
            name.clone(),
            Glyph { name, codepoint: Some(codepoint), outline, width },
        );
    }

    Ok(set)
}

/// All (codepoint, glyph id) pairs from the best available subtable:
/// format 12 when present, format 4 otherwise.
fn extract_mappings(cmap: &Cmap) -> Vec<(u32, u16)> {
    let records = cmap.encoding_records();

    for record in records.iter() {
        if let Ok(CmapSubtable::Format12(f12)) = record.subtable(cmap.offset_data()) {
            return extract_from_format12(&f12);
        }
    }

    for record in records.iter() {
        if let Ok(CmapSubtable::Format4(f4)) = record.subtable(cmap.offset_data()) {
            return extract_from_format4(&f4);
        }
    }

    Vec::new()
}

fn extract_from_format12(f12: &read_fonts::tables::cmap::Cmap12) -> Vec<(u32, u16)> {
    let mut mappings = Vec::new();
    for group in f12.groups() {
        let start = group.start_char_code();
        let end = group.end_char_code();
        let mut gid = group.start_glyph_id();
        for cp in start..=end {
            // Ids beyond the u16 glyph space cannot exist in a valid
            // font; skip rather than truncate.
            match u16::try_from(gid) {
                Ok(gid) if gid != 0 => mappings.push((cp, gid)),
                _ => {}
            }
            gid += 1;
        }
    }
    mappings
}

fn extract_from_format4(f4: &read_fonts::tables::cmap::Cmap4) -> Vec<(u32, u16)> {
    let mut mappings = Vec::new();

    let end_codes = f4.end_code();
    let start_codes = f4.start_code();
    let id_deltas = f4.id_delta();
    let id_range_offsets = f4.id_range_offsets();
    let glyph_id_array = f4.glyph_id_array();

    let seg_count = f4.seg_count_x2() as usize / 2;
    for seg in 0..seg_count {
        let end_code = end_codes.get(seg).map(|v| v.get()).unwrap_or(0xFFFF);
        let start_code = start_codes.get(seg).map(|v| v.get()).unwrap_or(0);
        let id_delta = id_deltas.get(seg).map(|v| v.get()).unwrap_or(0);
        let id_range_offset = id_range_offsets.get(seg).map(|v| v.get()).unwrap_or(0);

        if start_code == 0xFFFF {
            continue;
        }

        for cp in start_code..=end_code {
            let gid = if id_range_offset == 0 {
                ((cp as i32 + id_delta as i32) & 0xFFFF) as u16
            } else {
                // A malformed idRangeOffset can point before the glyph
                // id array; such entries are unmapped, not a panic.
                let glyph_idx = (id_range_offset as usize / 2)
                    .checked_add((cp - start_code) as usize)
                    .and_then(|idx| idx.checked_sub(seg_count - seg));
                match glyph_idx.and_then(|idx| glyph_id_array.get(idx)) {
                    Some(gid) if gid.get() != 0 => {
                        ((gid.get() as i32 + id_delta as i32) & 0xFFFF) as u16
                    }
                    _ => 0,
                }
            };

            if gid != 0 {
                mappings.push((cp as u32, gid));
            }
        }
    }
    mappings
}

#[cfg(test)]
mod tests {
    use read_fonts::{FontData, FontRead};

    use super::*;

    fn push_u16(bytes: &mut Vec<u8>, value: u16) {
        bytes.extend_from_slice(&value.to_be_bytes());
    }

    fn push_u32(bytes: &mut Vec<u8>, value: u32) {
        bytes.extend_from_slice(&value.to_be_bytes());
    }

    fn cmap_with_subtable(encoding_id: u16, subtable: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        push_u16(&mut bytes, 0); // version
        push_u16(&mut bytes, 1); // numTables
        push_u16(&mut bytes, 3); // platform: Windows
        push_u16(&mut bytes, encoding_id);
        push_u32(&mut bytes, 12); // subtable offset
        bytes.extend_from_slice(subtable);
        bytes
    }

    #[test]
    fn format12_skips_glyph_ids_beyond_u16() {
        let mut sub = Vec::new();
        push_u16(&mut sub, 12); // format
        push_u16(&mut sub, 0); // reserved
        push_u32(&mut sub, 28); // length
        push_u32(&mut sub, 0); // language
        push_u32(&mut sub, 1); // numGroups
        push_u32(&mut sub, 0xE0B0); // startCharCode
        push_u32(&mut sub, 0xE0B2); // endCharCode
        push_u32(&mut sub, 0xFFFF); // startGlyphId

        let bytes = cmap_with_subtable(10, &sub);
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();

        // The second and third ids in the group run past 0xFFFF and
        // must be dropped, not wrapped into unrelated glyphs.
        assert_eq!(extract_mappings(&cmap), vec![(0xE0B0, 0xFFFF)]);
    }

    #[test]
    fn format4_tolerates_range_offset_before_glyph_id_array() {
        let mut sub = Vec::new();
        push_u16(&mut sub, 4); // format
        push_u16(&mut sub, 34); // length
        push_u16(&mut sub, 0); // language
        push_u16(&mut sub, 4); // segCountX2
        push_u16(&mut sub, 4); // searchRange
        push_u16(&mut sub, 1); // entrySelector
        push_u16(&mut sub, 0); // rangeShift
        push_u16(&mut sub, 0x42); // endCode[0]
        push_u16(&mut sub, 0xFFFF); // endCode[1]
        push_u16(&mut sub, 0); // reservedPad
        push_u16(&mut sub, 0x41); // startCode[0]
        push_u16(&mut sub, 0xFFFF); // startCode[1]
        push_u16(&mut sub, 0); // idDelta[0]
        push_u16(&mut sub, 1); // idDelta[1]
        push_u16(&mut sub, 2); // idRangeOffset[0]
        push_u16(&mut sub, 0); // idRangeOffset[1]
        push_u16(&mut sub, 7); // glyphIdArray[0]

        let bytes = cmap_with_subtable(1, &sub);
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();

        // For U+0041 the offset points before the glyph id array; that
        // codepoint stays unmapped while the rest of the segment maps.
        assert_eq!(extract_mappings(&cmap), vec![(0x42, 7)]);
    }
}
