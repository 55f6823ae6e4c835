//! Donor glyph merging.
//!
//! The receiving font always wins: a donor glyph whose codepoint is
//! already mapped is skipped, and donor glyphs that do carry a
//! codepoint are inserted under a name derived from it, so repeated
//! merges with different donors never collide by name. Codeless donor
//! glyphs merge by name only when absent. No existing glyph is ever
//! overwritten, which also makes the merge idempotent.

use std::collections::HashSet;

use log::debug;

use crate::font::{GlyphName, GlyphSet, MasterFont};

/// AGL-style uniform name for a codepoint: `uniXXXX` inside the BMP,
/// `uXXXXXX` beyond it.
pub fn glyph_name_for_codepoint(codepoint: u32) -> GlyphName {
    if codepoint > 0xFFFF {
        GlyphName::new(format!("u{codepoint:06X}"))
    } else {
        GlyphName::new(format!("uni{codepoint:04X}"))
    }
}

/// Merge a donor glyph set into `font`. Skipped glyphs are not an
/// error condition.
pub fn merge_glyph_set(font: &mut MasterFont, donor: &GlyphSet) {
    let mut mapped: HashSet<u32> =
        font.glyphs.values().filter_map(|g| g.codepoint).collect();
    let mut added = 0usize;
    let mut skipped = 0usize;

    for (name, glyph) in donor {
        match glyph.codepoint {
            Some(codepoint) => {
                if mapped.contains(&codepoint) {
                    skipped += 1;
                    continue;
                }
                let new_name = glyph_name_for_codepoint(codepoint);
                if font.glyphs.contains_key(&new_name) {
                    skipped += 1;
                    continue;
                }
                let mut glyph = glyph.clone();
                glyph.name = new_name.clone();
                font.glyphs.insert(new_name, glyph);
                mapped.insert(codepoint);
                added += 1;
            }
            None => {
                if font.glyphs.contains_key(name) {
                    skipped += 1;
                } else {
                    font.glyphs.insert(name.clone(), glyph.clone());
                    added += 1;
                }
            }
        }
    }

    debug!("merged {added} donor glyphs into {} ({skipped} skipped)", font.family_name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Glyph;

    fn font_with(names: &[(&str, Option<u32>)]) -> MasterFont {
        let mut font = MasterFont::new("Cascadia Code", "Regular");
        for (name, codepoint) in names {
            let mut glyph = Glyph::new(*name, *codepoint);
            glyph.width = 1200;
            font.glyphs.insert(GlyphName::new(*name), glyph);
        }
        font
    }

    fn donor_with(names: &[(&str, Option<u32>)]) -> GlyphSet {
        font_with(names).glyphs
    }

    #[test]
    fn codepoint_names() {
        assert_eq!(glyph_name_for_codepoint(0xE0B0), "uniE0B0");
        assert_eq!(glyph_name_for_codepoint(0x1F600), "u01F600");
    }

    #[test]
    fn receiver_wins_on_codepoint_collision() {
        // Master {A, B, C} plus donor {B (same codepoint), D}: the
        // donor's B is skipped and its D lands under a derived name.
        let mut font = font_with(&[("A", Some(0x41)), ("B", Some(0x42)), ("C", Some(0x43))]);
        let original_b = font.glyphs.get("B").cloned();
        let donor = donor_with(&[("B.donor", Some(0x42)), ("D", Some(0x44))]);

        merge_glyph_set(&mut font, &donor);

        let names: Vec<_> = font.glyph_order().map(|n| n.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "uni0044"]);
        assert_eq!(font.glyphs.get("B").cloned(), original_b);
    }

    #[test]
    fn codeless_glyphs_merge_by_name() {
        let mut font = font_with(&[("A", Some(0x41)), ("A.alt", None)]);
        let donor = donor_with(&[("A.alt", None), ("B.alt", None)]);

        merge_glyph_set(&mut font, &donor);

        let names: Vec<_> = font.glyph_order().map(|n| n.as_str()).collect();
        assert_eq!(names, ["A", "A.alt", "B.alt"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut font = font_with(&[("A", Some(0x41))]);
        let donor = donor_with(&[("arrow", Some(0xE0B0)), ("arrow.alt", None)]);

        merge_glyph_set(&mut font, &donor);
        let after_once = font.glyphs.clone();
        merge_glyph_set(&mut font, &donor);

        assert_eq!(font.glyphs, after_once);
    }

    #[test]
    fn existing_glyphs_are_never_overwritten() {
        let mut font = font_with(&[("uniE0B0", Some(0xE0B0))]);
        let original = font.glyphs.get("uniE0B0").cloned();
        let mut donor = donor_with(&[("other", Some(0xE0B0))]);
        donor.get_mut("other").unwrap().width = 9;

        merge_glyph_set(&mut font, &donor);

        assert_eq!(font.glyphs.len(), 1);
        assert_eq!(font.glyphs.get("uniE0B0").cloned(), original);
    }

    #[test]
    fn resident_glyph_under_the_derived_name_wins() {
        // The receiver owns a codeless "uniE0B0"; a donor glyph with
        // codepoint 0xE0B0 would land under that exact name.
        let mut font = font_with(&[("uniE0B0", None)]);
        let resident = font.glyphs.get("uniE0B0").cloned();
        let mut donor = donor_with(&[("arrow", Some(0xE0B0))]);
        donor.get_mut("arrow").unwrap().width = 9;

        merge_glyph_set(&mut font, &donor);

        assert_eq!(font.glyphs.len(), 1);
        assert_eq!(font.glyphs.get("uniE0B0").cloned(), resident);
    }

    #[test]
    fn distinct_donors_never_collide_by_name() {
        let mut font = font_with(&[("A", Some(0x41))]);
        let first = donor_with(&[("branch", Some(0xE0A0))]);
        let second = donor_with(&[("lock", Some(0xE0A2))]);

        merge_glyph_set(&mut font, &first);
        merge_glyph_set(&mut font, &second);

        assert!(font.glyphs.contains_key("uniE0A0"));
        assert!(font.glyphs.contains_key("uniE0A2"));
    }
}
