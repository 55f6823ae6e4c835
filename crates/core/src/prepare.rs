//! Per-variant font preparation.
//!
//! `FontPreparer` turns a freshly loaded master into the variant's
//! master through four steps in a fixed order: feature-text selection,
//! family renaming, donor merges, metadata stamp. The metadata stamp
//! comes last so no earlier step can disturb it. Each step takes the
//! font by value and returns a new one; a preparer never touches a
//! master shared with another in-flight task.

use crate::{
    config::CODE_FAMILY,
    font::{FontMetadata, GlyphSet, MasterFont},
    merge::merge_glyph_set,
    variants::Variant,
};

/// Feature texts and donor glyph sets shared by every variant build.
#[derive(Debug, Clone, Default)]
pub struct PrepareSources {
    /// Feature text for the ligature (Code) variants.
    pub code_features: String,
    /// Feature text for the no-ligature (Mono) variants.
    pub mono_features: String,
    /// Contextual-rule block spliced in for PL/NF variants.
    pub decoration_features: Option<String>,
    pub powerline_donor: GlyphSet,
    pub symbol_donors: Vec<GlyphSet>,
}

pub struct FontPreparer {
    sources: PrepareSources,
    metadata: FontMetadata,
}

impl FontPreparer {
    pub fn new(sources: PrepareSources, metadata: FontMetadata) -> Self {
        Self { sources, metadata }
    }

    pub fn prepare(&self, font: MasterFont, variant: &Variant) -> MasterFont {
        let font = self.select_features(font, variant);
        let font = rename_family(font, variant);
        let font = self.merge_donors(font, variant);
        self.stamp_metadata(font)
    }

    fn select_features(&self, mut font: MasterFont, variant: &Variant) -> MasterFont {
        let base = if variant.flags.mono {
            &self.sources.mono_features
        } else {
            &self.sources.code_features
        };
        let mut features = base.clone();
        if variant.flags.powerline || variant.flags.nerd_font {
            if let Some(block) = &self.sources.decoration_features {
                if !features.is_empty() && !features.ends_with('\n') {
                    features.push('\n');
                }
                features.push_str(block);
            }
        }
        font.features = features;
        font
    }

    fn merge_donors(&self, mut font: MasterFont, variant: &Variant) -> MasterFont {
        // The NF donor set supersets PL: Powerline glyphs first, then
        // the full symbol donors.
        if variant.flags.powerline || variant.flags.nerd_font {
            merge_glyph_set(&mut font, &self.sources.powerline_donor);
        }
        if variant.flags.nerd_font {
            for donor in &self.sources.symbol_donors {
                merge_glyph_set(&mut font, donor);
            }
        }
        font
    }

    fn stamp_metadata(&self, mut font: MasterFont) -> MasterFont {
        font.metadata = self.metadata.clone();
        font
    }
}

/// Replace the base family token with the variant's family name, in
/// both the family and the style-map family. A no-op when the token is
/// absent.
fn rename_family(mut font: MasterFont, variant: &Variant) -> MasterFont {
    let family = variant.family_name();
    font.family_name = font.family_name.replace(CODE_FAMILY, &family);
    if let Some(style_map) = font.style_map_family_name.take() {
        font.style_map_family_name = Some(style_map.replace(CODE_FAMILY, &family));
    }
    font
}
