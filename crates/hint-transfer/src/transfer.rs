//! Copying hint tables onto a compiled font.

use font_types::Tag;
use log::{debug, info};

use crate::{
    assembly::{parse_program, serialize_program},
    container::{
        HintContainer, TSI0, TSI1, TSI2, TSI3, TSI5, encode_groups, encode_text_tables,
    },
    error::Result,
    remap::{GlyphOrderMap, rewrite_program},
};

/// Produce the hint tables to install on a font with `target_order`.
///
/// When the container's glyph order matches the target's, its tables
/// are copied verbatim. Otherwise every per-glyph program is re-keyed
/// by name to the target order and each glyph-index operand inside the
/// assembly is renumbered; a reference to a glyph the target does not
/// have fails the whole transfer, naming the glyph.
pub fn transfer(container: &HintContainer, target_order: &[String]) -> Result<Vec<(Tag, Vec<u8>)>> {
    if container.glyph_order == target_order {
        debug!("glyph orders match, copying hint tables verbatim");
        if !container.raw_tables().is_empty() {
            return Ok(container.raw_tables().to_vec());
        }
        return encode(container, &container.glyph_order, None);
    }

    info!(
        "glyph orders differ ({} container glyphs, {} target glyphs), remapping hint references",
        container.glyph_order.len(),
        target_order.len()
    );
    let map = GlyphOrderMap::new(&container.glyph_order, target_order);
    encode(container, target_order, Some(&map))
}

/// Encode all five tables for `order`, remapping programs through
/// `map` when present.
fn encode(
    container: &HintContainer,
    order: &[String],
    map: Option<&GlyphOrderMap>,
) -> Result<Vec<(Tag, Vec<u8>)>> {
    let mut glyph_texts = Vec::with_capacity(order.len());
    for name in order {
        let text = match container.glyph_programs.get(name.as_str()) {
            Some(source) => match map {
                Some(map) => {
                    let program = parse_program(source)?;
                    serialize_program(&rewrite_program(&program, map)?)
                }
                None => source.clone(),
            },
            None => String::new(),
        };
        glyph_texts.push(text);
    }

    let talk_texts: Vec<String> = order
        .iter()
        .map(|name| {
            container
                .talk_programs
                .get(name.as_str())
                .cloned()
                .unwrap_or_default()
        })
        .collect();

    let groups: Vec<u16> = order
        .iter()
        .map(|name| container.glyph_groups.get(name.as_str()).copied().unwrap_or(0))
        .collect();

    let (tsi0, tsi1) = encode_text_tables(&glyph_texts, &container.extra);
    let (tsi2, tsi3) = encode_text_tables(&talk_texts, &container.talk_extra);
    let tsi5 = encode_groups(&groups);

    Ok(vec![
        (TSI0, tsi0),
        (TSI1, tsi1),
        (TSI2, tsi2),
        (TSI3, tsi3),
        (TSI5, tsi5),
    ])
}
