//! Glyph-index remapping of parsed hint programs.

use std::collections::HashMap;

use log::debug;

use crate::{
    assembly::{Instruction, LEGACY_ANCHOR_MNEMONIC, OFFSET_MNEMONIC},
    error::{Error, Result},
};

/// Read-only mapping from the hint container's glyph indices to the
/// target font's glyph indices, resolved by glyph name.
pub struct GlyphOrderMap {
    source_names: Vec<String>,
    target_index: HashMap<String, u16>,
}

impl GlyphOrderMap {
    pub fn new(source_order: &[String], target_order: &[String]) -> Self {
        let target_index = target_order
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx as u16))
            .collect();
        Self {
            source_names: source_order.to_vec(),
            target_index,
        }
    }

    /// The target index for a source index, or a fatal error when the
    /// glyph's name does not exist in the target order.
    pub fn resolve(&self, index: u16) -> Result<u16> {
        let name = self
            .source_names
            .get(index as usize)
            .ok_or(Error::UnknownSourceGlyph {
                index,
                count: self.source_names.len(),
            })?;
        self.target_index
            .get(name.as_str())
            .copied()
            .ok_or_else(|| Error::MissingGlyph { glyph: name.clone() })
    }
}

/// Rewrite every glyph-index operand in a program through `map`.
///
/// `OFFSET` references are renumbered in place; legacy `ANCHOR`
/// references are removed entirely. An unresolvable reference aborts
/// the whole program with the missing glyph's name; a dangling index
/// must never survive, silently zeroed or otherwise.
pub fn rewrite_program(program: &[Instruction], map: &GlyphOrderMap) -> Result<Vec<Instruction>> {
    let mut out = Vec::with_capacity(program.len());
    for instruction in program {
        if instruction.mnemonic == LEGACY_ANCHOR_MNEMONIC {
            debug!("dropping legacy {} instruction", instruction.mnemonic);
            continue;
        }
        if instruction.mnemonic == OFFSET_MNEMONIC {
            let mut rewritten = instruction.clone();
            let old = *rewritten.operands.first().ok_or_else(|| Error::Parse {
                line: 0,
                message: format!("{OFFSET_MNEMONIC} with no glyph operand"),
            })?;
            let new = map.resolve(old as u16)?;
            rewritten.operands[0] = i32::from(new);
            out.push(rewritten);
            continue;
        }
        out.push(instruction.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{parse_program, serialize_program};

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_by_name_across_orders() {
        // old index 5 = "X"; the target has "X" at index 2
        let source = order(&[".notdef", "A", "B", "C", "D", "X"]);
        let target = order(&[".notdef", "A", "X", "B"]);
        let map = GlyphOrderMap::new(&source, &target);
        assert_eq!(map.resolve(5).unwrap(), 2);
    }

    #[test]
    fn rewrites_offset_operand() {
        let source = order(&[".notdef", "A", "B", "C", "D", "X"]);
        let target = order(&[".notdef", "A", "X", "B"]);
        let map = GlyphOrderMap::new(&source, &target);

        let program = parse_program("USEMYMETRICS[]\nOFFSET[R], 5, 10, -20\n").unwrap();
        let rewritten = rewrite_program(&program, &map).unwrap();
        assert_eq!(
            serialize_program(&rewritten),
            "USEMYMETRICS[]\nOFFSET[R], 2, 10, -20\n"
        );
    }

    #[test]
    fn missing_glyph_is_fatal_and_named() {
        let source = order(&[".notdef", "dieresiscomb"]);
        let target = order(&[".notdef"]);
        let map = GlyphOrderMap::new(&source, &target);

        let program = parse_program("OFFSET[R], 1, 0, 0\n").unwrap();
        let err = rewrite_program(&program, &map).unwrap_err();
        match err {
            Error::MissingGlyph { glyph } => assert_eq!(glyph, "dieresiscomb"),
            other => panic!("expected MissingGlyph, got {other:?}"),
        }
    }

    #[test]
    fn index_beyond_container_is_fatal() {
        let map = GlyphOrderMap::new(&order(&[".notdef"]), &order(&[".notdef"]));
        let program = parse_program("OFFSET[R], 9, 0, 0\n").unwrap();
        assert!(matches!(
            rewrite_program(&program, &map).unwrap_err(),
            Error::UnknownSourceGlyph { index: 9, count: 1 }
        ));
    }

    #[test]
    fn legacy_anchor_references_are_dropped() {
        let source = order(&[".notdef", "acutecomb"]);
        let target = order(&[".notdef", "acutecomb"]);
        let map = GlyphOrderMap::new(&source, &target);

        let program = parse_program("ANCHOR[R], 1, 4\nOFFSET[R], 1, 0, 0\n").unwrap();
        let rewritten = rewrite_program(&program, &map).unwrap();
        assert_eq!(serialize_program(&rewritten), "OFFSET[R], 1, 0, 0\n");
    }

    #[test]
    fn unrelated_instructions_pass_through_untouched() {
        let map = GlyphOrderMap::new(&order(&[".notdef"]), &order(&[".notdef"]));
        let program = parse_program("SVTCA[Y]\nMDAP[R], 4\nIUP[Y]\n").unwrap();
        let rewritten = rewrite_program(&program, &map).unwrap();
        assert_eq!(rewritten, program);
    }
}
