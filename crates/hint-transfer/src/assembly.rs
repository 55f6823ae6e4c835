//! Tokenizer and serializer for VTT-style hint assembly.
//!
//! Glyph hint programs are stored as text: one instruction per line, a
//! mnemonic with optional bracketed flags followed by comma-separated
//! numeric operands (`OFFSET[R], 182, 12, -40`). The transfer pass
//! needs to rewrite individual operands, so programs are parsed into a
//! typed instruction stream and serialized back rather than patched
//! with substring matching.

use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};

/// The composite-reference instruction whose first operand is a glyph
/// index into the hint container's glyph order.
pub const OFFSET_MNEMONIC: &str = "OFFSET";

/// The legacy composite alignment form. Hints re-authored for the
/// current masters no longer use it, and stale occurrences misplace
/// combining marks after a glyph-order shift, so remapping drops
/// these outright.
pub const LEGACY_ANCHOR_MNEMONIC: &str = "ANCHOR";

/// A single parsed assembly instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: String,
    /// Text between the brackets, e.g. `R` in `OFFSET[R]`.
    pub flags: Option<String>,
    pub operands: Vec<i32>,
}

impl Instruction {
    pub fn new(mnemonic: impl Into<String>, flags: Option<&str>, operands: Vec<i32>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            flags: flags.map(str::to_owned),
            operands,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.flags {
            Some(flags) => write!(f, "{}[{}]", self.mnemonic, flags)?,
            None => write!(f, "{}", self.mnemonic)?,
        }
        for operand in &self.operands {
            write!(f, ", {operand}")?;
        }
        Ok(())
    }
}

/// Parse a complete glyph program. Blank lines are dropped.
pub fn parse_program(text: &str) -> Result<Vec<Instruction>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(line).map_err(|message| Error::Parse { line: idx + 1, message }))
        .collect()
}

/// Serialize a program back to its textual form, one instruction per line.
pub fn serialize_program(program: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in program {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}

fn parse_line(line: &str) -> std::result::Result<Instruction, String> {
    let mut parts = line.trim().split(',');
    let head = parts.next().unwrap_or_default().trim();

    let (mnemonic, flags) = match head.split_once('[') {
        Some((mnemonic, rest)) => {
            let flags = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated flag bracket in '{head}'"))?;
            (mnemonic, Some(flags))
        }
        None => (head, None),
    };
    if mnemonic.is_empty() {
        return Err(format!("missing mnemonic in '{line}'"));
    }

    let operands = parts
        .map(|raw| {
            let raw = raw.trim();
            raw.parse::<i32>()
                .map_err(|_| format!("invalid operand '{raw}'"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Instruction::new(mnemonic, flags, operands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_operands() {
        let program = parse_program("OFFSET[R], 182, 12, -40\n").unwrap();
        assert_eq!(
            program,
            vec![Instruction::new("OFFSET", Some("R"), vec![182, 12, -40])]
        );
    }

    #[test]
    fn parses_bare_mnemonics_and_skips_blanks() {
        let program = parse_program("USEMYMETRICS[]\n\nOVERLAP[]\n#PUSHOFF\n").unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program[2].mnemonic, "#PUSHOFF");
        assert_eq!(program[2].flags, None);
    }

    #[test]
    fn serialization_round_trips() {
        let text = "USEMYMETRICS[]\nOVERLAP[]\nOFFSET[R], 7, 0, 0\n";
        let program = parse_program(text).unwrap();
        assert_eq!(serialize_program(&program), text);
    }

    #[test]
    fn rejects_bad_operand() {
        let err = parse_program("OFFSET[R], seven").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_unterminated_bracket() {
        assert!(parse_program("MDAP[R").is_err());
    }
}
