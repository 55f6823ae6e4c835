//! The hint container: named VTT source tables plus their glyph order.
//!
//! A container is an ordinary font binary carrying the `TSI0`/`TSI1`
//! (glyph hint assembly), `TSI2`/`TSI3` (high-level hint source) and
//! `TSI5` (glyph group) tables. `TSI0` and `TSI2` are index tables:
//! one `{glyph index, text length, text offset}` record per glyph, a
//! magic separator record, then records for the extra (prep, cvt,
//! fpgm) programs stored at the end of the text block.

use font_types::Tag;
use indexmap::IndexMap;
use read_fonts::{FontRef, TableProvider, types::GlyphId16};

use crate::error::{Error, Result};

pub const TSI0: Tag = Tag::new(b"TSI0");
pub const TSI1: Tag = Tag::new(b"TSI1");
pub const TSI2: Tag = Tag::new(b"TSI2");
pub const TSI3: Tag = Tag::new(b"TSI3");
pub const TSI5: Tag = Tag::new(b"TSI5");

const MAGIC_ID: u16 = 0xFFFE;
const MAGIC_OFFSET: u32 = 0xABFC_1F34;
const EXTRA_PREP: u16 = 0xFFFA;
const EXTRA_CVT: u16 = 0xFFFB;
const EXTRA_RESERVED: u16 = 0xFFFC;
const EXTRA_FPGM: u16 = 0xFFFD;
/// Text lengths at or above this value overflow the u16 length field;
/// the true length is recovered from the next record's offset.
const LENGTH_OVERFLOW: u16 = 0x8000;

/// The shared (non-glyph) hint programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraPrograms {
    pub prep: String,
    pub cvt: String,
    pub fpgm: String,
}

/// An externally authored set of hint tables keyed to a glyph order.
#[derive(Debug, Clone, Default)]
pub struct HintContainer {
    pub glyph_order: Vec<String>,
    /// Per-glyph hint assembly (`TSI1`), keyed by glyph name.
    pub glyph_programs: IndexMap<String, String>,
    /// Per-glyph high-level hint source (`TSI3`).
    pub talk_programs: IndexMap<String, String>,
    /// Per-glyph group assignment (`TSI5`).
    pub glyph_groups: IndexMap<String, u16>,
    pub extra: ExtraPrograms,
    /// Extra programs stored on the high-level source side (`TSI2`).
    pub talk_extra: ExtraPrograms,
    /// Original table bytes, kept so an order-preserving transfer can
    /// copy them verbatim.
    raw_tables: Vec<(Tag, Vec<u8>)>,
}

impl HintContainer {
    /// Assemble a container from already-structured parts.
    pub fn from_parts(
        glyph_order: Vec<String>,
        glyph_programs: IndexMap<String, String>,
        talk_programs: IndexMap<String, String>,
        glyph_groups: IndexMap<String, u16>,
        extra: ExtraPrograms,
        talk_extra: ExtraPrograms,
    ) -> Self {
        Self {
            glyph_order,
            glyph_programs,
            talk_programs,
            glyph_groups,
            extra,
            talk_extra,
            raw_tables: Vec::new(),
        }
    }

    /// Read a container from font bytes: glyph order from `post`,
    /// hint sources from the TSI tables.
    pub fn from_font_bytes(data: &[u8]) -> Result<Self> {
        let font = FontRef::new(data)?;
        let num_glyphs = font.maxp()?.num_glyphs() as usize;
        let post = font.post()?;

        let glyph_order: Vec<String> = (0..num_glyphs)
            .map(|gid| {
                post.glyph_name(GlyphId16::new(gid as u16))
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("glyph{gid:05}"))
            })
            .collect();

        let required = |tag: Tag| {
            font.table_data(tag)
                .map(|data| data.as_bytes().to_vec())
                .ok_or(Error::MissingTable { tag })
        };
        let optional =
            |tag: Tag| font.table_data(tag).map(|data| data.as_bytes().to_vec());

        let tsi0 = required(TSI0)?;
        let tsi1 = required(TSI1)?;
        let (glyph_texts, extra) = decode_text_tables(TSI0, &tsi0, &tsi1, num_glyphs)?;

        let (talk_texts, talk_extra) = match (optional(TSI2), optional(TSI3)) {
            (Some(tsi2), Some(tsi3)) => decode_text_tables(TSI2, &tsi2, &tsi3, num_glyphs)?,
            _ => (vec![String::new(); num_glyphs], ExtraPrograms::default()),
        };

        let groups = match optional(TSI5) {
            Some(tsi5) => decode_groups(&tsi5, num_glyphs)?,
            None => vec![0; num_glyphs],
        };

        let mut raw_tables = vec![(TSI0, tsi0), (TSI1, tsi1)];
        for tag in [TSI2, TSI3, TSI5] {
            if let Some(bytes) = optional(tag) {
                raw_tables.push((tag, bytes));
            }
        }

        let keyed = |texts: Vec<String>| -> IndexMap<String, String> {
            glyph_order
                .iter()
                .cloned()
                .zip(texts)
                .filter(|(_, text)| !text.is_empty())
                .collect()
        };

        Ok(Self {
            glyph_programs: keyed(glyph_texts),
            talk_programs: keyed(talk_texts),
            glyph_groups: glyph_order.iter().cloned().zip(groups).collect(),
            glyph_order,
            extra,
            talk_extra,
            raw_tables,
        })
    }

    pub fn raw_tables(&self) -> &[(Tag, Vec<u8>)] {
        &self.raw_tables
    }
}

struct IndexRecord {
    id: u16,
    raw_len: u16,
    offset: u32,
}

/// Decode an index table + text table pair into per-glyph texts and
/// the extra programs.
pub(crate) fn decode_text_tables(
    index_tag: Tag,
    index: &[u8],
    text: &[u8],
    num_glyphs: usize,
) -> Result<(Vec<String>, ExtraPrograms)> {
    let bad = |message: String| Error::BadTable {
        tag: index_tag,
        message,
    };

    if index.len() % 8 != 0 {
        return Err(bad(format!("length {} is not a multiple of 8", index.len())));
    }
    let records: Vec<IndexRecord> = index
        .chunks_exact(8)
        .map(|chunk| IndexRecord {
            id: u16::from_be_bytes([chunk[0], chunk[1]]),
            raw_len: u16::from_be_bytes([chunk[2], chunk[3]]),
            offset: u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
        })
        .collect();

    // Resolve overflowed lengths against the next real record's offset.
    // The magic separator's offset field is a sentinel, not an offset.
    let real: Vec<&IndexRecord> = records.iter().filter(|r| r.id != MAGIC_ID).collect();

    let mut glyph_texts = vec![String::new(); num_glyphs];
    let mut extra = ExtraPrograms::default();

    for (pos, record) in real.iter().enumerate() {
        let start = record.offset as usize;
        let len = if record.raw_len >= LENGTH_OVERFLOW {
            let end = real
                .get(pos + 1)
                .map(|next| next.offset as usize)
                .unwrap_or(text.len());
            end.checked_sub(start)
                .ok_or_else(|| bad("record offsets are not increasing".to_string()))?
        } else {
            record.raw_len as usize
        };
        let end = start + len;
        if end > text.len() {
            return Err(bad(format!(
                "record for id {} runs past the text table ({end} > {})",
                record.id,
                text.len()
            )));
        }
        let content = String::from_utf8_lossy(&text[start..end]).into_owned();

        match record.id {
            id if (id as usize) < num_glyphs => glyph_texts[id as usize] = content,
            EXTRA_PREP => extra.prep = content,
            EXTRA_CVT => extra.cvt = content,
            EXTRA_FPGM => extra.fpgm = content,
            EXTRA_RESERVED => {}
            id => return Err(bad(format!("unexpected record id {id:#06X}"))),
        }
    }

    Ok((glyph_texts, extra))
}

/// Encode per-glyph texts plus the extra programs into an index table
/// and text table pair.
pub(crate) fn encode_text_tables(
    glyph_texts: &[String],
    extra: &ExtraPrograms,
) -> (Vec<u8>, Vec<u8>) {
    let mut index = Vec::with_capacity((glyph_texts.len() + 5) * 8);
    let mut text = Vec::new();

    let mut push_record = |index: &mut Vec<u8>, id: u16, content: &str| {
        let bytes = content.as_bytes();
        let raw_len = if bytes.len() >= LENGTH_OVERFLOW as usize {
            LENGTH_OVERFLOW
        } else {
            bytes.len() as u16
        };
        index.extend_from_slice(&id.to_be_bytes());
        index.extend_from_slice(&raw_len.to_be_bytes());
        index.extend_from_slice(&(text.len() as u32).to_be_bytes());
        text.extend_from_slice(bytes);
    };

    for (gid, content) in glyph_texts.iter().enumerate() {
        push_record(&mut index, gid as u16, content);
    }

    index.extend_from_slice(&MAGIC_ID.to_be_bytes());
    index.extend_from_slice(&0u16.to_be_bytes());
    index.extend_from_slice(&MAGIC_OFFSET.to_be_bytes());

    push_record(&mut index, EXTRA_PREP, &extra.prep);
    push_record(&mut index, EXTRA_CVT, &extra.cvt);
    push_record(&mut index, EXTRA_RESERVED, "");
    push_record(&mut index, EXTRA_FPGM, &extra.fpgm);

    (index, text)
}

pub(crate) fn decode_groups(tsi5: &[u8], num_glyphs: usize) -> Result<Vec<u16>> {
    if tsi5.len() != num_glyphs * 2 {
        return Err(Error::BadTable {
            tag: TSI5,
            message: format!(
                "expected {} bytes for {num_glyphs} glyphs, found {}",
                num_glyphs * 2,
                tsi5.len()
            ),
        });
    }
    Ok(tsi5
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect())
}

pub(crate) fn encode_groups(groups: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(groups.len() * 2);
    for group in groups {
        out.extend_from_slice(&group.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_tables_round_trip() {
        let glyph_texts = vec![
            String::new(),
            "OFFSET[R], 2, 0, 0\n".to_string(),
            "SVTCA[Y]\nMDAP[R], 4\n".to_string(),
        ];
        let extra = ExtraPrograms {
            prep: "#PUSHOFF\n".to_string(),
            cvt: "22: 120\n".to_string(),
            fpgm: String::new(),
        };

        let (index, text) = encode_text_tables(&glyph_texts, &extra);
        let (decoded, decoded_extra) = decode_text_tables(TSI0, &index, &text, 3).unwrap();
        assert_eq!(decoded, glyph_texts);
        assert_eq!(decoded_extra, extra);
    }

    #[test]
    fn overflowed_length_recovers_from_next_offset() {
        let big = "A".repeat(LENGTH_OVERFLOW as usize + 10);
        let glyph_texts = vec![big.clone(), "short".to_string()];
        let (index, text) = encode_text_tables(&glyph_texts, &ExtraPrograms::default());
        let (decoded, _) = decode_text_tables(TSI0, &index, &text, 2).unwrap();
        assert_eq!(decoded[0], big);
        assert_eq!(decoded[1], "short");
    }

    #[test]
    fn groups_round_trip() {
        let groups = vec![0u16, 4, 4, 17];
        assert_eq!(decode_groups(&encode_groups(&groups), 4).unwrap(), groups);
    }

    #[test]
    fn truncated_group_table_is_rejected() {
        assert!(matches!(
            decode_groups(&[0, 0, 0], 2).unwrap_err(),
            Error::BadTable { .. }
        ));
    }
}
