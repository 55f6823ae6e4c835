//! Packed point number and packed delta encoding.
//!
//! These are the OpenType common variation wire formats used by the
//! per-tuple serialized data in `cvar`.

const DELTAS_ARE_ZERO: u8 = 0x80;
const DELTAS_ARE_WORDS: u8 = 0x40;
const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

const POINTS_ARE_WORDS: u8 = 0x80;
const MAX_POINT_RUN: usize = 128;

fn in_i8_range(value: i16) -> bool {
    i16::from(i8::MIN) <= value && value <= i16::from(i8::MAX)
}

/// Encode a sorted list of point numbers.
///
/// Point numbers are stored as deltas from the previous point, split
/// into runs of byte-sized or word-sized differences.
pub fn pack_points(points: &[u16], out: &mut Vec<u8>) {
    if points.len() < 128 {
        out.push(points.len() as u8);
    } else {
        out.extend_from_slice(&(points.len() as u16 | 0x8000).to_be_bytes());
    }

    let mut remaining = points;
    let mut prev = 0u16;
    while let Some(&first) = remaining.first() {
        let words = first - prev > u16::from(u8::MAX);
        let mut len = 0;
        let mut last = prev;
        for &point in remaining.iter().take(MAX_POINT_RUN) {
            let fits = (point - last) <= u16::from(u8::MAX);
            if fits == words {
                break;
            }
            last = point;
            len += 1;
        }

        let (run, rest) = remaining.split_at(len);
        remaining = rest;

        let mut control = run.len() as u8 - 1;
        if words {
            control |= POINTS_ARE_WORDS;
        }
        out.push(control);
        for &point in run {
            let delta = point - prev;
            prev = point;
            if words {
                out.extend_from_slice(&delta.to_be_bytes());
            } else {
                out.push(delta as u8);
            }
        }
    }
}

/// Encode deltas as zero runs, byte runs, and word runs.
pub fn pack_deltas(deltas: &[i16], out: &mut Vec<u8>) {
    const MAX_RUN: usize = DELTA_RUN_COUNT_MASK as usize + 1;

    let mut remaining = deltas;
    while let Some(&first) = remaining.first() {
        if first == 0 {
            let len = remaining
                .iter()
                .take(MAX_RUN)
                .take_while(|&&v| v == 0)
                .count();
            remaining = &remaining[len..];
            out.push(DELTAS_ARE_ZERO | (len as u8 - 1));
            continue;
        }

        let words = !in_i8_range(first);
        let mut len = 1;
        while len < MAX_RUN && len < remaining.len() {
            let cur = remaining[len];
            // A lone zero is cheaper left inline; two or more get a zero run.
            let two_zeros = cur == 0 && remaining.get(len + 1) == Some(&0);
            let is_last_zero = cur == 0 && len + 1 == remaining.len();
            if two_zeros || is_last_zero || in_i8_range(cur) == words {
                break;
            }
            len += 1;
        }

        let (run, rest) = remaining.split_at(len);
        remaining = rest;

        if words {
            out.push(DELTAS_ARE_WORDS | (run.len() as u8 - 1));
            for &v in run {
                out.extend_from_slice(&v.to_be_bytes());
            }
        } else {
            out.push(run.len() as u8 - 1);
            for &v in run {
                out.push(v as i8 as u8);
            }
        }
    }
}
