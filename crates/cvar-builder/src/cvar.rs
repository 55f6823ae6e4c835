//! Sparse `cvar` table synthesis and serialization.

use crate::{
    error::{Error, Result},
    pack::{pack_deltas, pack_points},
    records::ControlValueRecord,
    support::Support,
};

/// Flag bits in the tupleIndex field of a tuple variation header.
const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;

/// One variation tuple: a support region plus a delta per control value.
///
/// The delta array is dense over the control value table, but sparse in
/// content: `None` means the location leaves that control value alone,
/// which is not the same as a zero delta.
#[derive(Debug, Clone, PartialEq)]
pub struct CvarVariation {
    support: Support,
    deltas: Vec<Option<i16>>,
}

impl CvarVariation {
    pub fn support(&self) -> &Support {
        &self.support
    }

    pub fn deltas(&self) -> &[Option<i16>] {
        &self.deltas
    }

    /// Control value indices that actually carry a delta here.
    fn point_numbers(&self) -> Vec<u16> {
        self.deltas
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|_| i as u16))
            .collect()
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        let points = self.point_numbers();
        let values: Vec<i16> = self.deltas.iter().filter_map(|d| *d).collect();
        pack_points(&points, out);
        pack_deltas(&values, out);
    }
}

/// A synthesized control-value variation table.
#[derive(Debug, Clone, PartialEq)]
pub struct CvarTable {
    axis_count: usize,
    variations: Vec<CvarVariation>,
}

impl CvarTable {
    /// The table version is fixed; nothing here emits anything newer.
    pub const MAJOR_VERSION: u16 = 1;
    pub const MINOR_VERSION: u16 = 0;

    pub fn variations(&self) -> &[CvarVariation] {
        &self.variations
    }

    /// Serialize to the binary `cvar` format: header, tuple variation
    /// headers with embedded peaks, then per-tuple private point
    /// numbers and packed deltas.
    pub fn compile(&self) -> Vec<u8> {
        let mut bodies: Vec<Vec<u8>> = Vec::with_capacity(self.variations.len());
        for variation in &self.variations {
            // Single-location supports never need an intermediate region.
            debug_assert!(variation.support.is_implied_by_peaks());
            let mut body = Vec::new();
            variation.serialize(&mut body);
            bodies.push(body);
        }

        // Fixed 8-byte header, then one header per tuple: size, index,
        // and an embedded peak coordinate per axis.
        let header_len = 8 + self.variations.len() * (4 + self.axis_count * 2);

        let mut out = Vec::with_capacity(header_len);
        out.extend_from_slice(&Self::MAJOR_VERSION.to_be_bytes());
        out.extend_from_slice(&Self::MINOR_VERSION.to_be_bytes());
        out.extend_from_slice(&(self.variations.len() as u16).to_be_bytes());
        out.extend_from_slice(&(header_len as u16).to_be_bytes());

        for (variation, body) in self.variations.iter().zip(&bodies) {
            out.extend_from_slice(&(body.len() as u16).to_be_bytes());
            out.extend_from_slice(&(EMBEDDED_PEAK_TUPLE | PRIVATE_POINT_NUMBERS).to_be_bytes());
            for peak in variation.support.peaks() {
                out.extend_from_slice(&f2dot14(peak).to_be_bytes());
            }
        }
        for body in &bodies {
            out.extend_from_slice(body);
        }
        out
    }
}

fn f2dot14(value: f32) -> i16 {
    (value * 16384.0).round().clamp(-16384.0, 16384.0) as i16
}

/// Build a `cvar` table from per-location delta records.
///
/// `axis_count` is the length of the font's ordered axis list and
/// `cvt_len` the length of its control value table. One variation is
/// produced per record, in record order; deltas are taken verbatim,
/// with no scaling or rounding.
pub fn synthesize(
    axis_count: usize,
    cvt_len: usize,
    records: &[ControlValueRecord],
) -> Result<CvarTable> {
    let mut variations = Vec::with_capacity(records.len());

    for (record_idx, record) in records.iter().enumerate() {
        if record.location.is_empty() {
            return Err(Error::EmptyLocation { record: record_idx });
        }

        let mut peaks = vec![0.0f32; axis_count];
        let mut seen = vec![false; axis_count];
        for coord in &record.location {
            if coord.axis >= axis_count {
                return Err(Error::AxisOutOfRange {
                    record: record_idx,
                    axis: coord.axis,
                    axis_count,
                });
            }
            if seen[coord.axis] {
                return Err(Error::DuplicateAxis {
                    record: record_idx,
                    axis: coord.axis,
                });
            }
            if !(-1.0..=1.0).contains(&coord.value) {
                return Err(Error::CoordinateOutOfRange {
                    record: record_idx,
                    coordinate: coord.value,
                });
            }
            seen[coord.axis] = true;
            peaks[coord.axis] = coord.value;
        }

        let mut deltas: Vec<Option<i16>> = vec![None; cvt_len];
        for &(index, delta) in &record.deltas {
            if index >= cvt_len {
                return Err(Error::DeltaOutOfRange {
                    record: record_idx,
                    index,
                    cvt_len,
                });
            }
            deltas[index] = Some(delta);
        }

        variations.push(CvarVariation {
            support: Support::from_peaks(&peaks),
            deltas,
        });
    }

    Ok(CvarTable {
        axis_count,
        variations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AxisCoordinate;

    fn record(location: &[(usize, f32)], deltas: &[(usize, i16)]) -> ControlValueRecord {
        ControlValueRecord::new(
            location
                .iter()
                .map(|&(axis, value)| AxisCoordinate::new(axis, value))
                .collect(),
            deltas.to_vec(),
        )
    }

    #[test]
    fn unrecorded_deltas_stay_unset() {
        let table = synthesize(1, 4, &[record(&[(0, 1.0)], &[(1, 5)])]).unwrap();
        let variation = &table.variations()[0];
        assert_eq!(variation.deltas(), &[None, Some(5), None, None]);
    }

    #[test]
    fn zero_delta_is_not_absence() {
        let table = synthesize(1, 3, &[record(&[(0, 1.0)], &[(2, 0)])]).unwrap();
        let variation = &table.variations()[0];
        assert_eq!(variation.deltas(), &[None, None, Some(0)]);
    }

    #[test]
    fn one_variation_per_record_in_order() {
        let records = [
            record(&[(0, -1.0)], &[(0, -7)]),
            record(&[(0, 1.0)], &[(0, 9)]),
        ];
        let table = synthesize(1, 1, &records).unwrap();
        assert_eq!(table.variations().len(), 2);
        assert_eq!(table.variations()[0].deltas(), &[Some(-7)]);
        assert_eq!(table.variations()[1].deltas(), &[Some(9)]);
    }

    #[test]
    fn default_axis_contributes_no_bound() {
        let table = synthesize(2, 1, &[record(&[(0, 0.5)], &[(0, 1)])]).unwrap();
        let support = table.variations()[0].support();
        assert_eq!(support.axes(), &[(0.0, 0.5, 0.5), (0.0, 0.0, 0.0)]);
    }

    #[test]
    fn axis_out_of_range_is_fatal() {
        let err = synthesize(1, 1, &[record(&[(3, 0.5)], &[])]).unwrap_err();
        assert!(matches!(err, Error::AxisOutOfRange { axis: 3, .. }));
    }

    #[test]
    fn delta_beyond_cvt_is_fatal() {
        let err = synthesize(1, 2, &[record(&[(0, 0.5)], &[(2, 1)])]).unwrap_err();
        assert!(matches!(err, Error::DeltaOutOfRange { index: 2, .. }));
    }

    #[test]
    fn empty_location_is_fatal() {
        let err = synthesize(1, 1, &[record(&[], &[(0, 1)])]).unwrap_err();
        assert!(matches!(err, Error::EmptyLocation { record: 0 }));
    }

    #[test]
    fn compiled_header_is_version_one() {
        let table = synthesize(1, 2, &[record(&[(0, 1.0)], &[(0, 12)])]).unwrap();
        let bytes = table.compile();
        assert_eq!(&bytes[..4], &[0, 1, 0, 0]);
        // one tuple, data starts after the 8-byte header and one
        // 6-byte tuple header (4 fixed + one F2Dot14 peak)
        assert_eq!(&bytes[4..6], &[0, 1]);
        assert_eq!(&bytes[6..8], &[0, 14]);
    }

    #[test]
    fn compiled_peak_is_f2dot14() {
        let table = synthesize(1, 1, &[record(&[(0, -1.0)], &[(0, 1)])]).unwrap();
        let bytes = table.compile();
        // peak sits right after the first four u16 header fields
        assert_eq!(&bytes[12..14], &(-16384i16).to_be_bytes());
    }
}
