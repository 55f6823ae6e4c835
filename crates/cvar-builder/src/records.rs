//! Input records for control-value variation synthesis.

/// A single-axis coordinate within a design-space location.
///
/// Coordinates are normalized: -1 to 1 with 0 the default position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCoordinate {
    /// Index into the font's ordered axis list.
    pub axis: usize,
    /// Normalized coordinate on that axis.
    pub value: f32,
}

impl AxisCoordinate {
    pub const fn new(axis: usize, value: f32) -> Self {
        Self { axis, value }
    }
}

/// Control-value deltas recorded at one design-space location.
///
/// Deltas are sparse: a control value with no entry here has *no* delta
/// at this location, which is different from a delta of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlValueRecord {
    /// The design-space location these deltas apply at. Axes not listed
    /// sit at their default position.
    pub location: Vec<AxisCoordinate>,
    /// (control value index, delta) pairs, in font design units.
    pub deltas: Vec<(usize, i16)>,
}

impl ControlValueRecord {
    pub fn new(location: Vec<AxisCoordinate>, deltas: Vec<(usize, i16)>) -> Self {
        Self { location, deltas }
    }
}
