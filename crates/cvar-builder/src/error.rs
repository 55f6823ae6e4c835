//! Error types for control-value variation synthesis.

use std::result;

/// Errors that can occur while synthesizing a `cvar` table.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record carries no design-space location at all.
    #[error("record {record} has an empty design-space location")]
    EmptyLocation { record: usize },

    /// A record names an axis index the font does not define.
    #[error("record {record} references axis {axis}, but only {axis_count} axes are defined")]
    AxisOutOfRange {
        record: usize,
        axis: usize,
        axis_count: usize,
    },

    /// A record names the same axis twice.
    #[error("record {record} specifies axis {axis} more than once")]
    DuplicateAxis { record: usize, axis: usize },

    /// A delta index lies beyond the control value table.
    #[error(
        "record {record} has a delta at control value {index}, beyond the table length {cvt_len}"
    )]
    DeltaOutOfRange {
        record: usize,
        index: usize,
        cvt_len: usize,
    },

    /// An axis coordinate is outside the normalized design space.
    #[error("record {record} has coordinate {coordinate} outside the normalized range [-1, 1]")]
    CoordinateOutOfRange { record: usize, coordinate: f32 },
}

pub type Result<T> = result::Result<T, Error>;
