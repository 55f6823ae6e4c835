//! Builds a sparse `cvar` (control value variation) table from
//! per-design-space-location delta records.
//!
//! Hint control values that change across the design space are recorded
//! as (location, sparse deltas) pairs. [`synthesize`] turns those into
//! one variation tuple per location and [`CvarTable::compile`] emits
//! the binary table. Absent deltas are preserved as absent all the way
//! through; a missing entry never becomes a zero.

mod cvar;
mod error;
mod pack;
mod records;
mod support;

pub use cvar::{CvarTable, CvarVariation, synthesize};
pub use error::{Error, Result};
pub use records::{AxisCoordinate, ControlValueRecord};
pub use support::Support;
