//! Transfers precompiled VTT hint tables from a hint container onto a
//! freshly compiled font.
//!
//! The container carries its own glyph order; when the receiving
//! font's glyph order differs, every glyph-index operand inside the
//! hint assembly is resolved by name and renumbered to the new order.
//! A reference that cannot be resolved is a fatal error for that
//! transfer; dangling hint references are never silently dropped or
//! zeroed.

pub mod assembly;
mod container;
mod error;
mod remap;
mod transfer;

pub use container::{ExtraPrograms, HintContainer, TSI0, TSI1, TSI2, TSI3, TSI5};
pub use error::{Error, Result};
pub use remap::{GlyphOrderMap, rewrite_program};
pub use transfer::transfer;
