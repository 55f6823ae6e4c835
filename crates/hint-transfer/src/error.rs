//! Error types for hint table transfer.

use std::result;

use font_types::Tag;
use read_fonts::ReadError;

/// Errors that can occur while transferring hint data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse hint container font: {0}")]
    Font(#[from] ReadError),

    #[error("hint container has no {tag} table")]
    MissingTable { tag: Tag },

    #[error("malformed {tag} table: {message}")]
    BadTable { tag: Tag, message: String },

    #[error("hint assembly line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("hint program references glyph index {index}, but the container only has {count} glyphs")]
    UnknownSourceGlyph { index: u16, count: usize },

    #[error("hint program references glyph '{glyph}', which is missing from the target glyph order")]
    MissingGlyph { glyph: String },
}

pub type Result<T> = result::Result<T, Error>;
