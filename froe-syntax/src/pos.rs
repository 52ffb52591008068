//! Source positions.

use serde::{Deserialize, Serialize};

/// A source position as `(offset, line, column)`.
///
/// Offsets are 1-based; an offset of 0 marks an unknown or absent position.
/// The printer uses `Pos` in two senses: accurate positions attached to AST
/// nodes by the parser, and estimated output positions it tracks itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    /// Byte offset in the source, starting at 1. 0 is invalid.
    pub offset: usize,
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Pos {
    /// A position past the end of any real source text. Flushing comments
    /// "before" this position drains the whole comment list.
    pub const INFINITY: Pos = Pos {
        offset: usize::MAX,
        line: usize::MAX,
        column: usize::MAX,
    };

    #[must_use]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Pos {
            offset,
            line,
            column,
        }
    }

    /// Whether this position refers to actual source text.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.offset > 0
    }
}
