//! Foundation types for the Tidemark toolchain.
//!
//! This module provides fundamental types used throughout the parser:
//! - [`TextRange`], [`TextSize`] - Byte-offset source positions
//! - [`Range`], [`RangeType`] - Classified source spans for editor decoration
//! - [`FoldRegion`], [`FoldKind`] - Foldable spans keyed by starting offset
//! - [`LineCol`], [`LineIndex`] - Offset to line/column conversion
//!
//! This module has NO dependencies on other tidemark modules.

mod fold;
mod line_index;
mod range;

pub use fold::{FoldKind, FoldRegion};
pub use line_index::{LineCol, LineIndex};
pub use range::{Range, RangeType};

// The text-size types appear in public signatures, so re-export them
pub use text_size::{TextRange, TextSize};
