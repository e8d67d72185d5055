//! The parsed document model.
//!
//! A parse produces a [`Timeline`]: an ordered tree of [`Event`]s and
//! [`EventGroup`]s under an implicit root group, addressed by [`Path`]
//! (child indices from the root), plus the document [`Header`],
//! [`ParseDiagnostic`]s and derived [`Metadata`].
//!
//! This module depends only on `base` and `dates`.

mod diagnostics;
mod header;
mod node;
mod path;
mod timeline;

pub use diagnostics::{DiagnosticCode, DocumentMessage, ParseDiagnostic, Severity};
pub use header::{DateFormat, Header};
pub use node::{
    Event, EventGroup, EventRanges, GroupRange, GroupRanges, GroupStyle, Node, SupplementalBlock,
};
pub use path::Path;
pub use timeline::{DisplayScale, EventIter, Metadata, Timeline};
