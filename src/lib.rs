//! # tidemark
//!
//! Core library for Tidemark timeline-markup parsing: date grammars and
//! resolution, the event tree, and incremental reparse.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! incremental → change-set mapping over a previous parse
//!   ↓
//! parser      → line classification, header scan, tree building
//!   ↓
//! cache       → per-timezone memo tables with LRU eviction
//!   ↓
//! model       → Timeline, Event/EventGroup tree, diagnostics, header
//!   ↓
//! dates       → date grammars, timezone handling, range resolution
//!   ↓
//! base        → primitives (ranges, folds, line index)
//! ```

// ============================================================================
// MODULES (dependency order: base → dates → model → cache → parser →
// incremental)
// ============================================================================

/// Foundation types: classified ranges, fold regions, line index
pub mod base;

/// Date grammars (extended, casual, historical), timezones, resolution
pub mod dates;

/// The parse result: Timeline, event tree, header, diagnostics
pub mod model;

/// Per-timezone memo tables behind an LRU-bounded cache
pub mod cache;

/// Line-oriented document parser
pub mod parser;

/// Incremental re-parsing by offset remapping
pub mod incremental;

// Re-export the parse entry points
pub use parser::{parse, parse_with, ParseOptions};

// Re-export the types most callers touch
pub use base::{FoldKind, FoldRegion, LineCol, LineIndex, Range, RangeType};
pub use cache::ParseCache;
pub use dates::{DateRange, Recurrence, Zone, ZoneError};
pub use incremental::{map_changes, parse_incremental, ChangeSet, MapOutcome, TextEdit};
pub use model::{
    DiagnosticCode, DisplayScale, Event, EventGroup, GroupStyle, Header, Metadata, Node,
    ParseDiagnostic, Path, Severity, Timeline,
};
