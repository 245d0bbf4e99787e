//! Domain models for Trace Align.
//!
//! Canonical definitions for the core entities:
//! - `Move` / `AlignmentTemplate`: optimal alignment per trace type
//! - `CaseAlignmentInfo`: case to trace type and fitness
//! - `SingleEvent` / `DualEvent`: the two event shapes of a log
//! - `Interval`: start/complete pair rebuilt after repair

pub mod alignment;
pub mod error;
pub mod event;

// Re-export main types and errors
pub use alignment::{AlignmentTemplate, CaseAlignmentInfo, Move, MoveKind};
pub use error::{AlignError, ParseError, Result, TraceError};
pub use event::{DualEvent, EventLog, Interval, Lifecycle, SingleEvent, TraceEvent, AUTO_USER};
