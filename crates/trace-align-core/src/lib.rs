//! Trace Align Core Library
//!
//! Repairs an event log against a reference process model using optimal
//! alignments computed by an external conformance-checking engine.

pub mod alignment_store;
pub mod config;
pub mod conformance;
pub mod domain;
pub mod log_source;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod pairing;
pub mod repair;
pub mod telemetry;

pub use alignment_store::{
    parse_alignments, parse_case_info, AlignmentStore, LoadReport, ParseMode, Parsed,
    ALIGNMENT_HEADER_LINES, CASE_INFO_HEADER_LINES,
};
pub use config::Settings;
pub use conformance::{AlignmentEngine, JarConformanceChecker, ToolConfig, ToolRun};
pub use domain::{
    AlignError, AlignmentTemplate, CaseAlignmentInfo, DualEvent, EventLog, Interval, Lifecycle,
    Move, MoveKind, ParseError, Result, SingleEvent, TraceError, TraceEvent, AUTO_USER,
};
pub use log_source::{parse_event_log, read_event_log, write_output};
pub use orchestrator::{
    align_traces, AlignedOutput, Aligner, AlignmentReport, AlignmentRun, TraceOutcome,
};
pub use pairing::check_completeness;
pub use repair::{repair, synthetic_step, Repaired};

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// Trace Align version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
