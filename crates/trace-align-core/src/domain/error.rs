//! Domain-level error taxonomy for Trace Align.

use serde::{Deserialize, Serialize};

/// Errors produced while reading the conformance tool's output files.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} header lines, file has only {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("line {line}: missing field {index}")]
    MissingField { line: usize, index: usize },

    #[error("line {line}: invalid trace type {value:?}")]
    InvalidTraceType { line: usize, value: String },

    #[error("line {line}: invalid fitness {value:?}")]
    InvalidFitness { line: usize, value: String },

    #[error("line {line}: malformed move cell {cell:?}")]
    MalformedMove { line: usize, cell: String },

    #[error("line {line}: unknown move kind {marker:?}")]
    UnknownMoveKind { line: usize, marker: String },
}

/// Reasons a single trace is left out of the repaired log.
///
/// None of these abort the run; the orchestrator records them per trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceError {
    #[error("trace has no events")]
    EmptyTrace,

    #[error("no alignment info for case {case_id}")]
    UnknownCase { case_id: String },

    #[error("case {case_id}: no optimal alignment for trace type {trace_type}")]
    UnknownTraceType { case_id: String, trace_type: u32 },

    #[error("case {case_id}: fitness is zero, no repair defined")]
    ZeroFitness { case_id: String },

    #[error("case {case_id}: move {move_index} ran past the end of the trace")]
    TraceExhausted { case_id: String, move_index: usize },

    #[error("case {case_id}: task {task:?} has {starts} start and {completes} complete events")]
    Misaligned {
        case_id: String,
        task: String,
        starts: usize,
        completes: usize,
    },
}

impl TraceError {
    /// Short stable label used to aggregate skip reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            TraceError::EmptyTrace => "empty_trace",
            TraceError::UnknownCase { .. } => "unknown_case",
            TraceError::UnknownTraceType { .. } => "unknown_trace_type",
            TraceError::ZeroFitness { .. } => "zero_fitness",
            TraceError::TraceExhausted { .. } => "trace_exhausted",
            TraceError::Misaligned { .. } => "misaligned",
        }
    }
}

/// Trace Align errors that stop an operation outright.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("parse error in {source_name}: {error}")]
    Parse {
        source_name: String,
        error: ParseError,
    },

    #[error("conformance tool exited with code {exit_code}: {stderr}")]
    ToolFailed { exit_code: i32, stderr: String },

    #[error("conformance tool timed out after {secs} seconds")]
    ToolTimeout { secs: u64 },

    #[error("invalid settings: {0}")]
    Config(String),

    #[error("settings error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Trace Align operations.
pub type Result<T> = std::result::Result<T, AlignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_error_display() {
        let err = TraceError::UnknownCase {
            case_id: "case-7".to_string(),
        };
        assert!(err.to_string().contains("case-7"));

        let err = TraceError::Misaligned {
            case_id: "c1".to_string(),
            task: "Review".to_string(),
            starts: 2,
            completes: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Review"));
        assert!(msg.contains("2 start"));
        assert!(msg.contains("1 complete"));
    }

    #[test]
    fn test_trace_error_kind_labels() {
        assert_eq!(TraceError::EmptyTrace.kind(), "empty_trace");
        assert_eq!(
            TraceError::ZeroFitness {
                case_id: "c".to_string()
            }
            .kind(),
            "zero_fitness"
        );
    }

    #[test]
    fn test_trace_error_serializes_with_kind_tag() {
        let err = TraceError::UnknownTraceType {
            case_id: "c9".to_string(),
            trace_type: 4,
        };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["kind"], "unknown_trace_type");
        assert_eq!(json["trace_type"], 4);
    }

    #[test]
    fn test_tool_failed_error() {
        let err = AlignError::ToolFailed {
            exit_code: 2,
            stderr: "model not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code 2"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn test_parse_error_carries_source() {
        let err = AlignError::Parse {
            source_name: "alignment.csv".to_string(),
            error: ParseError::MissingField { line: 9, index: 11 },
        };
        let msg = err.to_string();
        assert!(msg.contains("alignment.csv"));
        assert!(msg.contains("line 9"));
    }
}
