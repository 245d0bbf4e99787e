//! Optimal-alignment records produced by the conformance tool.

use serde::{Deserialize, Serialize};

/// Kind of a single alignment step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Log and model agree on the event.
    Synchronous,

    /// The model requires an activity the log is missing.
    ModelOnly,

    /// The log holds an event the model does not expect.
    LogOnly,
}

/// One step of an optimal alignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub task_name: String,
}

impl Move {
    pub fn new(kind: MoveKind, task_name: impl Into<String>) -> Self {
        Self {
            kind,
            task_name: task_name.into(),
        }
    }

    pub fn synchronous(task_name: impl Into<String>) -> Self {
        Self::new(MoveKind::Synchronous, task_name)
    }

    pub fn model_only(task_name: impl Into<String>) -> Self {
        Self::new(MoveKind::ModelOnly, task_name)
    }

    pub fn log_only(task_name: impl Into<String>) -> Self {
        Self::new(MoveKind::LogOnly, task_name)
    }
}

/// The optimal alignment shared by every case of one trace type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentTemplate {
    pub trace_type: u32,
    pub moves: Vec<Move>,
}

/// Links a case to its alignment template and its measured fitness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseAlignmentInfo {
    pub case_id: String,
    pub trace_type: u32,

    /// Fitness in `[0, 1]`; `1.0` means the trace already fits the model.
    pub fitness: f64,
}

impl CaseAlignmentInfo {
    pub fn new(case_id: impl Into<String>, trace_type: u32, fitness: f64) -> Self {
        Self {
            case_id: case_id.into(),
            trace_type,
            fitness,
        }
    }

    pub fn is_perfect_fit(&self) -> bool {
        self.fitness >= 1.0
    }

    pub fn is_zero_fit(&self) -> bool {
        self.fitness <= 0.0
    }
}
