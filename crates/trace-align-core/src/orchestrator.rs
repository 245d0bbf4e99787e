//! Alignment orchestration.
//!
//! [`align_traces`] is the end-to-end driver: it runs the conformance
//! engine, loads the alignment store and then repairs every trace in log
//! order. [`Aligner`] is the per-trace loop on its own, for callers that
//! already hold a store.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::alignment_store::{AlignmentStore, LoadReport};
use crate::config::Settings;
use crate::conformance::{AlignmentEngine, ToolRun};
use crate::domain::{
    AlignError, EventLog, Interval, Move, Result, SingleEvent, TraceError, TraceEvent,
};
use crate::metrics::METRICS;
use crate::obs::{emit_alignment_finished, emit_trace_skipped, AlignmentRunSpan};
use crate::pairing::check_completeness;
use crate::repair::{repair, Repaired};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Repaired log in the shape matching the input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", content = "records", rename_all = "snake_case")]
pub enum AlignedOutput {
    /// Single-timestamp events, sorted by end time within each trace.
    Events(Vec<SingleEvent>),

    /// Intervals, sorted by start time within each trace.
    Intervals(Vec<Interval>),
}

impl AlignedOutput {
    pub fn len(&self) -> usize {
        match self {
            AlignedOutput::Events(events) => events.len(),
            AlignedOutput::Intervals(intervals) => intervals.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceOutcome {
    Aligned {
        case_id: String,
        records: usize,
        /// Raw events left after the last move; they are not in the output.
        unconsumed: usize,
    },
    Skipped {
        case_id: Option<String>,
        reason: TraceError,
    },
}

/// Output of one pass over the log plus a per-trace account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentReport {
    pub output: AlignedOutput,
    pub outcomes: Vec<TraceOutcome>,
}

impl AlignmentReport {
    pub fn aligned_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TraceOutcome::Aligned { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.aligned_count()
    }

    /// Aligned traces whose alignment ended before the raw trace did.
    pub fn truncated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TraceOutcome::Aligned { unconsumed, .. } if *unconsumed > 0))
            .count()
    }

    /// Skipped traces counted by reason kind.
    pub fn skip_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for outcome in &self.outcomes {
            if let TraceOutcome::Skipped { reason, .. } = outcome {
                *summary.entry(reason.kind()).or_insert(0) += 1;
            }
        }
        summary
    }
}

/// Everything produced by [`align_traces`].
#[derive(Debug, Clone)]
pub struct AlignmentRun {
    pub tool: Option<ToolRun>,
    pub load: LoadReport,
    pub report: AlignmentReport,
}

// ---------------------------------------------------------------------------
// Per-trace loop
// ---------------------------------------------------------------------------

/// Repairs traces against a loaded [`AlignmentStore`].
pub struct Aligner<'a> {
    store: &'a AlignmentStore,
}

impl<'a> Aligner<'a> {
    pub fn new(store: &'a AlignmentStore) -> Self {
        Self { store }
    }

    /// Repair every trace in order. Failing traces are skipped and recorded.
    pub fn align(&self, log: &EventLog) -> AlignmentReport {
        match log {
            EventLog::SingleTimestamp(traces) => {
                let (records, outcomes) = self.drive(traces, |_, mut repaired: Vec<SingleEvent>| {
                    repaired.sort_by_key(|e| e.end_timestamp);
                    Ok(repaired)
                });
                AlignmentReport {
                    output: AlignedOutput::Events(records),
                    outcomes,
                }
            }
            EventLog::DualTimestamp(traces) => {
                let (records, outcomes) =
                    self.drive(traces, |case_id, repaired| check_completeness(case_id, &repaired));
                AlignmentReport {
                    output: AlignedOutput::Intervals(records),
                    outcomes,
                }
            }
        }
    }

    /// Resolve the trace's case info and moves, then replay them.
    pub fn repair_trace<E: TraceEvent>(
        &self,
        trace: &[E],
    ) -> std::result::Result<Repaired<E>, TraceError> {
        let first = trace.first().ok_or(TraceError::EmptyTrace)?;
        let info = self.store.case_info(first.case_id())?;
        // a perfect fit passes through without consulting its template
        let moves: &[Move] = if info.is_perfect_fit() {
            &[]
        } else {
            self.store.moves_for(info)?
        };
        repair(trace, info, moves)
    }

    fn drive<E: TraceEvent, R>(
        &self,
        traces: &[Vec<E>],
        finish: impl Fn(&str, Vec<E>) -> std::result::Result<Vec<R>, TraceError>,
    ) -> (Vec<R>, Vec<TraceOutcome>) {
        let total = traces.len();
        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, trace) in traces.iter().enumerate() {
            let case_id = trace.first().map(|e| e.case_id().to_string());
            let result = self.repair_trace(trace).and_then(|repaired| {
                let aligned = finish(case_id.as_deref().unwrap_or_default(), repaired.events)?;
                Ok(Repaired {
                    events: aligned,
                    unconsumed: repaired.unconsumed,
                    synthesized: repaired.synthesized,
                    deleted: repaired.deleted,
                })
            });

            match result {
                Ok(aligned) => {
                    METRICS.inc_traces_aligned();
                    METRICS.add_events_synthesized(aligned.synthesized as u64);
                    METRICS.add_events_deleted(aligned.deleted as u64);
                    outcomes.push(TraceOutcome::Aligned {
                        case_id: case_id.unwrap_or_default(),
                        records: aligned.events.len(),
                        unconsumed: aligned.unconsumed,
                    });
                    records.extend(aligned.events);
                }
                Err(reason) => {
                    METRICS.inc_traces_skipped();
                    emit_trace_skipped(case_id.as_deref(), &reason);
                    outcomes.push(TraceOutcome::Skipped { case_id, reason });
                }
            }
            debug!(event = "align.progress", processed = idx + 1, total = total);
        }

        (records, outcomes)
    }
}

// ---------------------------------------------------------------------------
// End-to-end driver
// ---------------------------------------------------------------------------

/// Run the engine (if any), load the store, then align every trace.
///
/// The engine run is a barrier: a failure there aborts before the alignment
/// files are read. Per-trace failures never abort; they are reported in
/// [`AlignmentReport::outcomes`].
///
/// # Errors
///
/// - `AlignError::Config` if the log shape disagrees with `one_timestamp`.
/// - Any engine error (`ToolFailed`, `ToolTimeout`, `Io`).
/// - `AlignError::Parse` / `AlignError::Io` while loading the store.
#[instrument(skip_all, fields(traces = log.trace_count()))]
pub async fn align_traces(
    log: &EventLog,
    settings: &Settings,
    engine: Option<&dyn AlignmentEngine>,
) -> Result<AlignmentRun> {
    if log.is_single_timestamp() != settings.one_timestamp {
        return Err(AlignError::Config(format!(
            "log shape does not match one_timestamp = {}",
            settings.one_timestamp
        )));
    }

    let started = Instant::now();
    let tool = match engine {
        Some(engine) => Some(engine.compute_alignments().await?),
        None => None,
    };

    let span = AlignmentRunSpan::enter();

    let (store, load) = AlignmentStore::load(
        &settings.alignment_file,
        &settings.case_info_file,
        settings.parse_mode,
    )?;

    let report = Aligner::new(&store).align(log);

    emit_alignment_finished(
        span.run_id(),
        started.elapsed().as_millis() as u64,
        report.aligned_count(),
        report.skipped_count(),
        report.output.len(),
    );
    METRICS.flush();

    Ok(AlignmentRun { tool, load, report })
}
