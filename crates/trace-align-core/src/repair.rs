//! Trace repair by optimal-alignment replay.
//!
//! Walks the move sequence once with a cursor into the raw trace:
//! synchronous moves copy the event, log-only moves drop it and model-only
//! moves inject AUTO events placed one microsecond after the last output.
//!
//! Every move consumes at most one raw event. In dual-timestamp logs that
//! means one lifecycle event per move, not one activity instance.

use chrono::Duration;
use tracing::debug;

use crate::domain::{CaseAlignmentInfo, Move, MoveKind, TraceError, TraceEvent};

/// Spacing between a synthesized event and the event emitted before it.
pub fn synthetic_step() -> Duration {
    Duration::microseconds(1)
}

/// A repaired trace plus what the replay did to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired<E> {
    pub events: Vec<E>,
    /// Raw events left after the last move.
    pub unconsumed: usize,
    /// Model-only moves replayed.
    pub synthesized: usize,
    /// Log-only moves replayed.
    pub deleted: usize,
}

impl<E> Repaired<E> {
    fn unchanged(events: Vec<E>) -> Self {
        Self {
            events,
            unconsumed: 0,
            synthesized: 0,
            deleted: 0,
        }
    }
}

/// Repair one trace against its optimal alignment.
///
/// `moves` must be the sequence of the template selected by
/// `info.trace_type`. A perfect fit returns the trace unchanged and ignores
/// `moves`; a zero fit has no defined repair and is rejected.
///
/// # Errors
///
/// - `TraceError::ZeroFitness` when `info.fitness` is zero.
/// - `TraceError::TraceExhausted` when a move needs an event past the end
///   of the trace.
pub fn repair<E: TraceEvent>(
    trace: &[E],
    info: &CaseAlignmentInfo,
    moves: &[Move],
) -> Result<Repaired<E>, TraceError> {
    if info.is_perfect_fit() {
        return Ok(Repaired::unchanged(trace.to_vec()));
    }
    if info.is_zero_fit() {
        return Err(TraceError::ZeroFitness {
            case_id: info.case_id.clone(),
        });
    }

    let exhausted = |move_index: usize| TraceError::TraceExhausted {
        case_id: info.case_id.clone(),
        move_index,
    };

    let mut repaired: Vec<E> = Vec::with_capacity(trace.len() + moves.len());
    let mut cursor = 0usize;
    let mut synthesized = 0usize;
    let mut deleted = 0usize;

    for (move_index, step) in moves.iter().enumerate() {
        match step.kind {
            MoveKind::Synchronous => {
                let event = trace.get(cursor).ok_or_else(|| exhausted(move_index))?;
                repaired.push(event.clone());
                cursor += 1;
            }
            MoveKind::LogOnly => {
                // a deletion with nothing left to delete means the row and trace disagree
                if cursor >= trace.len() {
                    return Err(exhausted(move_index));
                }
                cursor += 1;
                deleted += 1;
            }
            MoveKind::ModelOnly => {
                let at = match repaired.last() {
                    Some(last) => last.time_reference() + synthetic_step(),
                    // nothing emitted yet: borrow the time of the unconsumed event
                    None => trace
                        .get(cursor)
                        .ok_or_else(|| exhausted(move_index))?
                        .time_reference(),
                };
                repaired.extend(E::synthesize(&info.case_id, &step.task_name, at));
                synthesized += 1;
            }
        }
    }

    let unconsumed = trace.len() - cursor;
    if unconsumed > 0 {
        debug!(
            case_id = %info.case_id,
            unconsumed,
            "alignment ended before the trace"
        );
    }

    Ok(Repaired {
        events: repaired,
        unconsumed,
        synthesized,
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DualEvent, Lifecycle, SingleEvent, AUTO_USER};
    use chrono::{DateTime, TimeZone, Utc};

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 10, minute, 0).unwrap()
    }

    fn single(task: &str, minute: u32) -> SingleEvent {
        SingleEvent {
            case_id: "c1".to_string(),
            task: task.to_string(),
            user: "alice".to_string(),
            end_timestamp: t(minute),
        }
    }

    fn partial(case_id: &str) -> CaseAlignmentInfo {
        CaseAlignmentInfo::new(case_id, 1, 0.5)
    }

    #[test]
    fn test_perfect_fit_is_identity() {
        let trace = vec![single("A", 0), single("B", 1)];
        let info = CaseAlignmentInfo::new("c1", 1, 1.0);
        // moves are ignored on a perfect fit
        let moves = vec![Move::log_only("A")];

        assert_eq!(repair(&trace, &info, &moves).expect("repair").events, trace);
    }

    #[test]
    fn test_zero_fitness_is_rejected() {
        let trace = vec![single("A", 0)];
        let info = CaseAlignmentInfo::new("c1", 1, 0.0);
        let err = repair(&trace, &info, &[Move::synchronous("A")]).unwrap_err();
        assert_eq!(
            err,
            TraceError::ZeroFitness {
                case_id: "c1".to_string()
            }
        );
    }

    #[test]
    fn test_log_only_consumes_without_emitting() {
        let trace = vec![single("A", 0), single("X", 1), single("B", 2)];
        let moves = vec![
            Move::synchronous("A"),
            Move::log_only("X"),
            Move::synchronous("B"),
        ];
        let repaired = repair(&trace, &partial("c1"), &moves).expect("repair").events;

        let tasks: Vec<&str> = repaired.iter().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["A", "B"]);
    }

    #[test]
    fn test_model_only_after_output_steps_one_microsecond() {
        let trace = vec![single("A", 0), single("D", 5)];
        let moves = vec![
            Move::synchronous("A"),
            Move::model_only("B"),
            Move::model_only("C"),
            Move::synchronous("D"),
        ];
        let repaired = repair(&trace, &partial("c1"), &moves).expect("repair").events;

        assert_eq!(repaired.len(), 4);
        assert_eq!(repaired[1].task, "B");
        assert_eq!(repaired[1].user, AUTO_USER);
        assert_eq!(repaired[1].end_timestamp, t(0) + synthetic_step());
        assert_eq!(repaired[2].end_timestamp, t(0) + synthetic_step() * 2);
        assert_eq!(repaired[3], trace[1]);
    }

    #[test]
    fn test_leading_model_only_uses_cursor_event_time() {
        let trace = vec![single("X", 3), single("B", 4)];
        let moves = vec![
            Move::log_only("X"),
            Move::model_only("A"),
            Move::synchronous("B"),
        ];
        let repaired = repair(&trace, &partial("c1"), &moves).expect("repair").events;

        assert_eq!(repaired[0].task, "A");
        // cursor sits on B once X has been dropped
        assert_eq!(repaired[0].end_timestamp, t(4));
        assert_eq!(repaired[1].task, "B");
    }

    #[test]
    fn test_dual_model_only_emits_complete_then_start() {
        let trace = vec![DualEvent {
            case_id: "c2".to_string(),
            task: "A".to_string(),
            user: "bob".to_string(),
            event_type: Lifecycle::Complete,
            timestamp: t(7),
        }];
        let moves = vec![Move::synchronous("A"), Move::model_only("B")];
        let repaired = repair(&trace, &partial("c2"), &moves).expect("repair").events;

        assert_eq!(repaired.len(), 3);
        assert_eq!(repaired[1].event_type, Lifecycle::Complete);
        assert_eq!(repaired[2].event_type, Lifecycle::Start);
        assert_eq!(repaired[1].timestamp, t(7) + synthetic_step());
        assert_eq!(repaired[2].timestamp, repaired[1].timestamp);
        assert_eq!(repaired[2].case_id, "c2");
    }

    #[test]
    fn test_synchronous_past_end_is_exhausted() {
        let trace = vec![single("A", 0)];
        let moves = vec![Move::synchronous("A"), Move::synchronous("B")];
        let err = repair(&trace, &partial("c1"), &moves).unwrap_err();
        assert_eq!(
            err,
            TraceError::TraceExhausted {
                case_id: "c1".to_string(),
                move_index: 1
            }
        );
    }

    #[test]
    fn test_leading_model_only_on_empty_trace_is_exhausted() {
        let trace: Vec<SingleEvent> = Vec::new();
        let err = repair(&trace, &partial("c1"), &[Move::model_only("A")]).unwrap_err();
        assert!(matches!(err, TraceError::TraceExhausted { move_index: 0, .. }));
    }

    #[test]
    fn test_log_only_past_end_is_exhausted() {
        let trace = vec![single("A", 0)];
        let moves = vec![
            Move::synchronous("A"),
            Move::log_only("X"),
            Move::model_only("B"),
        ];
        let err = repair(&trace, &partial("c1"), &moves).unwrap_err();
        assert!(matches!(err, TraceError::TraceExhausted { move_index: 1, .. }));
    }

    #[test]
    fn test_counts_moves_and_unconsumed_tail() {
        let trace = vec![
            single("A", 0),
            single("X", 1),
            single("C", 2),
            single("D", 3),
        ];
        let moves = vec![
            Move::synchronous("A"),
            Move::log_only("X"),
            Move::model_only("B"),
        ];
        let repaired = repair(&trace, &partial("c1"), &moves).expect("repair");

        assert_eq!(repaired.events.len(), 2);
        assert_eq!(repaired.deleted, 1);
        assert_eq!(repaired.synthesized, 1);
        assert_eq!(repaired.unconsumed, 2);
    }
}
