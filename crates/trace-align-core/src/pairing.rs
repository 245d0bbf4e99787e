//! Start/complete pairing with a completeness check.
//!
//! Pairs the i-th earliest start with the i-th earliest complete of each
//! task. This assumes a case never runs two instances of the same task at
//! once; overlapping instances are paired by rank, not by overlap.

use std::collections::BTreeMap;

use crate::domain::{DualEvent, Interval, Lifecycle, TraceError};

/// Rebuild activity intervals from a repaired dual-timestamp trace.
///
/// # Errors
///
/// `TraceError::Misaligned` if any task has a different number of start and
/// complete events. No partial result is returned in that case.
pub fn check_completeness(
    case_id: &str,
    repaired: &[DualEvent],
) -> Result<Vec<Interval>, TraceError> {
    let mut by_task: BTreeMap<&str, (Vec<&DualEvent>, Vec<&DualEvent>)> = BTreeMap::new();
    for event in repaired {
        let (starts, completes) = by_task.entry(event.task.as_str()).or_default();
        match event.event_type {
            Lifecycle::Start => starts.push(event),
            Lifecycle::Complete => completes.push(event),
        }
    }

    let mut intervals = Vec::with_capacity(repaired.len() / 2);
    for (task, (mut starts, mut completes)) in by_task {
        if starts.len() != completes.len() {
            return Err(TraceError::Misaligned {
                case_id: case_id.to_string(),
                task: task.to_string(),
                starts: starts.len(),
                completes: completes.len(),
            });
        }

        starts.sort_by_key(|e| e.timestamp);
        completes.sort_by_key(|e| e.timestamp);

        intervals.extend(starts.iter().zip(&completes).map(|(start, complete)| Interval {
            case_id: start.case_id.clone(),
            task: start.task.clone(),
            user: start.user.clone(),
            start_timestamp: start.timestamp,
            end_timestamp: complete.timestamp,
        }));
    }

    intervals.sort_by_key(|i| i.start_timestamp);
    Ok(intervals)
}
