//! JSON event-log reader and result writer.
//!
//! The input is a flat JSON array of event records in either shape; events
//! are grouped into traces by case id in first-appearance order.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::domain::{DualEvent, EventLog, Result, SingleEvent, TraceEvent};
use crate::orchestrator::AlignedOutput;

/// Parse a JSON array of events into an [`EventLog`].
pub fn parse_event_log(raw: &str, one_timestamp: bool) -> Result<EventLog> {
    if one_timestamp {
        Ok(EventLog::SingleTimestamp(parse_traces::<SingleEvent>(raw)?))
    } else {
        Ok(EventLog::DualTimestamp(parse_traces::<DualEvent>(raw)?))
    }
}

pub fn read_event_log(path: &Path, one_timestamp: bool) -> Result<EventLog> {
    let raw = std::fs::read_to_string(path)?;
    parse_event_log(&raw, one_timestamp)
}

/// Write the repaired records as pretty-printed JSON.
pub fn write_output(path: &Path, output: &AlignedOutput) -> Result<()> {
    let json = serde_json::to_vec_pretty(output)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn parse_traces<E: TraceEvent + DeserializeOwned>(raw: &str) -> Result<Vec<Vec<E>>> {
    let events: Vec<E> = serde_json::from_str(raw)?;
    Ok(group_by_case(events))
}

/// Group events per case, keeping case order and event order.
pub fn group_by_case<E: TraceEvent>(events: Vec<E>) -> Vec<Vec<E>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut traces: Vec<Vec<E>> = Vec::new();
    for event in events {
        let slot = *index
            .entry(event.case_id().to_string())
            .or_insert_with(|| {
                traces.push(Vec::new());
                traces.len() - 1
            });
        traces[slot].push(event);
    }
    traces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Lifecycle;

    #[test]
    fn test_groups_in_first_appearance_order() {
        let raw = r#"[
            {"case_id":"b","task":"A","user":"u1","end_timestamp":"2024-01-01T10:00:00Z"},
            {"case_id":"a","task":"A","user":"u2","end_timestamp":"2024-01-01T10:01:00Z"},
            {"case_id":"b","task":"B","user":"u1","end_timestamp":"2024-01-01T10:02:00Z"}
        ]"#;
        let log = parse_event_log(raw, true).expect("parse");

        let EventLog::SingleTimestamp(traces) = log else {
            panic!("expected single-timestamp log");
        };
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0][0].case_id, "b");
        assert_eq!(traces[0][1].task, "B");
        assert_eq!(traces[1][0].case_id, "a");
    }

    #[test]
    fn test_dual_events() {
        let raw = r#"[
            {"case_id":"c1","task":"A","user":"u",
             "event_type":"start","timestamp":"2024-01-01T10:00:00Z"},
            {"case_id":"c1","task":"A","user":"u",
             "event_type":"complete","timestamp":"2024-01-01T10:05:00Z"}
        ]"#;
        let log = parse_event_log(raw, false).expect("parse");

        let EventLog::DualTimestamp(traces) = log else {
            panic!("expected dual-timestamp log");
        };
        assert_eq!(traces[0][1].event_type, Lifecycle::Complete);
    }

    #[test]
    fn test_wrong_shape_is_serialization_error() {
        let raw =
            r#"[{"case_id":"c1","task":"A","user":"u","end_timestamp":"2024-01-01T10:00:00Z"}]"#;
        let err = parse_event_log(raw, false).unwrap_err();
        assert!(matches!(err, crate::domain::AlignError::Serialization(_)));
    }
}
