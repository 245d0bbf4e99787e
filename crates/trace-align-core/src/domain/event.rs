//! Event records in the two timestamp shapes an event log can take.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User recorded on events injected by the repairer.
pub const AUTO_USER: &str = "AUTO";

/// Lifecycle transition of a dual-timestamp event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Start,
    Complete,
}

/// Event with a single completion timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SingleEvent {
    pub case_id: String,
    pub task: String,
    pub user: String,
    pub end_timestamp: DateTime<Utc>,
}

/// Event carrying one half of an activity instance (start or complete).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DualEvent {
    pub case_id: String,
    pub task: String,
    pub user: String,
    pub event_type: Lifecycle,
    pub timestamp: DateTime<Utc>,
}

/// An activity instance rebuilt from a matched start/complete pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub case_id: String,
    pub task: String,
    pub user: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
}

/// Behaviour the repairer needs from an event shape.
pub trait TraceEvent: Clone {
    fn case_id(&self) -> &str;

    /// Timestamp used to place synthesized events after this one.
    fn time_reference(&self) -> DateTime<Utc>;

    /// Events injected for a model-only move, in emission order.
    fn synthesize(case_id: &str, task: &str, at: DateTime<Utc>) -> Vec<Self>;
}

impl TraceEvent for SingleEvent {
    fn case_id(&self) -> &str {
        &self.case_id
    }

    fn time_reference(&self) -> DateTime<Utc> {
        self.end_timestamp
    }

    fn synthesize(case_id: &str, task: &str, at: DateTime<Utc>) -> Vec<Self> {
        vec![SingleEvent {
            case_id: case_id.to_string(),
            task: task.to_string(),
            user: AUTO_USER.to_string(),
            end_timestamp: at,
        }]
    }
}

impl TraceEvent for DualEvent {
    fn case_id(&self) -> &str {
        &self.case_id
    }

    fn time_reference(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn synthesize(case_id: &str, task: &str, at: DateTime<Utc>) -> Vec<Self> {
        // complete first, then start, both at the same instant
        [Lifecycle::Complete, Lifecycle::Start]
            .into_iter()
            .map(|event_type| DualEvent {
                case_id: case_id.to_string(),
                task: task.to_string(),
                user: AUTO_USER.to_string(),
                event_type,
                timestamp: at,
            })
            .collect()
    }
}

/// A log split into traces, one per case, in one of the two shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "traces", rename_all = "snake_case")]
pub enum EventLog {
    SingleTimestamp(Vec<Vec<SingleEvent>>),
    DualTimestamp(Vec<Vec<DualEvent>>),
}

impl EventLog {
    pub fn trace_count(&self) -> usize {
        match self {
            EventLog::SingleTimestamp(traces) => traces.len(),
            EventLog::DualTimestamp(traces) => traces.len(),
        }
    }

    pub fn is_single_timestamp(&self) -> bool {
        matches!(self, EventLog::SingleTimestamp(_))
    }
}
