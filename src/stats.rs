use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reconcile::{Reconciliation, Transition};
use crate::snapshot::BusSnapshot;

/// One row of cycle history: what the feed held and what the display did about it.
#[derive(Debug, Default, Serialize)]
pub struct CycleStats {
    pub timestamp: DateTime<Utc>,
    pub cycle: u64,
    pub source: Option<String>,

    // feed contents
    pub active_buses: usize,
    pub inactive_buses: usize,

    // display calls
    pub transition: Option<Transition>,
    pub markers_added: usize,
    pub markers_removed: usize,
    pub markers_moved: usize,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl CycleStats {
    pub fn from_snapshot(snapshot: &BusSnapshot) -> Self {
        CycleStats {
            timestamp: Utc::now(),
            active_buses: snapshot.len(),
            inactive_buses: snapshot.inactive(),
            ..Default::default()
        }
    }

    /// Create an error record with timestamp and error information
    pub fn from_error(error_type: &str, error_message: &str) -> Self {
        CycleStats {
            timestamp: Utc::now(),
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, cycle: u64, source: &str) -> Self {
        self.cycle = cycle;
        self.source = Some(source.to_string());
        self
    }

    pub fn with_reconciliation(mut self, outcome: &Reconciliation) -> Self {
        self.transition = Some(outcome.transition);
        self.markers_added = outcome.added;
        self.markers_removed = outcome.removed;
        self.markers_moved = outcome.moved;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_type.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.transition == Some(Transition::NoOp)
    }
}
