//! Keeps the displayed markers in step with the latest bus snapshot.
//!
//! Each cycle takes exactly one of three transitions:
//!
//! | Condition                                   | Transition       |
//! |---------------------------------------------|------------------|
//! | current snapshot empty                      | `NoOp`           |
//! | bus count changed                           | `FullRebuild`    |
//! | bus count unchanged                         | `PositionUpdate` |
//!
//! Buses are matched to markers purely by index. An empty snapshot means the
//! cycle produced no usable data, so the stale markers stay where they are.

use serde::Serialize;
use tracing::{debug, info};

use crate::display::{MarkerDisplay, MarkerVisual};
use crate::snapshot::BusSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    FullRebuild,
    PositionUpdate,
    NoOp,
}

impl Transition {
    /// Picks the transition for moving from `previous` to `current`.
    pub fn between(previous: &BusSnapshot, current: &BusSnapshot) -> Self {
        if current.is_empty() {
            Transition::NoOp
        } else if current.len() != previous.len() {
            Transition::FullRebuild
        } else {
            Transition::PositionUpdate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::FullRebuild => "full_rebuild",
            Transition::PositionUpdate => "position_update",
            Transition::NoOp => "no_op",
        }
    }
}

/// Label and icon marker for one bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair<H> {
    pub label: H,
    pub icon: H,
}

/// Last accepted snapshot and the markers drawn for it, index-aligned.
#[derive(Debug)]
pub struct TrackingState<H> {
    snapshot: BusSnapshot,
    markers: Vec<MarkerPair<H>>,
}

impl<H> Default for TrackingState<H> {
    fn default() -> Self {
        Self {
            snapshot: BusSnapshot::default(),
            markers: Vec::new(),
        }
    }
}

impl<H> TrackingState<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &BusSnapshot {
        &self.snapshot
    }

    pub fn markers(&self) -> &[MarkerPair<H>] {
        &self.markers
    }

    /// Removes every displayed marker and resets to the empty state.
    pub fn teardown<D>(&mut self, display: &mut D) -> usize
    where
        D: MarkerDisplay<Handle = H>,
    {
        let removed = remove_all(&mut self.markers, display);
        self.snapshot = BusSnapshot::default();
        removed
    }
}

/// Collaborator calls issued by one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub transition: Transition,
    pub added: usize,
    pub removed: usize,
    pub moved: usize,
}

impl Reconciliation {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            added: 0,
            removed: 0,
            moved: 0,
        }
    }
}

/// Brings `state` and `display` in line with `current`.
pub fn reconcile<D>(
    state: &mut TrackingState<D::Handle>,
    current: BusSnapshot,
    display: &mut D,
) -> Reconciliation
where
    D: MarkerDisplay,
{
    let transition = Transition::between(&state.snapshot, &current);
    let mut outcome = Reconciliation::new(transition);

    match transition {
        Transition::NoOp => {
            debug!(
                displayed = state.markers.len(),
                "No fresh bus data, keeping current markers"
            );
        }
        Transition::FullRebuild => {
            info!(
                previous = state.snapshot.len(),
                current = current.len(),
                "Bus count changed, rebuilding markers"
            );
            outcome.removed = remove_all(&mut state.markers, display);

            for bus in current.iter() {
                let position = bus.position();
                let label = display.add_marker(position, MarkerVisual::label_for(bus));
                let icon = display.add_marker(position, MarkerVisual::icon_for(bus));
                state.markers.push(MarkerPair { label, icon });
                outcome.added += 2;
            }
            state.snapshot = current;
        }
        Transition::PositionUpdate => {
            for (pair, bus) in state.markers.iter().zip(current.iter()) {
                let position = bus.position();
                display.move_marker(&pair.label, position);
                display.move_marker(&pair.icon, position);
                outcome.moved += 2;
            }
            debug!(moved = outcome.moved, "Marker positions updated");
            state.snapshot = current;
        }
    }

    outcome
}

fn remove_all<D: MarkerDisplay>(
    markers: &mut Vec<MarkerPair<D::Handle>>,
    display: &mut D,
) -> usize {
    let mut removed = 0;
    for pair in markers.drain(..) {
        display.remove_marker(pair.label);
        display.remove_marker(pair.icon);
        removed += 2;
    }
    removed
}
