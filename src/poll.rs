//! The fetch → parse → reconcile loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::display::MarkerDisplay;
use crate::error::FeedError;
use crate::fetch::FeedSource;
use crate::output::CycleHistory;
use crate::parser::parse_feed;
use crate::reconcile::{TrackingState, reconcile};
use crate::snapshot::BusSnapshot;
use crate::stats::CycleStats;

/// Drives one feed source into one display, a cycle at a time.
///
/// The loop owns the tracking state, so nothing else can touch it between
/// cycles. The next cycle is scheduled only after the current one has
/// finished, which means the period is measured from the end of a cycle.
pub struct PollLoop<S, D: MarkerDisplay> {
    source: S,
    display: D,
    state: TrackingState<D::Handle>,
    period: Duration,
    cycles: u64,
    /// Consecutive cycles that left the display untouched.
    stale_cycles: u64,
    history: Option<CycleHistory>,
}

impl<S: FeedSource, D: MarkerDisplay> PollLoop<S, D> {
    pub fn new(source: S, display: D, period: Duration) -> Self {
        Self {
            source,
            display,
            state: TrackingState::new(),
            period,
            cycles: 0,
            stale_cycles: 0,
            history: None,
        }
    }

    /// Appends a [`CycleStats`] row to `history` after every cycle.
    pub fn with_history(mut self, history: CycleHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn state(&self) -> &TrackingState<D::Handle> {
        &self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn stale_cycles(&self) -> u64 {
        self.stale_cycles
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// Fetch and parse failures are logged and turned into an empty cycle; they
    /// never end the loop. Cancellation abandons an in-flight fetch or the wait
    /// between cycles, and no new cycle starts afterwards.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        info!(
            source = self.source.describe(),
            period_secs = self.period.as_secs_f64(),
            "Poll loop started"
        );

        while !cancel.is_cancelled() {
            let stats = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cycle abandoned on cancellation");
                    break;
                }
                stats = self.run_cycle() => stats,
            };
            self.record(stats).await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.period) => {}
            }
        }

        info!(cycles = self.cycles, "Poll loop stopped");
    }

    /// Executes one fetch → parse → reconcile pass.
    #[tracing::instrument(skip(self), fields(cycle = self.cycles + 1))]
    pub async fn run_cycle(&mut self) -> CycleStats {
        self.cycles += 1;

        let (snapshot, stats) = match self.load().await {
            Ok(snapshot) => {
                let stats = CycleStats::from_snapshot(&snapshot);
                (snapshot, stats)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Cycle produced no bus data");
                (
                    BusSnapshot::default(),
                    CycleStats::from_error(e.kind(), &e.to_string()),
                )
            }
        };

        let outcome = reconcile(&mut self.state, snapshot, &mut self.display);
        debug!(
            transition = outcome.transition.as_str(),
            added = outcome.added,
            removed = outcome.removed,
            moved = outcome.moved,
            "Cycle reconciled"
        );

        let stats = stats
            .with_source(self.cycles, self.source.describe())
            .with_reconciliation(&outcome);

        if stats.is_stale() {
            self.stale_cycles += 1;
            warn!(
                stale_cycles = self.stale_cycles,
                "Display not refreshed, showing last known positions"
            );
        } else {
            self.stale_cycles = 0;
        }

        stats
    }

    /// Removes every marker and hands back the display.
    pub fn shutdown(mut self) -> D {
        let removed = self.state.teardown(&mut self.display);
        info!(removed, "Markers torn down");
        self.display
    }

    async fn load(&self) -> Result<BusSnapshot, FeedError> {
        let bytes = self.source.fetch().await?;
        Ok(parse_feed(&bytes)?)
    }

    async fn record(&self, stats: CycleStats) {
        if let Some(history) = &self.history {
            if let Err(e) = history.append_async(stats).await {
                warn!(path = %history.path().display(), error = %e, "Failed to write cycle record");
            }
        }
    }
}
