//! Persistence for cycle history and decoded snapshots.
//!
//! Cycle history is an append-only CSV with one [`CycleStats`] row per poll.
//! A snapshot export rewrites its file with one row per active bus.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::snapshot::BusSnapshot;
use crate::stats::CycleStats;

/// Append-only CSV log of poll cycles.
#[derive(Debug, Clone)]
pub struct CycleHistory {
    path: PathBuf,
}

impl CycleHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row. The header is written when the file is new or empty.
    pub fn append(&self, stats: &CycleStats) -> Result<()> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        debug!(path = %self.path.display(), cycle = stats.cycle, needs_header, "Appending cycle record");

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file '{}'", self.path.display()))?;

        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(stats)?;
        writer.flush()?;

        Ok(())
    }

    /// [`append`](Self::append) on the blocking pool, for use inside the poll loop.
    pub async fn append_async(&self, stats: CycleStats) -> Result<()> {
        let history = self.clone();
        tokio::task::spawn_blocking(move || history.append(&stats)).await?
    }
}

#[derive(Serialize)]
struct BusRow<'a> {
    index: usize,
    route_description: &'a str,
    latitude: f64,
    longitude: f64,
    route_color: &'a str,
}

/// Writes `snapshot` to `path`, replacing any previous export.
pub fn write_snapshot_csv(path: &Path, snapshot: &BusSnapshot) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create snapshot file '{}'", path.display()))?;

    for (index, bus) in snapshot.iter().enumerate() {
        writer.serialize(BusRow {
            index,
            route_description: &bus.route_description,
            latitude: bus.latitude,
            longitude: bus.longitude,
            route_color: &bus.route_color,
        })?;
    }
    writer.flush()?;

    info!(path = %path.display(), buses = snapshot.len(), "Snapshot exported");
    Ok(())
}

/// Logs one line per active bus, in marker order.
pub fn log_snapshot(snapshot: &BusSnapshot) {
    for (index, bus) in snapshot.iter().enumerate() {
        info!(
            index,
            route = %bus.route_description,
            lat = bus.latitude,
            lon = bus.longitude,
            color = %bus.route_color,
            "Bus"
        );
    }
}
