//! Per-cell mutual exclusion for the "join an open game, else create one"
//! step of ingestion.
//!
//! The globe is cut into 1-degree cells per activity. An ingest locks every
//! cell its search area touches, in sorted order, and holds the guards until
//! its game decision is persisted. A ping whose area contains another ping's
//! location has locked that ping's own cell, so two pings that can see each
//! other never decide concurrently.
//!
//! Locks are process-local. Several backend instances sharing one database
//! would need the same keys on a shared lock service.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::domain::Area;

/// Entries are pruned once the map grows past this many idle cells.
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub activity: String,
    pub lat_cell: i32,
    pub lon_cell: i32,
}

fn cell_of(deg: f64) -> i32 {
    deg.floor() as i32
}

/// Every cell `area` overlaps, sorted and deduplicated.
pub fn cell_keys(activity: &str, area: &Area) -> Vec<CellKey> {
    let mut keys = Vec::new();
    for lat_cell in cell_of(area.lat_min)..=cell_of(area.lat_max) {
        for (lon_min, lon_max) in area.lon_ranges() {
            for lon_cell in cell_of(lon_min)..=cell_of(lon_max) {
                keys.push(CellKey {
                    activity: activity.to_string(),
                    lat_cell,
                    lon_cell,
                });
            }
        }
    }
    keys.sort();
    keys.dedup();
    keys
}

/// Held cells; dropping it releases them.
pub struct CellGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
    cells: usize,
}

impl CellGuard {
    pub fn cells(&self) -> usize {
        self.cells
    }
}

#[derive(Default)]
pub struct CellLocks {
    cells: DashMap<CellKey, Arc<Mutex<()>>>,
}

impl CellLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold every cell under `area` for `activity`.
    pub async fn lock_area(&self, activity: &str, area: &Area) -> CellGuard {
        self.prune_idle();

        let keys = cell_keys(activity, area);
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            // clone the Arc so no map shard stays locked across the await
            let cell = Arc::clone(&self.cells.entry(key.clone()).or_default());
            guards.push(cell.lock_owned().await);
        }
        trace!(activity, cells = keys.len(), "cell locks acquired");

        CellGuard {
            _guards: guards,
            cells: keys.len(),
        }
    }

    /// Number of cells currently tracked, held or idle.
    pub fn tracked(&self) -> usize {
        self.cells.len()
    }

    fn prune_idle(&self) {
        if self.cells.len() <= PRUNE_THRESHOLD {
            return;
        }
        // only the map itself references an idle cell
        self.cells.retain(|_, cell| Arc::strong_count(cell) > 1);
    }
}
