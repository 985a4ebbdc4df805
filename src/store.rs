//! Holder of the current race-data snapshot.
//!
//! Readers grab an `Arc` to the snapshot and keep using it for as long as
//! they need; a refresh builds a complete new snapshot off to the side and
//! replaces the pointer in one step. A failed refresh leaves the previous
//! snapshot in place.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::error::IngestError;
use crate::ratios::{DataSourceMode, RaceDataSnapshot};
use crate::source::RaceDataSource;

/// Counts reported after a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub races: usize,
    pub default_ratios: usize,
    pub eu_races: usize,
    pub eu_ratios: usize,
}

#[derive(Clone)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<RaceDataSnapshot>>>,
    /// Serialises refreshes so two fetches never race to the swap.
    refresh_lock: Arc<Mutex<()>>,
    source: Arc<dyn RaceDataSource>,
}

impl SnapshotStore {
    /// Create a store holding an empty snapshot.
    pub fn new(source: Arc<dyn RaceDataSource>) -> Self {
        SnapshotStore {
            current: Arc::new(RwLock::new(Arc::new(RaceDataSnapshot::empty()))),
            refresh_lock: Arc::new(Mutex::new(())),
            source,
        }
    }

    pub async fn snapshot(&self) -> Arc<RaceDataSnapshot> {
        self.current.read().await.clone()
    }

    /// Fetch, parse and swap in a new snapshot.
    pub async fn refresh(&self) -> Result<RefreshSummary, IngestError> {
        let _guard = self.refresh_lock.lock().await;

        let feeds = self.source.fetch().await?;
        let snapshot = RaceDataSnapshot::build(&feeds.default_csv, feeds.eu_winners_csv.as_deref());

        if snapshot.table(DataSourceMode::Default).is_empty() {
            return Err(IngestError::NoRatios(self.source.name().to_string()));
        }

        let summary = RefreshSummary {
            races: snapshot.race_count(),
            default_ratios: snapshot.table(DataSourceMode::Default).len(),
            eu_races: snapshot.eu_race_count(),
            eu_ratios: snapshot.table(DataSourceMode::EuWinner).len(),
        };

        *self.current.write().await = Arc::new(snapshot);
        info!(
            "Race data refreshed from {}: {} races, {} ratios, {} EU races, {} EU ratios",
            self.source.name(),
            summary.races,
            summary.default_ratios,
            summary.eu_races,
            summary.eu_ratios
        );
        Ok(summary)
    }

    /// Spawn a background task that refreshes on a fixed interval.
    /// The first tick fires after one full interval.
    pub fn spawn_periodic_refresh(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = store.refresh().await {
                    error!("Scheduled race data refresh failed: {}", e);
                }
            }
        })
    }
}
