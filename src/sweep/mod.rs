//! Periodic progression sweep
//!
//! Refreshes every moving shipment on a fixed interval. Shipments are
//! refreshed concurrently up to a limit. Those that moved are saved together
//! in one write with the store's version check, so a sweep never overwrites
//! an admin change made while it was running.

use crate::geo::{ReverseGeocoder, RouteProvider};
use crate::progress::Tracker;
use crate::shipment::Shipment;
use crate::store::ShipmentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Shipments eligible for a refresh
    pub examined: usize,
    /// Shipments whose new position was committed
    pub updated: usize,
    /// Shipments changed by someone else mid-sweep
    pub conflicts: usize,
}

/// Whether a shipment takes part in the sweep
pub fn eligible(shipment: &Shipment) -> bool {
    let progress = &shipment.auto_progress;
    progress.enabled
        && !progress.paused
        && !shipment.is_manual()
        && shipment.status.is_active()
        && shipment.origin().is_some()
        && shipment.destination().is_some()
}

/// Refresh every eligible shipment once, as of `now`
pub async fn run_once<R, G>(
    store: &Arc<ShipmentStore>,
    tracker: &Arc<Tracker<R, G>>,
    now: DateTime<Utc>,
    max_concurrency: usize,
) -> SweepReport
where
    R: RouteProvider + 'static,
    G: ReverseGeocoder + 'static,
{
    let candidates: Vec<Shipment> = store.list().await.into_iter().filter(eligible).collect();
    let mut report = SweepReport {
        examined: candidates.len(),
        ..SweepReport::default()
    };

    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for mut shipment in candidates {
        let tracker = Arc::clone(tracker);
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            let update = tracker.refresh_position(&mut shipment, now).await?;
            update.changed.then_some(shipment)
        });
    }

    let mut moved = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(shipment)) => moved.push(shipment),
            Ok(None) => {}
            Err(e) => warn!("Sweep task failed: {}", e),
        }
    }

    match store.commit_many(moved).await {
        Ok(outcome) => {
            for id in &outcome.conflicts {
                debug!("{}: skipped, changed during sweep", id);
            }
            report.updated = outcome.committed.len();
            report.conflicts = outcome.conflicts.len();
        }
        Err(e) => warn!("Failed to save sweep positions: {}", e),
    }

    report
}

/// Sweep forever on `interval`
pub async fn run<R, G>(
    store: Arc<ShipmentStore>,
    tracker: Arc<Tracker<R, G>>,
    interval: Duration,
    max_concurrency: usize,
) where
    R: RouteProvider + 'static,
    G: ReverseGeocoder + 'static,
{
    info!("Progression sweep every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let report = run_once(&store, &tracker, Utc::now(), max_concurrency).await;
        if report.updated > 0 || report.conflicts > 0 {
            info!(
                "Sweep: {} examined, {} updated, {} conflicts",
                report.examined, report.updated, report.conflicts
            );
        } else {
            debug!("Sweep: {} examined, nothing moved", report.examined);
        }
    }
}
