//! Sweep command handler
//!
//! Runs the progression sweep over the store without the web server.

use crate::config::Config;
use crate::error::Result;
use crate::geo::cities::CityIndex;
use crate::progress::Tracker;
use crate::store::ShipmentStore;
use crate::sweep;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

/// Sweep command arguments
#[derive(Args)]
pub struct SweepArgs {
    /// Sweep once, print the report and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between sweeps (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

/// Run the sweep command
pub async fn run(args: SweepArgs) -> Result<()> {
    super::init_logging();

    let mut config = Config::load()?;
    if let Some(secs) = args.interval {
        config.sweep.interval_secs = secs;
    }

    let store = Arc::new(ShipmentStore::open(config.shipments_path()?).await?);
    let tracker = Arc::new(Tracker::from_config(&config, Arc::new(CityIndex::new()))?);
    let concurrency = config.sweep.max_concurrency;

    if args.once {
        let report = sweep::run_once(&store, &tracker, Utc::now(), concurrency).await;
        println!(
            "Examined {} shipments: {} updated, {} conflicts",
            report.examined, report.updated, report.conflicts
        );
        return Ok(());
    }

    sweep::run(store, tracker, config.sweep_interval(), concurrency).await;
    Ok(())
}
