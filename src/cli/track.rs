//! Track command handler
//!
//! Computes the current position of one shipment and prints it.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{available_formats, get_formatter, TrackingReport};
use crate::geo::cities::CityIndex;
use crate::progress::Tracker;
use crate::store::ShipmentStore;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;
use tracing::warn;

/// Track command arguments
#[derive(Args)]
pub struct TrackArgs {
    /// Tracking ID (case-insensitive)
    pub tracking_id: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Save the new position to the store
    #[arg(long)]
    pub save: bool,

    /// Write output to file
    #[arg(short, long)]
    pub output: Option<String>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

/// Run the track command
pub async fn run(args: TrackArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    let tracking_id = args
        .tracking_id
        .ok_or_else(|| Error::InvalidShipment("A tracking ID is required".to_string()))?;
    let formatter = get_formatter(&args.format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", args.format)))?;

    super::init_logging();
    let config = Config::load()?;
    let store = ShipmentStore::open(config.shipments_path()?).await?;
    let tracker = Tracker::from_config(&config, Arc::new(CityIndex::new()))?;

    let mut shipment = store
        .get(&tracking_id)
        .await
        .ok_or_else(|| Error::NotFound(tracking_id.clone()))?;

    let now = Utc::now();
    let update = tracker.refresh_position(&mut shipment, now).await;

    if args.save && update.as_ref().is_some_and(|u| u.changed) {
        match store.commit(shipment.clone()).await {
            Ok(saved) => shipment = saved,
            Err(e) => warn!("{}: position not saved: {}", shipment.tracking_id, e),
        }
    }

    let report = TrackingReport::new(shipment, update.map(|u| u.progress), now);
    let output = formatter.format(&report)?;

    // Write output
    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Wrote {} report to {}", formatter.name(), path);
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:6} - {}", format.name, format.description);
    }
}
