//! List command handler

use crate::config::Config;
use crate::error::Result;
use crate::shipment::ShipmentStatus;
use crate::store::ShipmentStore;
use clap::Args;

/// List command arguments
#[derive(Args)]
pub struct ListArgs {
    /// Only show shipments with this status
    #[arg(long, short = 's')]
    pub status: Option<ShipmentStatus>,
}

/// Run the list command
pub async fn run(args: ListArgs) -> Result<()> {
    let config = Config::load()?;
    let store = ShipmentStore::open(config.shipments_path()?).await?;

    let shipments: Vec<_> = store
        .list()
        .await
        .into_iter()
        .filter(|s| args.status.map_or(true, |status| s.status == status))
        .collect();

    if shipments.is_empty() {
        println!("No shipments.");
        return Ok(());
    }

    println!("Shipments ({} of {}):\n", shipments.len(), store.len().await);
    for s in &shipments {
        println!(
            "  {}  {:17} {} -> {}  [{}]{}",
            s.tracking_id,
            s.status.title(),
            s.sender.address.city,
            s.recipient.address.city,
            s.current_location.city,
            if s.auto_progress.paused { " (paused)" } else { "" }
        );
    }

    Ok(())
}
