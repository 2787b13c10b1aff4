//! cargowatch CLI entry point
//!
//! Shipment tracking server, sweep runner and admin tools

use cargowatch::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
