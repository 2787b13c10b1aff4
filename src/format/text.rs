//! Human-readable text output formatter

use crate::error::Result;
use crate::format::{OutputFormatter, TrackingReport};

/// Text formatter - outputs a human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, report: &TrackingReport) -> Result<String> {
        let shipment = &report.shipment;
        let mut output = String::new();

        // Header
        output.push_str(&format!("Shipment {}\n", shipment.tracking_id));
        output.push_str(&format!("Status: {}\n", shipment.status.title()));
        output.push_str(&format!("From: {}\n", shipment.sender.address.display()));
        output.push_str(&format!("To: {}\n", shipment.recipient.address.display()));

        let location = &shipment.current_location;
        match location.coordinates() {
            Some(c) => output.push_str(&format!(
                "Location: {} ({:.4}, {:.4}){}\n",
                location.city,
                c.lat,
                c.lng,
                if location.manual { " [manual]" } else { "" }
            )),
            None => output.push_str(&format!("Location: {}\n", location.city)),
        }

        if let Some(progress) = report.progress {
            output.push_str(&format!("Progress: {:.1}%\n", progress * 100.0));
        }
        if let Some(miles) = shipment.route_distance_miles {
            output.push_str(&format!("Route: {:.1} miles\n", miles));
        }
        if let Some(eta) = shipment.estimated_delivery {
            output.push_str(&format!("Estimated delivery: {}\n", eta.format("%Y-%m-%d %H:%M UTC")));
        }

        let auto = &shipment.auto_progress;
        if auto.paused {
            output.push_str(&format!(
                "Paused: {}\n",
                auto.pause_reason.as_deref().unwrap_or("yes")
            ));
        }

        // Journal, newest first
        if !shipment.events.is_empty() {
            output.push_str("\nHistory:\n");
            for event in shipment.events.iter().rev() {
                output.push_str(&format!(
                    "  {}  {}{}\n",
                    event.timestamp.format("%Y-%m-%d %H:%M"),
                    event.title,
                    if event.location.is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", event.location)
                    }
                ));
            }
        }

        Ok(output)
    }
}
