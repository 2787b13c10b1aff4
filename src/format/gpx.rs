//! GPX output formatter

use crate::coord::Coordinates;
use crate::error::Result;
use crate::format::{OutputFormatter, TrackingReport};

/// GPX formatter - origin, destination and current position as waypoints,
/// plus the road route as a track
pub struct GpxFormatter;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn waypoint(gpx: &mut String, coords: Coordinates, name: &str, desc: &str, symbol: &str) {
    gpx.push_str(&format!(r#"  <wpt lat="{}" lon="{}">"#, coords.lat, coords.lng));
    gpx.push('\n');
    gpx.push_str(&format!("    <name>{}</name>\n", escape(name)));
    if !desc.is_empty() {
        gpx.push_str(&format!("    <desc>{}</desc>\n", escape(desc)));
    }
    gpx.push_str(&format!("    <sym>{}</sym>\n", symbol));
    gpx.push_str("  </wpt>\n");
}

impl OutputFormatter for GpxFormatter {
    fn name(&self) -> &str {
        "gpx"
    }

    fn description(&self) -> &str {
        "GPX waypoints and route track"
    }

    fn format(&self, report: &TrackingReport) -> Result<String> {
        let shipment = &report.shipment;
        let mut gpx = String::new();

        // XML header
        gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        gpx.push('\n');
        gpx.push_str(r#"<gpx version="1.1" creator="cargowatch">"#);
        gpx.push('\n');

        // Metadata
        gpx.push_str("  <metadata>\n");
        gpx.push_str(&format!("    <name>Shipment {}</name>\n", escape(&shipment.tracking_id)));
        gpx.push_str(&format!("    <time>{}</time>\n", report.generated_at.to_rfc3339()));
        gpx.push_str("  </metadata>\n");

        if let Some(origin) = shipment.origin() {
            waypoint(&mut gpx, origin, "Origin", &shipment.sender.address.display(), "Flag, Green");
        }
        if let Some(destination) = shipment.destination() {
            waypoint(
                &mut gpx,
                destination,
                "Destination",
                &shipment.recipient.address.display(),
                "Flag, Red",
            );
        }
        if let Some(current) = shipment.current_location.coordinates() {
            let desc = match report.progress {
                Some(p) => format!("{} ({:.1}%)", shipment.current_location.city, p * 100.0),
                None => shipment.current_location.city.clone(),
            };
            waypoint(&mut gpx, current, "Current position", &desc, "Truck");
        }

        if let Some(geometry) = shipment.route_geometry.as_deref().filter(|g| !g.is_empty()) {
            gpx.push_str("  <trk>\n");
            gpx.push_str("    <name>Route</name>\n");
            gpx.push_str("    <trkseg>\n");
            for [lat, lng] in geometry {
                gpx.push_str(&format!(r#"      <trkpt lat="{}" lon="{}"/>"#, lat, lng));
                gpx.push('\n');
            }
            gpx.push_str("    </trkseg>\n");
            gpx.push_str("  </trk>\n");
        }

        gpx.push_str("</gpx>\n");
        Ok(gpx)
    }
}
