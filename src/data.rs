use crate::types::{Region, SampleRow};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::path::Path;

pub const REGIONS: [Region; 10] = [
    Region { name: "New York", lat: 40.7128, lon: -74.0060, base_health: 82.0 },
    Region { name: "Los Angeles", lat: 34.0522, lon: -118.2437, base_health: 80.0 },
    Region { name: "Chicago", lat: 41.8781, lon: -87.6298, base_health: 78.0 },
    Region { name: "Houston", lat: 29.7604, lon: -95.3698, base_health: 76.0 },
    Region { name: "Phoenix", lat: 33.4484, lon: -112.0740, base_health: 81.0 },
    Region { name: "Philadelphia", lat: 39.9526, lon: -75.1652, base_health: 77.0 },
    Region { name: "San Antonio", lat: 29.4241, lon: -98.4936, base_health: 79.0 },
    Region { name: "San Diego", lat: 32.7157, lon: -117.1611, base_health: 83.0 },
    Region { name: "Dallas", lat: 32.7767, lon: -96.7970, base_health: 78.0 },
    Region { name: "San Jose", lat: 37.3382, lon: -121.8863, base_health: 84.0 },
];

/// Writes `rows` as CSV with a header line, replacing any existing file.
pub fn write_samples(path: &Path, rows: &[SampleRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write row for region {}", row.region))?;
    }
    wtr.flush().with_context(|| format!("Failed to flush CSV file: {:?}", path))?;
    Ok(())
}
