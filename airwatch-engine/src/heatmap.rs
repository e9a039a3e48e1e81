//! Heatmap points and dashboard statistics
//!
//! Marker color and radius come from the band table; nothing here keeps its
//! own thresholds except the "unhealthy city" count, which uses the same
//! Moderate upper bound.

use crate::band::SeverityBand;
use crate::reading::AqiReading;
use serde::{Deserialize, Serialize};

/// AQI at which heatmap intensity saturates
pub const INTENSITY_CAP: f64 = 500.0;

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

const GAZETTEER: &[(&str, f64, f64)] = &[
    ("agra", 27.1767, 78.0081),
    ("ahmedabad", 23.0225, 72.5714),
    ("amritsar", 31.6340, 74.8723),
    ("bengaluru", 12.9716, 77.5946),
    ("bhopal", 23.2599, 77.4126),
    ("bhubaneswar", 20.2961, 85.8245),
    ("chandigarh", 30.7333, 76.7794),
    ("chennai", 13.0827, 80.2707),
    ("coimbatore", 11.0168, 76.9558),
    ("dehradun", 30.3165, 78.0322),
    ("delhi", 28.7041, 77.1025),
    ("faridabad", 28.4089, 77.3178),
    ("gurgaon", 28.4595, 77.0266),
    ("guwahati", 26.1445, 91.7362),
    ("hyderabad", 17.3850, 78.4867),
    ("indore", 22.7196, 75.8577),
    ("jaipur", 26.9124, 75.7873),
    ("kanpur", 26.4499, 80.3319),
    ("kochi", 9.9312, 76.2673),
    ("kolkata", 22.5726, 88.3639),
    ("lucknow", 26.8467, 80.9462),
    ("ludhiana", 30.9010, 75.8573),
    ("mumbai", 19.0760, 72.8777),
    ("nagpur", 21.1458, 79.0882),
    ("navi mumbai", 19.0330, 73.0297),
    ("noida", 28.5355, 77.3910),
    ("patna", 25.5941, 85.1376),
    ("pune", 18.5204, 73.8567),
    ("raipur", 21.2514, 81.6296),
    ("ranchi", 23.3441, 85.3096),
    ("srinagar", 34.0837, 74.7973),
    ("surat", 21.1702, 72.8311),
    ("thane", 19.2183, 72.9781),
    ("thiruvananthapuram", 8.5241, 76.9366),
    ("varanasi", 25.3176, 82.9739),
    ("visakhapatnam", 17.6868, 83.2185),
];

/// Look up a city's coordinates (case-insensitive)
pub fn coordinates(city: &str) -> Option<Coordinates> {
    let key = city.trim().to_lowercase();
    GAZETTEER
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(_, lat, lng)| Coordinates { lat: *lat, lng: *lng })
}

/// One marker on the heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    /// `aqi / 500`, capped at 1.0
    pub intensity: f64,
    pub city: String,
    pub aqi: u32,
    pub category: String,
    pub color: String,
    pub radius: u32,
    pub date: String,
}

/// Summary numbers for the dashboard header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiStatistics {
    pub total_cities: usize,
    pub avg_aqi: f64,
    pub max_aqi: u32,
    pub min_aqi: u32,
    /// Cities above the Moderate band
    pub unhealthy_cities: usize,
}

/// Heatmap markers for readings whose city is in the gazetteer
pub fn heatmap_points(readings: &[AqiReading]) -> Vec<HeatmapPoint> {
    readings
        .iter()
        .filter_map(|reading| {
            let coords = coordinates(&reading.location)?;
            let band = reading.band();
            Some(HeatmapPoint {
                lat: coords.lat,
                lng: coords.lng,
                intensity: (reading.value as f64 / INTENSITY_CAP).min(1.0),
                city: reading.location.clone(),
                aqi: reading.value,
                category: band.label().to_string(),
                color: band.color().to_string(),
                radius: band.marker_radius(),
                date: reading.timestamp.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}

/// Aggregate statistics; all zeros for no readings
pub fn statistics(readings: &[AqiReading]) -> AqiStatistics {
    if readings.is_empty() {
        return AqiStatistics {
            total_cities: 0,
            avg_aqi: 0.0,
            max_aqi: 0,
            min_aqi: 0,
            unhealthy_cities: 0,
        };
    }

    let values: Vec<u32> = readings.iter().map(|r| r.value).collect();
    let sum: u64 = values.iter().map(|v| *v as u64).sum();
    let avg = sum as f64 / values.len() as f64;
    let moderate_upper = SeverityBand::Moderate.upper_bound().unwrap_or(100);

    AqiStatistics {
        total_cities: values.len(),
        avg_aqi: (avg * 100.0).round() / 100.0,
        max_aqi: values.iter().copied().max().unwrap_or(0),
        min_aqi: values.iter().copied().min().unwrap_or(0),
        unhealthy_cities: values.iter().filter(|v| **v > moderate_upper).count(),
    }
}
