//! Short-range AQI projection from recent history
//!
//! The projection is a flat line at the mean of the most recent readings,
//! clamped to the 0-500 reporting scale, one point per day after the latest
//! reading.

use crate::band::SeverityBand;
use crate::reading::AqiReading;
use crate::{Error, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How many of the most recent readings feed the mean
pub const FORECAST_WINDOW: usize = 10;

/// Days projected when the caller does not ask for a count
pub const DEFAULT_FORECAST_DAYS: u32 = 3;

/// Upper end of the reporting scale
pub const SCALE_MAX: f64 = 500.0;

/// One projected day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub aqi: f64,
    pub category: String,
    pub color: String,
}

/// Project `days` daily values from a location's reading history
///
/// History order does not matter. Fails with `NotFound` for an empty history.
pub fn project(history: &[AqiReading], days: u32) -> Result<Vec<ForecastPoint>> {
    let mut recent: Vec<&AqiReading> = history.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(FORECAST_WINDOW);

    let latest = recent
        .first()
        .ok_or_else(|| Error::NotFound("No readings to forecast from".to_string()))?;
    let last_date = latest.timestamp.date_naive();

    let mean = recent.iter().map(|r| r.value as f64).sum::<f64>() / recent.len() as f64;
    let projected = (mean.clamp(0.0, SCALE_MAX) * 10.0).round() / 10.0;
    let band = SeverityBand::for_value(projected.round() as u32);

    Ok((1..=days as i64)
        .map(|offset| ForecastPoint {
            date: last_date + Duration::days(offset),
            aqi: projected,
            category: band.label().to_string(),
            color: band.color().to_string(),
        })
        .collect())
}
