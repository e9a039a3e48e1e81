//! AQI severity bands and the category classifier
//!
//! This is the one authoritative band table. Anything that needs a color,
//! label, marker size or base guidance for an AQI value goes through
//! [`classify`] or [`SeverityBand::for_value`] instead of re-deriving it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier over the AQI scale, in ascending order of severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityBand {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl SeverityBand {
    /// All bands in scan order (lowest AQI first)
    pub const ALL: [SeverityBand; 6] = [
        SeverityBand::Good,
        SeverityBand::Moderate,
        SeverityBand::UnhealthySensitive,
        SeverityBand::Unhealthy,
        SeverityBand::VeryUnhealthy,
        SeverityBand::Hazardous,
    ];

    /// Inclusive lower bound
    pub fn lower_bound(self) -> u32 {
        match self {
            SeverityBand::Good => 0,
            SeverityBand::Moderate => 51,
            SeverityBand::UnhealthySensitive => 101,
            SeverityBand::Unhealthy => 151,
            SeverityBand::VeryUnhealthy => 201,
            SeverityBand::Hazardous => 301,
        }
    }

    /// Inclusive upper bound; `None` for the unbounded top band
    pub fn upper_bound(self) -> Option<u32> {
        match self {
            SeverityBand::Good => Some(50),
            SeverityBand::Moderate => Some(100),
            SeverityBand::UnhealthySensitive => Some(150),
            SeverityBand::Unhealthy => Some(200),
            SeverityBand::VeryUnhealthy => Some(300),
            SeverityBand::Hazardous => None,
        }
    }

    /// Display color as a hex string
    pub fn color(self) -> &'static str {
        match self {
            SeverityBand::Good => "#00e400",
            SeverityBand::Moderate => "#ffff00",
            SeverityBand::UnhealthySensitive => "#ff7e00",
            SeverityBand::Unhealthy => "#ff0000",
            SeverityBand::VeryUnhealthy => "#8f3f97",
            SeverityBand::Hazardous => "#7e0023",
        }
    }

    /// Short category label shown to users
    pub fn label(self) -> &'static str {
        match self {
            SeverityBand::Good => "Good",
            SeverityBand::Moderate => "Moderate",
            SeverityBand::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            SeverityBand::Unhealthy => "Unhealthy",
            SeverityBand::VeryUnhealthy => "Very Unhealthy",
            SeverityBand::Hazardous => "Hazardous",
        }
    }

    /// Outdoor-activity guidance for the general public
    pub fn base_guidance(self) -> &'static str {
        match self {
            SeverityBand::Good => "Air quality is good - perfect for outdoor activities",
            SeverityBand::Moderate => "Air quality is acceptable for most people",
            SeverityBand::UnhealthySensitive => "Sensitive groups should limit outdoor activities",
            SeverityBand::Unhealthy => "Everyone should limit outdoor activities",
            SeverityBand::VeryUnhealthy => "Avoid outdoor activities entirely",
            SeverityBand::Hazardous => "Emergency conditions - avoid all outdoor activities",
        }
    }

    /// Map-marker radius weight
    pub fn marker_radius(self) -> u32 {
        match self {
            SeverityBand::Good => 8,
            SeverityBand::Moderate => 12,
            SeverityBand::UnhealthySensitive => 16,
            SeverityBand::Unhealthy => 20,
            SeverityBand::VeryUnhealthy => 24,
            SeverityBand::Hazardous => 28,
        }
    }

    /// True if `aqi` falls inside this band's bounds
    pub fn contains(self, aqi: u32) -> bool {
        aqi >= self.lower_bound() && self.upper_bound().map_or(true, |upper| aqi <= upper)
    }

    /// Band for an already-validated AQI value
    pub fn for_value(aqi: u32) -> SeverityBand {
        SeverityBand::ALL
            .into_iter()
            .find(|band| band.contains(aqi))
            // Hazardous has no upper bound, so the scan always matches.
            .unwrap_or(SeverityBand::Hazardous)
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a raw AQI number into its severity band
///
/// Negative values fail with [`Error::InvalidReading`].
pub fn classify(aqi: i64) -> Result<SeverityBand> {
    Ok(SeverityBand::for_value(validate_aqi(aqi)?))
}

/// Check that a raw AQI is non-negative and narrow it to `u32`
pub fn validate_aqi(aqi: i64) -> Result<u32> {
    if aqi < 0 {
        return Err(Error::InvalidReading(format!(
            "AQI must be non-negative, got {}",
            aqi
        )));
    }
    Ok(u32::try_from(aqi).unwrap_or(u32::MAX))
}

/// Convert a floating-point AQI into a whole AQI value
///
/// Fractional values round to the nearest integer. NaN, infinities and
/// negative values fail with [`Error::InvalidReading`].
pub fn aqi_from_f64(value: f64) -> Result<u32> {
    if !value.is_finite() {
        return Err(Error::InvalidReading(format!(
            "AQI must be a finite number, got {}",
            value
        )));
    }
    if value < 0.0 {
        return Err(Error::InvalidReading(format!(
            "AQI must be non-negative, got {}",
            value
        )));
    }
    let rounded = value.round();
    if rounded >= u32::MAX as f64 {
        return Ok(u32::MAX);
    }
    Ok(rounded as u32)
}

/// Parse AQI text such as `"153"` or `"152.6"`
pub fn parse_aqi(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    if let Ok(whole) = trimmed.parse::<i64>() {
        return validate_aqi(whole);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| Error::InvalidReading(format!("AQI is not a number: {:?}", raw)))?;
    aqi_from_f64(value)
}
