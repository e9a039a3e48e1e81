//! AQI readings supplied by the external data source

use crate::band::{validate_aqi, SeverityBand};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed AQI value for a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqiReading {
    pub value: u32,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

impl AqiReading {
    /// Build a reading; negative values fail with `InvalidReading`
    pub fn new(value: i64, location: impl Into<String>, timestamp: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            value: validate_aqi(value)?,
            location: location.into(),
            timestamp,
        })
    }

    pub fn band(&self) -> SeverityBand {
        SeverityBand::for_value(self.value)
    }
}
