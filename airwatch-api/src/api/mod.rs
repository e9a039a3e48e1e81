//! HTTP API handlers for airwatch-api

pub mod advisory;
pub mod alerts;
pub mod dashboard;
pub mod health;
pub mod readings;
pub mod subscriptions;

pub use advisory::advisory_routes;
pub use alerts::alert_routes;
pub use dashboard::dashboard_routes;
pub use health::health_routes;
pub use readings::reading_routes;
pub use subscriptions::subscription_routes;

use airwatch_engine::band::{aqi_from_f64, parse_aqi, validate_aqi};
use airwatch_engine::{Error, Result};
use serde_json::Value;

/// Accept an AQI as a JSON number or numeric string
pub(crate) fn aqi_from_json(value: &Value) -> Result<u32> {
    match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_i64() {
                validate_aqi(whole)
            } else if let Some(big) = n.as_u64() {
                Ok(u32::try_from(big).unwrap_or(u32::MAX))
            } else {
                aqi_from_f64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => parse_aqi(s),
        Value::Null => Err(Error::InvalidReading("AQI is required".to_string())),
        other => Err(Error::InvalidReading(format!("AQI is not a number: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aqi_from_json_forms() {
        assert_eq!(aqi_from_json(&json!(153)).unwrap(), 153);
        assert_eq!(aqi_from_json(&json!(152.6)).unwrap(), 153);
        assert_eq!(aqi_from_json(&json!("87")).unwrap(), 87);
        assert!(matches!(aqi_from_json(&json!(-4)), Err(Error::InvalidReading(_))));
        assert!(matches!(aqi_from_json(&json!("bad")), Err(Error::InvalidReading(_))));
        assert!(matches!(aqi_from_json(&json!(null)), Err(Error::InvalidReading(_))));
        assert!(matches!(aqi_from_json(&json!([1])), Err(Error::InvalidReading(_))));
    }
}
