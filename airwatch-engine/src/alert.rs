//! Threshold alert evaluation
//!
//! Decision rule, for a reading compared against a subscription threshold:
//!
//! | Condition                                         | Level   |
//! |---------------------------------------------------|---------|
//! | value <= threshold                                | INFO    |
//! | over by less than 50, band below Very Unhealthy   | WARNING |
//! | over by 50 or more, or band Very Unhealthy and up | ALERT   |
//!
//! Evaluation is pure: no I/O, no mutation of the subscription. Callers are
//! expected to pass a reading for the subscription's own location.

use crate::band::SeverityBand;
use crate::reading::AqiReading;
use crate::recommend::recommend;
use crate::registry::SubscriptionRegistry;
use crate::subscription::{location_key, Subscription};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Exceedance at or beyond which a WARNING becomes an ALERT
pub const ALERT_MARGIN: u32 = 50;

/// Alert severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Alert,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Info => "INFO",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Alert => "ALERT",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing one reading against one subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub level: AlertLevel,
    pub message: String,
    pub triggered: bool,
    pub current_aqi: u32,
    pub threshold: u32,
    pub location: String,
    pub category: String,
}

/// Decide whether `reading` crosses `subscription`'s threshold
pub fn evaluate(subscription: &Subscription, reading: &AqiReading) -> AlertDecision {
    let band = reading.band();
    let current = reading.value;
    let threshold = subscription.threshold;
    let location = subscription.location.as_str();
    let label = band.label();
    let triggered = current > threshold;

    let (level, message) = if !triggered {
        (
            AlertLevel::Info,
            format!(
                "{}: current AQI {} ({}) is within your threshold of {}.",
                location, current, label, threshold
            ),
        )
    } else {
        let margin = current - threshold;
        let guidance = recommend(band, &subscription.person_context);
        if margin >= ALERT_MARGIN || band >= SeverityBand::VeryUnhealthy {
            (
                AlertLevel::Alert,
                format!(
                    "URGENT: {} AQI is {} ({}), {} above your threshold of {}. {}.",
                    location,
                    current,
                    label,
                    margin,
                    threshold,
                    guidance.recommendations.join(". ")
                ),
            )
        } else {
            (
                AlertLevel::Warning,
                format!(
                    "{}: AQI {} ({}) exceeds your threshold of {} by {}. Take care: {}.",
                    location, current, label, threshold, margin, guidance.recommendations[0]
                ),
            )
        }
    };

    AlertDecision {
        level,
        message,
        triggered,
        current_aqi: current,
        threshold,
        location: subscription.location.clone(),
        category: label.to_string(),
    }
}

/// Evaluate every registered subscription against the reading for its location
///
/// `readings` is keyed by location name; matching is case-insensitive.
/// Subscriptions with no reading for their location are skipped.
pub async fn evaluate_all(
    registry: &dyn SubscriptionRegistry,
    readings: &[AqiReading],
) -> Result<Vec<(Subscription, AlertDecision)>> {
    let by_location: HashMap<String, &AqiReading> = readings
        .iter()
        .map(|reading| (location_key(&reading.location), reading))
        .collect();

    let subscriptions = registry.list().await?;
    Ok(subscriptions
        .into_iter()
        .filter_map(|subscription| {
            let reading = by_location.get(&subscription.location_key())?;
            let decision = evaluate(&subscription, reading);
            Some((subscription, decision))
        })
        .collect())
}
