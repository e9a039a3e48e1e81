//! # Airwatch Engine
//!
//! AQI advisory and alerting rules shared by every Airwatch surface:
//! - Category classification (one band table for color, label, marker size)
//! - Personalized health recommendations
//! - Threshold alert evaluation
//! - Subscription registry contract
//! - Heatmap/statistics and forecast helpers
//! - Configuration loading

pub mod alert;
pub mod band;
pub mod config;
pub mod context;
pub mod error;
pub mod forecast;
pub mod heatmap;
pub mod reading;
pub mod recommend;
pub mod registry;
pub mod subscription;

pub use alert::{evaluate, evaluate_all, AlertDecision, AlertLevel};
pub use band::{classify, parse_aqi, SeverityBand};
pub use context::{AgeGroup, HealthCondition, PersonContext};
pub use error::{Error, Result};
pub use reading::AqiReading;
pub use recommend::{advise, recommend, Advice, AdvisoryLevel, AdvisoryMessage, Recommendation};
pub use registry::{InMemoryRegistry, SubscriptionRegistry};
pub use subscription::{NewSubscription, Subscription, SubscriptionUpdate};
