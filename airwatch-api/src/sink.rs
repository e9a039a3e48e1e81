//! Delivery channel for alert notifications
//!
//! Actual push delivery (FCM, APNS, web push, SMS) lives outside this
//! service. The monitor only hands notifications to an [`AlertSink`].

use airwatch_engine::{AlertDecision, PersonContext};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// Payload handed to the delivery channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertNotification {
    pub subscription_id: Uuid,
    pub owner: Option<String>,
    pub person_context: PersonContext,
    #[serde(flatten)]
    pub decision: AlertDecision,
    pub timestamp: DateTime<Utc>,
}

/// Something that can deliver an alert to a subscriber
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, notification: &AlertNotification) -> Result<()>;
}

/// Default sink: writes each notification to the log
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, notification: &AlertNotification) -> Result<()> {
        warn!(
            subscription = %notification.subscription_id,
            location = %notification.decision.location,
            aqi = notification.decision.current_aqi,
            threshold = notification.decision.threshold,
            level = %notification.decision.level,
            "Push notification: {}",
            notification.decision.message
        );
        Ok(())
    }
}

/// Sink that keeps notifications in memory; handy for tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    delivered: Arc<Mutex<Vec<AlertNotification>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<AlertNotification> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl AlertSink for CollectingSink {
    async fn deliver(&self, notification: &AlertNotification) -> Result<()> {
        self.delivered.lock().await.push(notification.clone());
        Ok(())
    }
}
