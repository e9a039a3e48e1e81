//! Per-subscription alert history and delivery cooldown
//!
//! All functions take `now` instead of reading the clock, so cooldown
//! behavior is deterministic in tests.

use airwatch_engine::AlertDecision;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One recorded decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub subscription_id: Uuid,
    #[serde(flatten)]
    pub decision: AlertDecision,
    pub recorded_at: DateTime<Utc>,
    /// True when the record came from an on-demand check rather than the monitor
    pub is_test: bool,
    /// Whether the decision was handed to the delivery sink
    pub delivered: bool,
}

#[derive(Debug, Default)]
struct Entry {
    last_delivered: Option<DateTime<Utc>>,
    records: VecDeque<AlertRecord>,
}

/// Shared, bounded alert history
#[derive(Debug, Clone)]
pub struct AlertHistory {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    cooldown: Duration,
    limit: usize,
}

impl AlertHistory {
    pub fn new(cooldown: Duration, limit: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            cooldown,
            limit: limit.max(1),
        }
    }

    /// True if a delivery for `id` at `now` would fall inside the cooldown
    ///
    /// The cooldown is a half-open window: exactly `cooldown` after the last
    /// delivery is allowed again.
    pub async fn in_cooldown(&self, id: Uuid, now: DateTime<Utc>) -> bool {
        let map = self.inner.read().await;
        match map.get(&id).and_then(|e| e.last_delivered) {
            Some(last) => now - last < self.cooldown,
            None => false,
        }
    }

    /// Append a record, trimming to the configured limit
    pub async fn record(&self, record: AlertRecord) {
        let mut map = self.inner.write().await;
        let entry = map.entry(record.subscription_id).or_default();
        if record.delivered {
            entry.last_delivered = Some(record.recorded_at);
        }
        entry.records.push_back(record);
        while entry.records.len() > self.limit {
            entry.records.pop_front();
        }
    }

    /// Records for one subscription, oldest first
    pub async fn for_subscription(&self, id: Uuid) -> Vec<AlertRecord> {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|e| e.records.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget a subscription (after it is removed)
    pub async fn forget(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airwatch_engine::AlertLevel;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn record(id: Uuid, at: DateTime<Utc>, delivered: bool, aqi: u32) -> AlertRecord {
        AlertRecord {
            subscription_id: id,
            decision: AlertDecision {
                level: AlertLevel::Warning,
                message: format!("Delhi: AQI {}", aqi),
                triggered: true,
                current_aqi: aqi,
                threshold: 100,
                location: "Delhi".to_string(),
                category: "Unhealthy".to_string(),
            },
            recorded_at: at,
            is_test: false,
            delivered,
        }
    }

    #[tokio::test]
    async fn test_no_history_means_no_cooldown() {
        let history = AlertHistory::new(Duration::minutes(120), 10);
        assert!(!history.in_cooldown(Uuid::new_v4(), fixed_now()).await);
    }

    #[tokio::test]
    async fn test_cooldown_window_is_half_open() {
        let history = AlertHistory::new(Duration::minutes(120), 10);
        let id = Uuid::new_v4();
        history.record(record(id, fixed_now(), true, 160)).await;

        assert!(history.in_cooldown(id, fixed_now() + Duration::minutes(119)).await);
        assert!(!history.in_cooldown(id, fixed_now() + Duration::minutes(120)).await);
    }

    #[tokio::test]
    async fn test_undelivered_records_do_not_start_cooldown() {
        let history = AlertHistory::new(Duration::minutes(120), 10);
        let id = Uuid::new_v4();
        history.record(record(id, fixed_now(), false, 160)).await;
        assert!(!history.in_cooldown(id, fixed_now()).await);
    }

    #[tokio::test]
    async fn test_history_keeps_most_recent() {
        let history = AlertHistory::new(Duration::minutes(0), 10);
        let id = Uuid::new_v4();
        for i in 0..15u32 {
            history
                .record(record(id, fixed_now() + Duration::minutes(i as i64), true, 100 + i))
                .await;
        }
        let kept = history.for_subscription(id).await;
        assert_eq!(kept.len(), 10);
        assert_eq!(kept[0].decision.current_aqi, 105);
        assert_eq!(kept[9].decision.current_aqi, 114);
    }

    #[tokio::test]
    async fn test_forget_clears() {
        let history = AlertHistory::new(Duration::minutes(120), 10);
        let id = Uuid::new_v4();
        history.record(record(id, fixed_now(), true, 160)).await;
        history.forget(id).await;
        assert!(history.for_subscription(id).await.is_empty());
        assert!(!history.in_cooldown(id, fixed_now()).await);
    }
}
