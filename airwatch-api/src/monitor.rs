//! Background subscription monitor
//!
//! Each sweep evaluates every subscription against the latest stored reading
//! for its location and delivers triggered decisions that are outside the
//! subscription's cooldown.

use crate::db::readings::latest_per_location;
use crate::history::{AlertHistory, AlertRecord};
use crate::sink::{AlertNotification, AlertSink};
use airwatch_engine::{evaluate_all, Result, SubscriptionRegistry};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub evaluated: usize,
    pub triggered: usize,
    pub delivered: usize,
    pub suppressed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct AlertMonitor {
    registry: Arc<dyn SubscriptionRegistry>,
    db: SqlitePool,
    history: AlertHistory,
    sink: Arc<dyn AlertSink>,
}

impl AlertMonitor {
    pub fn new(
        registry: Arc<dyn SubscriptionRegistry>,
        db: SqlitePool,
        history: AlertHistory,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            registry,
            db,
            history,
            sink,
        }
    }

    /// Run one sweep at `now`
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        let readings = latest_per_location(&self.db).await?;
        let results = evaluate_all(self.registry.as_ref(), &readings).await?;

        let mut summary = SweepSummary {
            evaluated: results.len(),
            ..Default::default()
        };

        for (subscription, decision) in results {
            if !decision.triggered {
                continue;
            }
            summary.triggered += 1;

            if self.history.in_cooldown(subscription.id, now).await {
                debug!(
                    "Alert for subscription {} suppressed by cooldown",
                    subscription.id
                );
                summary.suppressed += 1;
                continue;
            }

            let notification = AlertNotification {
                subscription_id: subscription.id,
                owner: subscription.owner.clone(),
                person_context: subscription.person_context.clone(),
                decision: decision.clone(),
                timestamp: now,
            };

            let delivered = match self.sink.deliver(&notification).await {
                Ok(()) => {
                    summary.delivered += 1;
                    true
                }
                Err(e) => {
                    error!(
                        "Failed to deliver alert for subscription {}: {}",
                        subscription.id, e
                    );
                    summary.failed += 1;
                    false
                }
            };

            self.history
                .record(AlertRecord {
                    subscription_id: subscription.id,
                    decision,
                    recorded_at: now,
                    is_test: false,
                    delivered,
                })
                .await;
        }

        Ok(summary)
    }

    /// Sweep forever on a fixed interval; errors are logged and the loop continues
    pub async fn run(self, interval: Duration) {
        info!("Alert monitor started (interval {}s)", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.sweep(Utc::now()).await {
                Ok(summary) => info!(
                    "Monitor sweep: {} evaluated, {} triggered, {} delivered, {} suppressed, {} failed",
                    summary.evaluated,
                    summary.triggered,
                    summary.delivered,
                    summary.suppressed,
                    summary.failed
                ),
                Err(e) => error!("Monitor sweep failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, readings::insert_reading, SqliteRegistry};
    use crate::sink::CollectingSink;
    use airwatch_engine::{AqiReading, NewSubscription, PersonContext};
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 3, 8, 0, 0).unwrap()
    }

    struct FailingSink;

    #[async_trait]
    impl AlertSink for FailingSink {
        async fn deliver(&self, _notification: &AlertNotification) -> anyhow::Result<()> {
            anyhow::bail!("push gateway unavailable")
        }
    }

    async fn setup(sink: Arc<dyn AlertSink>) -> (AlertMonitor, Arc<SqliteRegistry>, AlertHistory, SqlitePool) {
        let pool = init_in_memory().await.unwrap();
        let registry = Arc::new(SqliteRegistry::new(pool.clone()));
        let history = AlertHistory::new(chrono::Duration::minutes(120), 10);
        let monitor = AlertMonitor::new(registry.clone(), pool.clone(), history.clone(), sink);
        (monitor, registry, history, pool)
    }

    #[tokio::test]
    async fn test_sweep_delivers_then_respects_cooldown() {
        let sink = CollectingSink::new();
        let (monitor, registry, history, pool) = setup(Arc::new(sink.clone())).await;

        let sub = registry
            .create(NewSubscription::new("Delhi", 100, PersonContext::default()))
            .await
            .unwrap();
        registry
            .create(NewSubscription::new("Chennai", 100, PersonContext::default()))
            .await
            .unwrap();
        insert_reading(&pool, &AqiReading::new(180, "Delhi", fixed_now()).unwrap())
            .await
            .unwrap();
        insert_reading(&pool, &AqiReading::new(60, "Chennai", fixed_now()).unwrap())
            .await
            .unwrap();

        let first = monitor.sweep(fixed_now()).await.unwrap();
        assert_eq!(first.evaluated, 2);
        assert_eq!(first.triggered, 1);
        assert_eq!(first.delivered, 1);

        let delivered = sink.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].subscription_id, sub.id);

        let second = monitor
            .sweep(fixed_now() + chrono::Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(second.delivered, 0);
        assert_eq!(second.suppressed, 1);

        let third = monitor
            .sweep(fixed_now() + chrono::Duration::minutes(120))
            .await
            .unwrap();
        assert_eq!(third.delivered, 1);
        assert_eq!(history.for_subscription(sub.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_recorded_but_not_cooled_down() {
        let (monitor, registry, history, pool) = setup(Arc::new(FailingSink)).await;
        let sub = registry
            .create(NewSubscription::new("Delhi", 50, PersonContext::default()))
            .await
            .unwrap();
        insert_reading(&pool, &AqiReading::new(120, "Delhi", fixed_now()).unwrap())
            .await
            .unwrap();

        let summary = monitor.sweep(fixed_now()).await.unwrap();
        assert_eq!(summary.failed, 1);
        let records = history.for_subscription(sub.id).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].delivered);
        assert!(!history.in_cooldown(sub.id, fixed_now()).await);
    }
}
