//! Subscription registry contract
//!
//! The engine reads subscriptions through [`SubscriptionRegistry`] and never
//! assumes more than "a read reflects the latest accepted write for that id".
//! Storage lives behind the trait: [`InMemoryRegistry`] here, a SQLite-backed
//! implementation in the API service.

use crate::subscription::{NewSubscription, Subscription, SubscriptionUpdate};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage-agnostic subscription store; implementations must tolerate
/// concurrent callers
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Validate and store a new subscription
    ///
    /// Fails with `Validation` when the threshold is outside `[0, 500]` or
    /// the location is empty.
    async fn create(&self, new: NewSubscription) -> Result<Subscription>;

    /// Fetch one subscription; `NotFound` if absent
    async fn get(&self, id: Uuid) -> Result<Subscription>;

    /// All subscriptions, oldest first
    async fn list(&self) -> Result<Vec<Subscription>>;

    /// Apply an owner's partial update
    async fn update(
        &self,
        id: Uuid,
        caller: Option<&str>,
        update: SubscriptionUpdate,
    ) -> Result<Subscription>;

    /// Delete a subscription; `NotFound` if absent
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Delete on behalf of `caller`, checking ownership in the same step
    ///
    /// `NotFound` if the id is absent or owned by someone else.
    async fn remove_owned(&self, id: Uuid, caller: Option<&str>) -> Result<()>;
}

/// Process-local registry backed by a map
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Subscription {}", id))
}

#[async_trait]
impl SubscriptionRegistry for InMemoryRegistry {
    async fn create(&self, new: NewSubscription) -> Result<Subscription> {
        let subscription = new.into_subscription(Utc::now())?;
        let mut map = self.subscriptions.write().await;
        map.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn get(&self, id: Uuid) -> Result<Subscription> {
        self.subscriptions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        let mut all: Vec<Subscription> = self.subscriptions.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn update(
        &self,
        id: Uuid,
        caller: Option<&str>,
        update: SubscriptionUpdate,
    ) -> Result<Subscription> {
        // Hold the write lock across read-modify-write so concurrent updates
        // to the same id serialize.
        let mut map = self.subscriptions.write().await;
        let current = map.get(&id).ok_or_else(|| not_found(id))?;
        let updated = current.apply_update(caller, update, Utc::now())?;
        map.insert(id, updated.clone());
        Ok(updated)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.subscriptions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn remove_owned(&self, id: Uuid, caller: Option<&str>) -> Result<()> {
        let mut map = self.subscriptions.write().await;
        match map.get(&id) {
            Some(existing) if existing.is_owned_by(caller) => {
                map.remove(&id);
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }
}
