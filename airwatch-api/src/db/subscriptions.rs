//! SQLite-backed subscription registry

use super::{decode_time, encode_time, storable_now};
use airwatch_engine::context::{AgeGroup, HealthCondition, PersonContext};
use airwatch_engine::subscription::{NewSubscription, Subscription, SubscriptionUpdate};
use airwatch_engine::{Error, Result, SubscriptionRegistry};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, owner, location, threshold, age_group, health_conditions, created_at, updated_at FROM subscriptions";

/// Registry persisting subscriptions in the `subscriptions` table
#[derive(Clone)]
pub struct SqliteRegistry {
    pool: SqlitePool,
}

impl SqliteRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn row_to_subscription(row: &SqliteRow) -> std::result::Result<Subscription, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let age_group: String = row.try_get("age_group")?;
    let conditions: String = row.try_get("health_conditions")?;
    let threshold: i64 = row.try_get("threshold")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let conditions: Vec<HealthCondition> = serde_json::from_str(&conditions).map_err(decode_err)?;

    Ok(Subscription {
        id: Uuid::parse_str(&id).map_err(decode_err)?,
        owner: row.try_get("owner")?,
        location: row.try_get("location")?,
        threshold: u32::try_from(threshold).map_err(decode_err)?,
        person_context: PersonContext::new(
            age_group.parse::<AgeGroup>().map_err(decode_err)?,
            conditions,
        ),
        created_at: decode_time(&created_at)?,
        updated_at: decode_time(&updated_at)?,
    })
}

async fn fetch_one<'e, E>(executor: E, id: Uuid) -> Result<Subscription>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Subscription {}", id)))?;
    Ok(row_to_subscription(&row)?)
}

fn encode_conditions(context: &PersonContext) -> Result<String> {
    serde_json::to_string(&context.health_conditions)
        .map_err(|e| Error::Validation(format!("Unencodable health conditions: {}", e)))
}

#[async_trait]
impl SubscriptionRegistry for SqliteRegistry {
    async fn create(&self, new: NewSubscription) -> Result<Subscription> {
        let subscription = new.into_subscription(storable_now())?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, owner, location, threshold, age_group, health_conditions, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(subscription.id.to_string())
        .bind(&subscription.owner)
        .bind(&subscription.location)
        .bind(subscription.threshold as i64)
        .bind(subscription.person_context.age_group.as_str())
        .bind(encode_conditions(&subscription.person_context)?)
        .bind(encode_time(subscription.created_at))
        .bind(encode_time(subscription.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn get(&self, id: Uuid) -> Result<Subscription> {
        fetch_one(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at ASC, id ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row_to_subscription(row).map_err(Error::from))
            .collect()
    }

    async fn update(
        &self,
        id: Uuid,
        caller: Option<&str>,
        update: SubscriptionUpdate,
    ) -> Result<Subscription> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_one(&mut *tx, id).await?;
        let updated = current.apply_update(caller, update, storable_now())?;

        sqlx::query(
            r#"
            UPDATE subscriptions
            SET location = ?, threshold = ?, age_group = ?, health_conditions = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.location)
        .bind(updated.threshold as i64)
        .bind(updated.person_context.age_group.as_str())
        .bind(encode_conditions(&updated.person_context)?)
        .bind(encode_time(updated.updated_at))
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subscription {}", id)));
        }
        Ok(())
    }

    async fn remove_owned(&self, id: Uuid, caller: Option<&str>) -> Result<()> {
        // NULL owner matches any caller; `owner = NULL` never matches
        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE id = ? AND (owner IS NULL OR owner = ?)",
        )
        .bind(id.to_string())
        .bind(caller)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subscription {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    async fn registry() -> SqliteRegistry {
        SqliteRegistry::new(init_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_then_get_identical() {
        let registry = registry().await;
        let context = PersonContext::new(
            AgeGroup::Elderly,
            [HealthCondition::HeartDisease, HealthCondition::Asthma],
        );
        let created = registry
            .create(NewSubscription::new("Delhi", 150, context).with_owner("user-1"))
            .await
            .unwrap();
        let fetched = registry.get(created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn test_remove_then_get_not_found() {
        let registry = registry().await;
        let created = registry
            .create(NewSubscription::new("Delhi", 100, PersonContext::default()))
            .await
            .unwrap();
        registry.remove(created.id).await.unwrap();
        assert!(matches!(registry.get(created.id).await, Err(Error::NotFound(_))));
        assert!(matches!(registry.remove(created.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_validation_boundary() {
        let registry = registry().await;
        assert!(matches!(
            registry
                .create(NewSubscription::new("", 100, PersonContext::default()))
                .await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            registry
                .create(NewSubscription::new("Delhi", 501, PersonContext::default()))
                .await,
            Err(Error::Validation(_))
        ));
        assert!(registry
            .create(NewSubscription::new("Delhi", 500, PersonContext::default()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let registry = registry().await;
        let created = registry
            .create(NewSubscription::new("Pune", 100, PersonContext::default()).with_owner("u"))
            .await
            .unwrap();
        let update = SubscriptionUpdate {
            location: Some("Mumbai".to_string()),
            threshold: Some(75),
            age_group: Some(AgeGroup::Teen),
            health_conditions: Some(vec![HealthCondition::Allergies]),
        };
        let updated = registry.update(created.id, Some("u"), update).await.unwrap();
        let fetched = registry.get(created.id).await.unwrap();
        assert_eq!(updated, fetched);
        assert_eq!(fetched.location, "Mumbai");
        assert_eq!(fetched.threshold, 75);
        assert_eq!(
            fetched.person_context,
            PersonContext::new(AgeGroup::Teen, [HealthCondition::Allergies])
        );
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_by_stranger_is_not_found_and_leaves_row() {
        let registry = registry().await;
        let created = registry
            .create(NewSubscription::new("Pune", 100, PersonContext::default()).with_owner("u"))
            .await
            .unwrap();
        let update = SubscriptionUpdate {
            threshold: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            registry.update(created.id, Some("intruder"), update).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(registry.get(created.id).await.unwrap().threshold, 100);
    }

    #[tokio::test]
    async fn test_remove_owned_by_stranger_leaves_row() {
        let registry = registry().await;
        let owned = registry
            .create(NewSubscription::new("Pune", 100, PersonContext::default()).with_owner("u"))
            .await
            .unwrap();
        let unowned = registry
            .create(NewSubscription::new("Surat", 100, PersonContext::default()))
            .await
            .unwrap();

        assert!(matches!(
            registry.remove_owned(owned.id, Some("intruder")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            registry.remove_owned(owned.id, None).await,
            Err(Error::NotFound(_))
        ));
        assert!(registry.get(owned.id).await.is_ok());

        registry.remove_owned(owned.id, Some("u")).await.unwrap();
        registry.remove_owned(unowned.id, None).await.unwrap();
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_oldest_first() {
        let registry = registry().await;
        for city in ["Agra", "Bhopal", "Chennai"] {
            registry
                .create(NewSubscription::new(city, 100, PersonContext::default()))
                .await
                .unwrap();
        }
        let all = registry.list().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
