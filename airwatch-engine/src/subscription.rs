//! Subscription records and their validation rules

use crate::context::{AgeGroup, HealthCondition, PersonContext};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest threshold a subscriber may pick
pub const MAX_THRESHOLD: u32 = 500;

/// Threshold used when a request does not name one
pub const DEFAULT_THRESHOLD: u32 = 100;

/// A stored alert preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    /// Only this owner may change threshold and context (`None`: unowned)
    pub owner: Option<String>,
    pub location: String,
    pub threshold: u32,
    pub person_context: PersonContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    #[serde(default)]
    pub owner: Option<String>,
    pub location: String,
    pub threshold: i64,
    #[serde(default)]
    pub person_context: PersonContext,
}

impl NewSubscription {
    pub fn new(location: impl Into<String>, threshold: i64, person_context: PersonContext) -> Self {
        Self {
            owner: None,
            location: location.into(),
            threshold,
            person_context,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Validate and stamp a new record with a fresh id
    pub fn into_subscription(self, now: DateTime<Utc>) -> Result<Subscription> {
        let location = validate_location(&self.location)?;
        let threshold = validate_threshold(self.threshold)?;
        Ok(Subscription {
            id: Uuid::new_v4(),
            owner: self.owner,
            location,
            threshold,
            person_context: self.person_context,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update; `None` leaves the field unchanged
///
/// Age group and conditions are separate fields so that changing one keeps
/// the stored value of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub age_group: Option<AgeGroup>,
    #[serde(default)]
    pub health_conditions: Option<Vec<HealthCondition>>,
}

impl Subscription {
    /// Whether `caller` may modify this subscription
    pub fn is_owned_by(&self, caller: Option<&str>) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => caller == Some(owner.as_str()),
        }
    }

    /// Apply an owner's update, re-validating every changed field
    ///
    /// A caller that is not the owner gets [`Error::NotFound`] so that
    /// other people's subscription ids are not disclosed.
    pub fn apply_update(
        &self,
        caller: Option<&str>,
        update: SubscriptionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Subscription> {
        if !self.is_owned_by(caller) {
            return Err(Error::NotFound(format!("Subscription {}", self.id)));
        }
        let mut updated = self.clone();
        if let Some(location) = update.location {
            updated.location = validate_location(&location)?;
        }
        if let Some(threshold) = update.threshold {
            updated.threshold = validate_threshold(threshold)?;
        }
        if let Some(age_group) = update.age_group {
            updated.person_context.age_group = age_group;
        }
        if let Some(conditions) = update.health_conditions {
            updated.person_context = PersonContext::new(updated.person_context.age_group, conditions);
        }
        updated.updated_at = now;
        Ok(updated)
    }

    /// Case-insensitive key used to match readings to subscriptions
    pub fn location_key(&self) -> String {
        location_key(&self.location)
    }
}

/// Normalized lookup key for a location name
pub fn location_key(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Trimmed, non-empty location
pub fn validate_location(location: &str) -> Result<String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Location is required".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Threshold within `[0, MAX_THRESHOLD]`
pub fn validate_threshold(threshold: i64) -> Result<u32> {
    if !(0..=MAX_THRESHOLD as i64).contains(&threshold) {
        return Err(Error::Validation(format!(
            "Threshold must be between 0 and {}, got {}",
            MAX_THRESHOLD, threshold
        )));
    }
    Ok(threshold as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_threshold(0).is_ok());
        assert!(validate_threshold(500).is_ok());
        assert!(matches!(validate_threshold(501), Err(Error::Validation(_))));
        assert!(matches!(validate_threshold(-1), Err(Error::Validation(_))));
    }

    #[test]
    fn test_location_trimmed_and_required() {
        assert_eq!(validate_location("  Delhi ").unwrap(), "Delhi");
        assert!(matches!(validate_location("   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_into_subscription_stamps_times() {
        let t = now();
        let sub = NewSubscription::new("Mumbai", 120, PersonContext::default())
            .into_subscription(t)
            .unwrap();
        assert_eq!(sub.created_at, t);
        assert_eq!(sub.updated_at, t);
        assert_eq!(sub.threshold, 120);
    }

    #[test]
    fn test_update_requires_owner() {
        let sub = NewSubscription::new("Pune", 100, PersonContext::default())
            .with_owner("alice")
            .into_subscription(now())
            .unwrap();
        let update = SubscriptionUpdate {
            threshold: Some(80),
            ..Default::default()
        };
        assert!(matches!(
            sub.apply_update(Some("bob"), update.clone(), now()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            sub.apply_update(None, update.clone(), now()),
            Err(Error::NotFound(_))
        ));
        let updated = sub.apply_update(Some("alice"), update, now()).unwrap();
        assert_eq!(updated.threshold, 80);
        assert_eq!(updated.id, sub.id);
        assert_eq!(updated.created_at, sub.created_at);
    }

    #[test]
    fn test_update_revalidates_location() {
        let sub = NewSubscription::new("Pune", 100, PersonContext::default())
            .into_subscription(now())
            .unwrap();
        let update = SubscriptionUpdate {
            location: Some("".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            sub.apply_update(None, update, now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_update_replaces_both_context_fields() {
        let sub = NewSubscription::new("Agra", 100, PersonContext::default())
            .into_subscription(now())
            .unwrap();
        let update = SubscriptionUpdate {
            age_group: Some(AgeGroup::Child),
            health_conditions: Some(vec![HealthCondition::Asthma, HealthCondition::Asthma]),
            ..Default::default()
        };
        let updated = sub.apply_update(None, update, now()).unwrap();
        assert_eq!(
            updated.person_context,
            PersonContext::new(AgeGroup::Child, [HealthCondition::Asthma])
        );
        assert_eq!(updated.location, "Agra");
    }

    #[test]
    fn test_age_group_update_keeps_conditions() {
        let stored = PersonContext::new(
            AgeGroup::Adult,
            [HealthCondition::Asthma, HealthCondition::Copd],
        );
        let sub = NewSubscription::new("Agra", 100, stored)
            .into_subscription(now())
            .unwrap();

        let update = SubscriptionUpdate {
            age_group: Some(AgeGroup::Elderly),
            ..Default::default()
        };
        let updated = sub.apply_update(None, update, now()).unwrap();
        assert_eq!(updated.person_context.age_group, AgeGroup::Elderly);
        assert_eq!(
            updated.person_context.health_conditions,
            vec![HealthCondition::Asthma, HealthCondition::Copd]
        );

        let update = SubscriptionUpdate {
            health_conditions: Some(vec![HealthCondition::Diabetes]),
            ..Default::default()
        };
        let updated = updated.apply_update(None, update, now()).unwrap();
        assert_eq!(updated.person_context.age_group, AgeGroup::Elderly);
        assert_eq!(
            updated.person_context.health_conditions,
            vec![HealthCondition::Diabetes]
        );
    }
}
