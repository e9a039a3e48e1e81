//! Demographic and health-condition context for personalized guidance

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Age group of the person receiving guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Teen,
    Adult,
    Elderly,
    Pregnant,
    #[default]
    Unspecified,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teen => "teen",
            AgeGroup::Adult => "adult",
            AgeGroup::Elderly => "elderly",
            AgeGroup::Pregnant => "pregnant",
            AgeGroup::Unspecified => "unspecified",
        }
    }

    /// Groups that need extra caution before the general population does
    pub fn is_sensitive(self) -> bool {
        matches!(self, AgeGroup::Child | AgeGroup::Elderly | AgeGroup::Pregnant)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "child" => Ok(AgeGroup::Child),
            "teen" => Ok(AgeGroup::Teen),
            "adult" => Ok(AgeGroup::Adult),
            "elderly" => Ok(AgeGroup::Elderly),
            "pregnant" => Ok(AgeGroup::Pregnant),
            "" | "unspecified" => Ok(AgeGroup::Unspecified),
            other => Err(Error::Validation(format!("Unknown age group: {}", other))),
        }
    }
}

/// Pre-existing condition that raises sensitivity to pollution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    Asthma,
    Copd,
    HeartDisease,
    Diabetes,
    Allergies,
}

impl HealthCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthCondition::Asthma => "asthma",
            HealthCondition::Copd => "copd",
            HealthCondition::HeartDisease => "heart_disease",
            HealthCondition::Diabetes => "diabetes",
            HealthCondition::Allergies => "allergies",
        }
    }
}

impl fmt::Display for HealthCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthCondition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asthma" => Ok(HealthCondition::Asthma),
            "copd" => Ok(HealthCondition::Copd),
            "heart_disease" => Ok(HealthCondition::HeartDisease),
            "diabetes" => Ok(HealthCondition::Diabetes),
            "allergies" => Ok(HealthCondition::Allergies),
            other => Err(Error::Validation(format!("Unknown health condition: {}", other))),
        }
    }
}

/// Who the guidance is for
///
/// Conditions keep the order they were supplied in and never repeat; the
/// recommendation generator emits caveats in that order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonContext {
    #[serde(default)]
    pub age_group: AgeGroup,
    #[serde(default, deserialize_with = "dedup_conditions")]
    pub health_conditions: Vec<HealthCondition>,
}

impl PersonContext {
    /// Build a context, dropping repeated conditions
    pub fn new(age_group: AgeGroup, conditions: impl IntoIterator<Item = HealthCondition>) -> Self {
        let mut health_conditions = Vec::new();
        for condition in conditions {
            if !health_conditions.contains(&condition) {
                health_conditions.push(condition);
            }
        }
        Self {
            age_group,
            health_conditions,
        }
    }

    /// Parse the loosely-typed request form (`age_group?`, `health_conditions?`)
    pub fn parse(age_group: Option<&str>, conditions: &[String]) -> Result<Self> {
        let age_group = match age_group {
            Some(raw) => raw.parse()?,
            None => AgeGroup::Unspecified,
        };
        let conditions = conditions
            .iter()
            .map(|c| c.parse::<HealthCondition>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(age_group, conditions))
    }

    pub fn has_condition(&self, condition: HealthCondition) -> bool {
        self.health_conditions.contains(&condition)
    }
}

fn dedup_conditions<'de, D>(deserializer: D) -> std::result::Result<Vec<HealthCondition>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<HealthCondition>::deserialize(deserializer)?;
    Ok(PersonContext::new(AgeGroup::Unspecified, raw).health_conditions)
}
