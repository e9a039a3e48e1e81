//! Personalized recommendation generator
//!
//! Output order is fixed: the band's base guidance, then one caveat per
//! health condition (in the order the context lists them), then the
//! age-group caution.

use crate::band::{classify, validate_aqi, SeverityBand};
use crate::context::{AgeGroup, HealthCondition, PersonContext};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Guidance for one band and one person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub color: String,
    pub recommendations: Vec<String>,
}

/// Band-level advisory attached to classify responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdvisoryLevel {
    Moderate,
    High,
    Critical,
}

/// Public advisory for an elevated AQI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryMessage {
    pub level: AdvisoryLevel,
    pub message: String,
    pub color: String,
}

/// Full classify + recommend result for one AQI value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub aqi: u32,
    pub band: SeverityBand,
    pub recommendation: Recommendation,
    pub alert_message: Option<AdvisoryMessage>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tone {
    Limit,
    Avoid,
}

fn tone_for(band: SeverityBand) -> Option<Tone> {
    match band {
        SeverityBand::Good | SeverityBand::Moderate => None,
        SeverityBand::UnhealthySensitive => Some(Tone::Limit),
        SeverityBand::Unhealthy | SeverityBand::VeryUnhealthy | SeverityBand::Hazardous => {
            Some(Tone::Avoid)
        }
    }
}

fn condition_caveat(condition: HealthCondition, tone: Tone) -> &'static str {
    match (condition, tone) {
        (HealthCondition::Asthma, Tone::Limit) => {
            "Asthma: limit time outdoors and keep your rescue inhaler readily available"
        }
        (HealthCondition::Asthma, Tone::Avoid) => {
            "Asthma: avoid outdoor exertion and consider pre-medicating before any unavoidable trip outside"
        }
        (HealthCondition::Copd, Tone::Limit) => {
            "COPD: limit outdoor exposure and use supplemental oxygen as prescribed"
        }
        (HealthCondition::Copd, Tone::Avoid) => {
            "COPD: avoid all outdoor activities and have emergency medications ready"
        }
        (HealthCondition::HeartDisease, Tone::Limit) => {
            "Heart disease: limit strenuous activity and monitor heart rate and blood pressure"
        }
        (HealthCondition::HeartDisease, Tone::Avoid) => {
            "Heart disease: avoid strenuous activity and consult your cardiologist if symptoms worsen"
        }
        (HealthCondition::Diabetes, Tone::Limit) => {
            "Diabetes: limit prolonged outdoor exertion and check blood sugar more often"
        }
        (HealthCondition::Diabetes, Tone::Avoid) => {
            "Diabetes: avoid outdoor exertion and watch closely for changes in blood sugar"
        }
        (HealthCondition::Allergies, Tone::Limit) => {
            "Allergies: limit time outdoors and keep windows closed"
        }
        (HealthCondition::Allergies, Tone::Avoid) => {
            "Allergies: avoid going outdoors and run an air purifier indoors"
        }
    }
}

fn age_caution(age_group: AgeGroup, band: SeverityBand) -> Option<&'static str> {
    let applies = if age_group.is_sensitive() {
        band >= SeverityBand::UnhealthySensitive
    } else {
        band >= SeverityBand::Unhealthy
    };
    if !applies {
        return None;
    }
    Some(match age_group {
        AgeGroup::Child => "Children should avoid outdoor play; watch for coughing or breathing difficulties",
        AgeGroup::Elderly => "Older adults should minimize outdoor exposure and take medications as prescribed",
        AgeGroup::Pregnant => "Pregnant people should avoid outdoor activities and discuss air quality concerns with a doctor",
        AgeGroup::Teen => "Teens should move sports and practice indoors",
        AgeGroup::Adult | AgeGroup::Unspecified => {
            "Reduce prolonged or heavy exertion outdoors and wear an N95 mask if you must go out"
        }
    })
}

/// Build the ordered recommendation list for a band and a person
pub fn recommend(band: SeverityBand, context: &PersonContext) -> Recommendation {
    let mut recommendations = vec![band.base_guidance().to_string()];

    if let Some(tone) = tone_for(band) {
        recommendations.extend(
            context
                .health_conditions
                .iter()
                .map(|condition| condition_caveat(*condition, tone).to_string()),
        );
    }

    if let Some(caution) = age_caution(context.age_group, band) {
        recommendations.push(caution.to_string());
    }

    Recommendation {
        category: band.label().to_string(),
        color: band.color().to_string(),
        recommendations,
    }
}

/// Public advisory for an AQI value, if it is elevated enough to warrant one
pub fn advisory_message(aqi: u32) -> Option<AdvisoryMessage> {
    let band = SeverityBand::for_value(aqi);
    let (level, message) = match band {
        SeverityBand::Good | SeverityBand::Moderate => return None,
        SeverityBand::UnhealthySensitive => (
            AdvisoryLevel::Moderate,
            format!(
                "MODERATE AIR QUALITY ALERT: AQI is {}. Sensitive individuals should limit outdoor activities.",
                aqi
            ),
        ),
        SeverityBand::Unhealthy => (
            AdvisoryLevel::High,
            format!(
                "HIGH AIR QUALITY ALERT: AQI is {}. Sensitive groups should stay indoors.",
                aqi
            ),
        ),
        SeverityBand::VeryUnhealthy | SeverityBand::Hazardous => (
            AdvisoryLevel::Critical,
            format!(
                "CRITICAL AIR QUALITY ALERT: AQI is {}. Avoid all outdoor activities immediately!",
                aqi
            ),
        ),
    };
    Some(AdvisoryMessage {
        level,
        message,
        color: band.color().to_string(),
    })
}

/// Classify, recommend and attach the advisory in one step
pub fn advise(aqi: i64, context: &PersonContext) -> Result<Advice> {
    let band = classify(aqi)?;
    let aqi = validate_aqi(aqi)?;
    Ok(Advice {
        aqi,
        band,
        recommendation: recommend(band, context),
        alert_message: advisory_message(aqi),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(age_group: AgeGroup, conditions: &[HealthCondition]) -> PersonContext {
        PersonContext::new(age_group, conditions.iter().copied())
    }

    #[test]
    fn test_empty_context_yields_base_only_at_low_bands() {
        for band in [
            SeverityBand::Good,
            SeverityBand::Moderate,
            SeverityBand::UnhealthySensitive,
        ] {
            let rec = recommend(band, &PersonContext::default());
            assert_eq!(rec.recommendations, vec![band.base_guidance().to_string()]);
        }
    }

    #[test]
    fn test_conditions_omitted_at_good_and_moderate() {
        let c = ctx(AgeGroup::Adult, &[HealthCondition::Asthma, HealthCondition::Copd]);
        assert_eq!(recommend(SeverityBand::Good, &c).recommendations.len(), 1);
        assert_eq!(recommend(SeverityBand::Moderate, &c).recommendations.len(), 1);
    }

    #[test]
    fn test_one_caveat_per_condition_from_sensitive_band() {
        let c = ctx(
            AgeGroup::Adult,
            &[HealthCondition::Diabetes, HealthCondition::Allergies],
        );
        let rec = recommend(SeverityBand::UnhealthySensitive, &c);
        assert_eq!(rec.recommendations.len(), 3);
        assert!(rec.recommendations[1].starts_with("Diabetes: limit"));
        assert!(rec.recommendations[2].starts_with("Allergies: limit"));
    }

    #[test]
    fn test_caveats_strengthen_at_unhealthy() {
        let c = ctx(AgeGroup::Unspecified, &[HealthCondition::Copd]);
        let rec = recommend(SeverityBand::Unhealthy, &c);
        assert!(rec.recommendations[1].starts_with("COPD: avoid"));
    }

    #[test]
    fn test_sensitive_age_groups_join_at_unhealthy_sensitive() {
        for group in [AgeGroup::Child, AgeGroup::Elderly, AgeGroup::Pregnant] {
            let rec = recommend(SeverityBand::UnhealthySensitive, &ctx(group, &[]));
            assert_eq!(rec.recommendations.len(), 2, "{:?} should get a caution", group);
            let rec = recommend(SeverityBand::Moderate, &ctx(group, &[]));
            assert_eq!(rec.recommendations.len(), 1, "{:?} needs no caution at Moderate", group);
        }
    }

    #[test]
    fn test_general_age_groups_join_at_unhealthy() {
        for group in [AgeGroup::Adult, AgeGroup::Teen, AgeGroup::Unspecified] {
            let rec = recommend(SeverityBand::UnhealthySensitive, &ctx(group, &[]));
            assert_eq!(rec.recommendations.len(), 1);
            let rec = recommend(SeverityBand::Unhealthy, &ctx(group, &[]));
            assert_eq!(rec.recommendations.len(), 2);
        }
    }

    #[test]
    fn test_order_is_base_conditions_then_age() {
        let c = ctx(
            AgeGroup::Child,
            &[HealthCondition::HeartDisease, HealthCondition::Asthma],
        );
        let rec = recommend(SeverityBand::Hazardous, &c);
        assert_eq!(rec.recommendations.len(), 4);
        assert_eq!(rec.recommendations[0], SeverityBand::Hazardous.base_guidance());
        assert!(rec.recommendations[1].starts_with("Heart disease"));
        assert!(rec.recommendations[2].starts_with("Asthma"));
        assert!(rec.recommendations[3].starts_with("Children"));
    }

    #[test]
    fn test_category_and_color_pass_through() {
        let rec = recommend(SeverityBand::VeryUnhealthy, &PersonContext::default());
        assert_eq!(rec.category, "Very Unhealthy");
        assert_eq!(rec.color, "#8f3f97");
    }

    #[test]
    fn test_advisory_levels_follow_bands() {
        assert!(advisory_message(100).is_none());
        assert_eq!(advisory_message(101).unwrap().level, AdvisoryLevel::Moderate);
        assert_eq!(advisory_message(151).unwrap().level, AdvisoryLevel::High);
        assert_eq!(advisory_message(201).unwrap().level, AdvisoryLevel::Critical);
        assert_eq!(advisory_message(450).unwrap().level, AdvisoryLevel::Critical);
        assert!(advisory_message(175).unwrap().message.contains("175"));
    }

    #[test]
    fn test_advise_rejects_negative() {
        assert!(advise(-5, &PersonContext::default()).is_err());
    }

    #[test]
    fn test_advise_combines_parts() {
        let advice = advise(160, &ctx(AgeGroup::Elderly, &[])).unwrap();
        assert_eq!(advice.band, SeverityBand::Unhealthy);
        assert_eq!(advice.recommendation.recommendations.len(), 2);
        assert_eq!(advice.alert_message.unwrap().level, AdvisoryLevel::High);
    }
}
