//! Landslide probability estimation and choropleth tiers.
//!
//! Each district observation (rainfall, pre-assigned risk level, historical
//! disaster count) is turned into a probability-like score in `[0, 100]` and a
//! color tier for the risk map.

use serde::{Deserialize, Deserializer, Serialize};

/// Score at or above which a district is drawn as high risk.
pub const HIGH_THRESHOLD: f64 = 75.0;
/// Score at or above which a district is drawn as medium risk.
pub const MEDIUM_THRESHOLD: f64 = 50.0;
/// Lower bound applied once any disaster has been recorded for a district.
pub const DISASTER_FLOOR: f64 = 80.0;

/// Per-district input record as served by `/list_data_graph`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Mean rainfall in millimeters; null is treated as zero.
    #[serde(default)]
    pub rain_mm_wmean: Option<f64>,
    /// Pre-assigned risk level, 1 (low) to 3 (high).
    pub risk_level: u8,
    /// Historical disaster events recorded for the district; null counts as none.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub count_of_disasters: u32,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

/// Discrete tier used to color a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Low,
    Medium,
    High,
}

impl ColorTier {
    /// Map a probability score onto a tier.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_THRESHOLD {
            ColorTier::High
        } else if probability >= MEDIUM_THRESHOLD {
            ColorTier::Medium
        } else {
            ColorTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorTier::Low => "Low",
            ColorTier::Medium => "Medium",
            ColorTier::High => "High",
        }
    }

    /// Short symbol for table cells.
    pub fn symbol(&self) -> &'static str {
        match self {
            ColorTier::Low => "LOW",
            ColorTier::Medium => "MED",
            ColorTier::High => "HIGH",
        }
    }
}

/// Result of classifying one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub probability: f64,
    pub tier: ColorTier,
}

/// Estimate the landslide probability for an observation.
///
/// Without recorded disasters the score is `rain / 2 + risk_level * 10`,
/// capped at 100. With at least one disaster, five points are added per event
/// and the result is clamped to `[80, 100]`, so any disaster history puts the
/// district in the high tier.
pub fn classify(observation: &Observation) -> Classification {
    let rain = observation.rain_mm_wmean.filter(|r| r.is_finite()).unwrap_or(0.0);
    let base = rain / 2.0 + f64::from(observation.risk_level) * 10.0;

    let probability = if observation.count_of_disasters > 0 {
        let boosted = base + f64::from(observation.count_of_disasters) * 5.0;
        boosted.clamp(DISASTER_FLOOR, 100.0)
    } else {
        base.clamp(0.0, 100.0)
    };

    Classification {
        probability,
        tier: ColorTier::from_probability(probability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(rain: Option<f64>, risk_level: u8, disasters: u32) -> Observation {
        Observation {
            rain_mm_wmean: rain,
            risk_level,
            count_of_disasters: disasters,
        }
    }

    #[test]
    fn test_dry_low_risk_district() {
        let result = classify(&obs(Some(0.0), 1, 0));
        assert_eq!(result.probability, 10.0);
        assert_eq!(result.tier, ColorTier::Low);
    }

    #[test]
    fn test_heavy_rain_high_risk_district() {
        let result = classify(&obs(Some(100.0), 3, 0));
        assert_eq!(result.probability, 80.0);
        assert_eq!(result.tier, ColorTier::High);
    }

    #[test]
    fn test_single_disaster_lifts_to_floor() {
        let result = classify(&obs(Some(0.0), 1, 1));
        assert_eq!(result.probability, 80.0);
        assert_eq!(result.tier, ColorTier::High);
    }

    #[test]
    fn test_many_disasters_capped_at_100() {
        let result = classify(&obs(Some(200.0), 3, 5));
        assert_eq!(result.probability, 100.0);
        assert_eq!(result.tier, ColorTier::High);
    }

    #[test]
    fn test_missing_rain_counts_as_zero() {
        assert_eq!(classify(&obs(None, 2, 0)).probability, 20.0);
        assert_eq!(classify(&obs(Some(f64::NAN), 2, 0)).probability, 20.0);
    }

    #[test]
    fn test_without_disasters_matches_formula() {
        for rain in [0.0, 3.5, 40.0, 99.0, 150.0, 400.0] {
            for level in 1..=3u8 {
                let expected = (rain / 2.0 + f64::from(level) * 10.0).min(100.0);
                let result = classify(&obs(Some(rain), level, 0));
                assert_eq!(result.probability, expected, "rain={rain} level={level}");
                assert!(result.probability <= 100.0);
            }
        }
    }

    #[test]
    fn test_with_disasters_stays_within_floor_and_cap() {
        for rain in [0.0, 10.0, 80.0, 500.0] {
            for level in 1..=3u8 {
                for disasters in [1, 2, 7, 40] {
                    let p = classify(&obs(Some(rain), level, disasters)).probability;
                    assert!((DISASTER_FLOOR..=100.0).contains(&p), "p={p}");
                }
            }
        }
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(ColorTier::from_probability(0.0), ColorTier::Low);
        assert_eq!(ColorTier::from_probability(49.99), ColorTier::Low);
        assert_eq!(ColorTier::from_probability(50.0), ColorTier::Medium);
        assert_eq!(ColorTier::from_probability(74.99), ColorTier::Medium);
        assert_eq!(ColorTier::from_probability(75.0), ColorTier::High);
        assert_eq!(ColorTier::from_probability(100.0), ColorTier::High);
    }

    #[test]
    fn test_medium_band() {
        // 60 / 2 + 2 * 10 = 50
        let result = classify(&obs(Some(60.0), 2, 0));
        assert_eq!(result.probability, 50.0);
        assert_eq!(result.tier, ColorTier::Medium);
    }

    #[test]
    fn test_classify_is_pure() {
        let o = obs(Some(37.2), 2, 0);
        assert_eq!(classify(&o), classify(&o));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let o: Observation =
            serde_json::from_str(r#"{ "rain_mm_wmean": null, "risk_level": 3 }"#).unwrap();
        assert_eq!(o.rain_mm_wmean, None);
        assert_eq!(o.count_of_disasters, 0);
        assert_eq!(classify(&o).probability, 30.0);
    }

    #[test]
    fn test_null_disaster_count_is_zero() {
        let o: Observation = serde_json::from_str(
            r#"{ "rain_mm_wmean": 40.0, "risk_level": 1, "count_of_disasters": null }"#,
        )
        .unwrap();
        assert_eq!(o.count_of_disasters, 0);
        let c = classify(&o);
        assert_eq!(c.probability, 30.0);
        assert_eq!(c.tier, ColorTier::Low);
    }
}
