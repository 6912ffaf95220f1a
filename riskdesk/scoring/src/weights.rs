use serde::{Deserialize, Serialize};

use crate::{category::RiskCategory, error::ValidationError};

const SUM_TOLERANCE: f64 = 1e-9;

/// Per-category weights used to combine category scores into the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryWeights {
    /// Schedule weight.
    pub schedule: f64,
    /// Budget weight.
    pub budget: f64,
    /// Technical weight.
    pub technical: f64,
    /// Market weight.
    pub market: f64,
}

impl CategoryWeights {
    /// Standard weighting: schedule 0.25, budget 0.25, technical 0.30, market 0.20.
    pub const STANDARD: Self = Self {
        schedule: 0.25,
        budget: 0.25,
        technical: 0.30,
        market: 0.20,
    };

    /// Builds validated custom weights.
    pub fn new(
        schedule: f64,
        budget: f64,
        technical: f64,
        market: f64,
    ) -> Result<Self, ValidationError> {
        let weights = Self {
            schedule,
            budget,
            technical,
            market,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Weight for one category.
    #[must_use]
    pub const fn weight(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Schedule => self.schedule,
            RiskCategory::Budget => self.budget,
            RiskCategory::Technical => self.technical,
            RiskCategory::Market => self.market,
        }
    }

    /// Sum of the four weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        RiskCategory::ALL
            .iter()
            .map(|category| self.weight(*category))
            .sum()
    }

    /// Every weight finite and non-negative; total equal to 1.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for category in RiskCategory::ALL {
            let weight = self.weight(category);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ValidationError::InvalidWeights(format!(
                    "{category} weight {weight} must be a finite, non-negative number"
                )));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(ValidationError::InvalidWeights(format!(
                "weights sum to {total}, expected 1.0"
            )));
        }
        Ok(())
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_weights_sum_to_one() {
        let weights = CategoryWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-12);
        weights.validate().unwrap();
        assert!((weights.weight(RiskCategory::Technical) - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_sums_and_negatives() {
        assert!(matches!(
            CategoryWeights::new(0.25, 0.25, 0.25, 0.20),
            Err(ValidationError::InvalidWeights(_))
        ));
        assert!(matches!(
            CategoryWeights::new(-0.25, 0.75, 0.30, 0.20),
            Err(ValidationError::InvalidWeights(_))
        ));
        assert!(CategoryWeights::new(0.4, 0.2, 0.2, 0.2).is_ok());
    }

    #[test]
    fn partial_config_falls_back_to_standard() {
        let weights: CategoryWeights = serde_json::from_str(r#"{ "market": 0.20 }"#).unwrap();
        assert_eq!(weights, CategoryWeights::STANDARD);
    }
}
