use serde::{Deserialize, Serialize};

use crate::{
    category::RiskCategory,
    error::{ScaleField, ValidationError},
};

/// Lower bound of the impact/likelihood scale.
pub const SCALE_MIN: f64 = 0.0;
/// Upper bound of the impact/likelihood scale.
pub const SCALE_MAX: f64 = 10.0;

/// One observed risk item rated on the 0-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Identifying label.
    pub name: String,
    /// Severity if the risk occurs.
    pub impact: f64,
    /// Probability of occurrence.
    pub likelihood: f64,
    /// Free-text rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suggested mitigation, shown in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl RiskFactor {
    /// Creates a factor without description or mitigation.
    #[must_use]
    pub fn new(name: impl Into<String>, impact: f64, likelihood: f64) -> Self {
        Self {
            name: name.into(),
            impact,
            likelihood,
            description: None,
            mitigation: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the mitigation note.
    #[must_use]
    pub fn with_mitigation(mut self, mitigation: impl Into<String>) -> Self {
        self.mitigation = Some(mitigation.into());
        self
    }

    /// `impact × likelihood`, the quantity summed per category.
    #[must_use]
    pub fn exposure(&self) -> f64 {
        self.impact * self.likelihood
    }

    /// Exposure scaled into the 0-10 range of a single factor.
    #[must_use]
    pub fn severity(&self) -> f64 {
        self.exposure() / 10.0
    }

    /// Checks name and ratings. `index` is the factor's position in its category.
    pub fn validate(&self, category: RiskCategory, index: usize) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { category, index });
        }
        self.check_rating(category, ScaleField::Impact, self.impact)?;
        self.check_rating(category, ScaleField::Likelihood, self.likelihood)
    }

    fn check_rating(
        &self,
        category: RiskCategory,
        field: ScaleField,
        value: f64,
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite {
                category,
                factor: self.name.clone(),
                field,
            });
        }
        if !(SCALE_MIN..=SCALE_MAX).contains(&value) {
            return Err(ValidationError::OutOfRange {
                category,
                factor: self.name.clone(),
                field,
                value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_scales_exposure() {
        let factor = RiskFactor::new("Integration complexity", 8.0, 7.0);
        assert!((factor.exposure() - 56.0).abs() < f64::EPSILON);
        assert!((factor.severity() - 5.6).abs() < 1e-12);
    }

    #[test]
    fn bounds_are_inclusive() {
        RiskFactor::new("floor", 0.0, 0.0)
            .validate(RiskCategory::Budget, 0)
            .unwrap();
        RiskFactor::new("ceiling", 10.0, 10.0)
            .validate(RiskCategory::Budget, 0)
            .unwrap();
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for (impact, likelihood, field) in [
            (-1.0, 5.0, ScaleField::Impact),
            (11.0, 5.0, ScaleField::Impact),
            (5.0, -1.0, ScaleField::Likelihood),
            (5.0, 11.0, ScaleField::Likelihood),
        ] {
            let err = RiskFactor::new("edge", impact, likelihood)
                .validate(RiskCategory::Market, 0)
                .unwrap_err();
            match err {
                ValidationError::OutOfRange { field: got, .. } => assert_eq!(got, field),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_nan_and_blank_name() {
        let err = RiskFactor::new("nan", f64::NAN, 3.0)
            .validate(RiskCategory::Technical, 2)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { .. }));
        let err = RiskFactor::new("  ", 3.0, 3.0)
            .validate(RiskCategory::Technical, 2)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyName {
                category: RiskCategory::Technical,
                index: 2
            }
        );
    }
}
