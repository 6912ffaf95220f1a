use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::RiskCategory;

/// Which rating of a factor an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleField {
    /// Severity if realized.
    Impact,
    /// Probability of occurrence.
    Likelihood,
}

impl ScaleField {
    /// Input key for the field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Impact => "impact",
            Self::Likelihood => "likelihood",
        }
    }
}

impl fmt::Display for ScaleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Caller-data errors raised while loading or scoring risk input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Rating outside the 0-10 scale.
    #[error("{category} factor `{factor}`: {field} {value} is outside [0, 10]")]
    OutOfRange {
        /// Category holding the factor.
        category: RiskCategory,
        /// Factor name.
        factor: String,
        /// Offending rating.
        field: ScaleField,
        /// Supplied value.
        value: f64,
    },
    /// Rating is NaN or infinite.
    #[error("{category} factor `{factor}`: {field} is not a finite number")]
    NonFinite {
        /// Category holding the factor.
        category: RiskCategory,
        /// Factor name.
        factor: String,
        /// Offending rating.
        field: ScaleField,
    },
    /// Required key absent or null.
    #[error("{category} factor #{index}: missing `{field}`")]
    MissingField {
        /// Category holding the factor.
        category: RiskCategory,
        /// Zero-based position in the category list.
        index: usize,
        /// Missing key.
        field: &'static str,
    },
    /// Rating supplied with a non-numeric JSON type.
    #[error("{category} factor #{index}: `{field}` must be numeric, found {found}")]
    NonNumeric {
        /// Category holding the factor.
        category: RiskCategory,
        /// Zero-based position in the category list.
        index: usize,
        /// Offending key.
        field: &'static str,
        /// JSON type that was found.
        found: &'static str,
    },
    /// Factor name is blank.
    #[error("{category} factor #{index} has an empty name")]
    EmptyName {
        /// Category holding the factor.
        category: RiskCategory,
        /// Zero-based position in the category list.
        index: usize,
    },
    /// Key is not one of the four categories.
    #[error("unknown risk category `{0}`")]
    UnknownCategory(String),
    /// Input does not have the expected shape.
    #[error("malformed risk input: {0}")]
    Malformed(String),
    /// Weights are negative, non-finite, or do not sum to 1.
    #[error("invalid category weights: {0}")]
    InvalidWeights(String),
}
