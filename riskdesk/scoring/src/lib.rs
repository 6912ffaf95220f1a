#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Risk scoring engine: turns impact/likelihood observations grouped by
//! category into rounded per-category scores and a weighted overall score.
//!
//! ```
//! use riskdesk_scoring::{score, ProjectRiskInput, RiskCategory, RiskFactor};
//!
//! let input = ProjectRiskInput::new()
//!     .with_factor(RiskCategory::Schedule, RiskFactor::new("Timeline slippage", 7.0, 6.0))
//!     .with_factor(RiskCategory::Schedule, RiskFactor::new("Resource availability", 8.0, 5.0));
//! let result = score(&input).unwrap();
//! assert_eq!(result.schedule_risk, 8.2);
//! assert_eq!(result.overall_risk, 5.8);
//! ```

/// The four fixed risk categories.
pub mod category;
/// Scoring engine, policy and result types.
pub mod engine;
/// Validation errors.
pub mod error;
/// Single risk observations.
pub mod factor;
/// Category-grouped input and its JSON loader.
pub mod input;
/// Category weights.
pub mod weights;

pub use category::RiskCategory;
pub use engine::{
    category_score, round_to_tenth, score, CategoryBreakdown, RankedFactor, RiskScoreResult,
    RiskScoringEngine, ScoreBreakdown, ScoringPolicy, UnknownCategoryPolicy,
    EMPTY_CATEGORY_SCORE, SCORE_CEILING,
};
pub use error::{ScaleField, ValidationError};
pub use factor::{RiskFactor, SCALE_MAX, SCALE_MIN};
pub use input::{CategoryRiskSet, ProjectRiskInput};
pub use weights::CategoryWeights;
