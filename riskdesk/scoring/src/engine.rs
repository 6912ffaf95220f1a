use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    category::RiskCategory, error::ValidationError, factor::RiskFactor, input::ProjectRiskInput,
    weights::CategoryWeights,
};

/// Score assigned to a category with no observed factors ("no data" midpoint).
pub const EMPTY_CATEGORY_SCORE: f64 = 5.0;
/// Upper bound applied when clamping is enabled.
pub const SCORE_CEILING: f64 = 10.0;

/// Handling of category keys outside the four fixed categories in untyped input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Fail with [`ValidationError::UnknownCategory`].
    #[default]
    Reject,
    /// Skip the key.
    Ignore,
}

/// Knobs of the scoring model. The default reproduces the reference model
/// exactly: standard weights, no clamping, unknown categories rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringPolicy {
    /// Category weights for the overall score.
    pub weights: CategoryWeights,
    /// Cap category and overall scores at 10.
    pub clamp: bool,
    /// Unknown-key handling for JSON input.
    pub unknown_categories: UnknownCategoryPolicy,
}

/// Scores for one project, each rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreResult {
    /// Weighted combination of the category scores.
    pub overall_risk: f64,
    /// Schedule category score.
    pub schedule_risk: f64,
    /// Budget category score.
    pub budget_risk: f64,
    /// Technical category score.
    pub technical_risk: f64,
    /// Market category score.
    pub market_risk: f64,
}

impl RiskScoreResult {
    /// Score of one category.
    #[must_use]
    pub const fn category(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Schedule => self.schedule_risk,
            RiskCategory::Budget => self.budget_risk,
            RiskCategory::Technical => self.technical_risk,
            RiskCategory::Market => self.market_risk,
        }
    }

    /// `(category, score)` pairs in reporting order.
    #[must_use]
    pub fn categories(&self) -> [(RiskCategory, f64); 4] {
        RiskCategory::ALL.map(|category| (category, self.category(category)))
    }

    /// Category with the highest score; earlier categories win ties.
    #[must_use]
    pub fn dominant_category(&self) -> RiskCategory {
        self.categories()
            .into_iter()
            .fold((RiskCategory::Schedule, f64::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
            .0
    }

    /// `true` when any score exceeds the nominal 0-10 range.
    #[must_use]
    pub fn exceeds_scale(&self) -> bool {
        self.overall_risk > SCORE_CEILING
            || self
                .categories()
                .iter()
                .any(|(_, score)| *score > SCORE_CEILING)
    }
}

/// Per-category detail behind a [`RiskScoreResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Category.
    pub category: RiskCategory,
    /// Number of factors observed.
    pub factor_count: usize,
    /// Unrounded `Σ impact × likelihood`.
    pub exposure_sum: f64,
    /// Rounded category score as reported.
    pub score: f64,
    /// Weight applied in the overall score.
    pub weight: f64,
    /// `true` when the empty-category default was used.
    pub defaulted: bool,
}

/// A factor with its category and rounded severity, for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFactor {
    /// Category holding the factor.
    pub category: RiskCategory,
    /// The factor itself.
    pub factor: RiskFactor,
    /// `impact × likelihood / 10`, rounded to one decimal.
    pub severity: f64,
}

/// Scores plus the detail needed to explain them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Headline scores.
    pub result: RiskScoreResult,
    /// Detail in category order.
    pub categories: Vec<CategoryBreakdown>,
    /// All factors, most severe first.
    pub ranked: Vec<RankedFactor>,
}

impl ScoreBreakdown {
    /// The `n` most severe factors.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedFactor] {
        &self.ranked[..n.min(self.ranked.len())]
    }
}

/// Stateless scorer bound to a validated [`ScoringPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RiskScoringEngine {
    policy: ScoringPolicy,
}

impl RiskScoringEngine {
    /// Creates an engine after checking the policy's weights.
    pub fn new(policy: ScoringPolicy) -> Result<Self, ValidationError> {
        policy.weights.validate()?;
        Ok(Self { policy })
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Loads untyped input using the policy's unknown-category handling.
    pub fn parse(&self, value: &Value) -> Result<ProjectRiskInput, ValidationError> {
        ProjectRiskInput::from_json(value, self.policy.unknown_categories)
    }

    /// Scores `input`. Every factor is validated before any arithmetic.
    pub fn score(&self, input: &ProjectRiskInput) -> Result<RiskScoreResult, ValidationError> {
        input.validate()?;
        let raw = RiskCategory::ALL.map(|category| self.bounded(category_score(input.factors(category))));
        let overall = RiskCategory::ALL
            .iter()
            .zip(raw)
            .map(|(category, score)| score * self.policy.weights.weight(*category))
            .sum::<f64>();
        let result = RiskScoreResult {
            overall_risk: round_to_tenth(self.bounded(overall)),
            schedule_risk: round_to_tenth(raw[0]),
            budget_risk: round_to_tenth(raw[1]),
            technical_risk: round_to_tenth(raw[2]),
            market_risk: round_to_tenth(raw[3]),
        };
        tracing::debug!(
            factors = input.total_factors(),
            overall = result.overall_risk,
            clamp = self.policy.clamp,
            "scored risk input"
        );
        Ok(result)
    }

    /// Parses and scores untyped input.
    pub fn score_json(&self, value: &Value) -> Result<RiskScoreResult, ValidationError> {
        self.score(&self.parse(value)?)
    }

    /// Scores `input` and explains the result per category and per factor.
    pub fn breakdown(&self, input: &ProjectRiskInput) -> Result<ScoreBreakdown, ValidationError> {
        let result = self.score(input)?;
        let categories = RiskCategory::ALL
            .into_iter()
            .map(|category| {
                let factors = input.factors(category);
                CategoryBreakdown {
                    category,
                    factor_count: factors.len(),
                    exposure_sum: factors.iter().map(RiskFactor::exposure).sum(),
                    score: result.category(category),
                    weight: self.policy.weights.weight(category),
                    defaulted: factors.is_empty(),
                }
            })
            .collect();
        let mut ranked: Vec<RankedFactor> = input
            .iter()
            .map(|(category, factor)| RankedFactor {
                category,
                factor: factor.clone(),
                severity: round_to_tenth(factor.severity()),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.factor
                .severity()
                .total_cmp(&a.factor.severity())
                .then(a.category.cmp(&b.category))
                .then_with(|| a.factor.name.cmp(&b.factor.name))
        });
        Ok(ScoreBreakdown {
            result,
            categories,
            ranked,
        })
    }

    fn bounded(&self, score: f64) -> f64 {
        if self.policy.clamp {
            score.clamp(0.0, SCORE_CEILING)
        } else {
            score
        }
    }
}

/// Scores `input` with the default policy.
pub fn score(input: &ProjectRiskInput) -> Result<RiskScoreResult, ValidationError> {
    RiskScoringEngine::default().score(input)
}

/// Unrounded category score: [`EMPTY_CATEGORY_SCORE`] for no factors, otherwise
/// `Σ(impact × likelihood) / 100 × 10`. Not bounded by 10.
#[must_use]
pub fn category_score(factors: &[RiskFactor]) -> f64 {
    if factors.is_empty() {
        return EMPTY_CATEGORY_SCORE;
    }
    factors.iter().map(RiskFactor::exposure).sum::<f64>() / 100.0 * 10.0
}

/// Rounds the exact binary value to one decimal place. Values that print as a
/// tie (`5.85`) but are stored just below it round down.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factor(impact: f64, likelihood: f64) -> RiskFactor {
        RiskFactor::new(format!("i{impact}-l{likelihood}"), impact, likelihood)
    }

    fn reference_portfolio() -> ProjectRiskInput {
        ProjectRiskInput::new()
            .with_factor(RiskCategory::Schedule, RiskFactor::new("Timeline slippage", 7.0, 6.0))
            .with_factor(RiskCategory::Schedule, RiskFactor::new("Resource availability", 8.0, 5.0))
            .with_factor(RiskCategory::Budget, RiskFactor::new("Cost overruns", 6.0, 7.0))
            .with_factor(RiskCategory::Budget, RiskFactor::new("Vendor price increases", 5.0, 6.0))
            .with_factor(RiskCategory::Technical, RiskFactor::new("Integration complexity", 8.0, 7.0))
            .with_factor(RiskCategory::Technical, RiskFactor::new("Technical debt", 6.0, 5.0))
            .with_factor(RiskCategory::Market, RiskFactor::new("Competitive landscape", 7.0, 5.0))
            .with_factor(RiskCategory::Market, RiskFactor::new("Regulatory changes", 8.0, 4.0))
    }

    #[test]
    fn empty_input_scores_midpoint_everywhere() {
        let result = score(&ProjectRiskInput::new()).unwrap();
        assert_eq!(
            result,
            RiskScoreResult {
                overall_risk: 5.0,
                schedule_risk: 5.0,
                budget_risk: 5.0,
                technical_risk: 5.0,
                market_risk: 5.0,
            }
        );
    }

    #[test]
    fn explicitly_empty_set_matches_absent_set() {
        let mut input = ProjectRiskInput::new();
        input.insert_set(crate::input::CategoryRiskSet::new(RiskCategory::Market));
        assert_eq!(score(&input).unwrap().market_risk, EMPTY_CATEGORY_SCORE);
    }

    #[test]
    fn schedule_only_example() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Schedule, factor(7.0, 6.0))
            .with_factor(RiskCategory::Schedule, factor(8.0, 5.0));
        let result = score(&input).unwrap();
        assert_eq!(result.schedule_risk, 8.2);
        assert_eq!(result.budget_risk, 5.0);
        assert_eq!(result.overall_risk, 5.8);
    }

    #[test]
    fn technical_only_example_rounds_overall() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Technical, factor(8.0, 7.0))
            .with_factor(RiskCategory::Technical, factor(6.0, 5.0));
        let result = score(&input).unwrap();
        assert_eq!(result.technical_risk, 8.6);
        assert_eq!(result.overall_risk, 6.1);
    }

    #[test]
    fn market_overflow_is_not_clamped() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Market, factor(8.0, 8.0))
            .with_factor(RiskCategory::Market, factor(9.0, 9.0));
        let result = score(&input).unwrap();
        assert_eq!(result.market_risk, 14.5);
        assert_eq!(result.overall_risk, 6.9);
        assert!(result.exceeds_scale());
    }

    #[test]
    fn repeated_high_factors_exceed_ten() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Budget, factor(8.0, 8.0))
            .with_factor(RiskCategory::Budget, factor(8.0, 8.0));
        assert_eq!(score(&input).unwrap().budget_risk, 12.8);
    }

    #[test]
    fn clamp_policy_caps_scores() {
        let engine = RiskScoringEngine::new(ScoringPolicy {
            clamp: true,
            ..ScoringPolicy::default()
        })
        .unwrap();
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Market, factor(9.0, 9.0))
            .with_factor(RiskCategory::Market, factor(9.0, 9.0));
        let result = engine.score(&input).unwrap();
        assert_eq!(result.market_risk, 10.0);
        assert_eq!(result.overall_risk, 6.0);
        assert!(!result.exceeds_scale());
    }

    #[test]
    fn reference_portfolio_scores() {
        let result = score(&reference_portfolio()).unwrap();
        assert_eq!(result.schedule_risk, 8.2);
        assert_eq!(result.budget_risk, 7.2);
        assert_eq!(result.technical_risk, 8.6);
        assert_eq!(result.market_risk, 6.7);
        assert_eq!(result.overall_risk, 7.8);
        assert_eq!(result.dominant_category(), RiskCategory::Technical);
    }

    #[test]
    fn scoring_is_deterministic_and_leaves_input_untouched() {
        let input = reference_portfolio();
        let snapshot = input.clone();
        let first = score(&input).unwrap();
        let second = score(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn impact_twelve_is_rejected() {
        let input = ProjectRiskInput::new().with_factor(RiskCategory::Technical, factor(12.0, 3.0));
        assert!(matches!(
            score(&input),
            Err(ValidationError::OutOfRange { value, .. }) if (value - 12.0).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn range_edges_are_rejected() {
        for (impact, likelihood) in [(-1.0, 5.0), (11.0, 5.0), (5.0, -1.0), (5.0, 11.0)] {
            let input = ProjectRiskInput::new().with_factor(RiskCategory::Schedule, factor(impact, likelihood));
            assert!(score(&input).is_err(), "{impact}/{likelihood} accepted");
        }
    }

    #[test]
    fn json_scoring_rejects_non_numeric() {
        let engine = RiskScoringEngine::default();
        let err = engine
            .score_json(&json!({ "schedule": [{ "name": "x", "impact": "high", "likelihood": 3 }] }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonNumeric { .. }));
        let ok = engine
            .score_json(&json!({ "schedule_risk_factors": [{ "name": "x", "impact": 7, "likelihood": 6 }] }))
            .unwrap();
        assert_eq!(ok.schedule_risk, 4.2);
    }

    #[test]
    fn every_score_has_one_decimal() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Schedule, factor(3.3, 7.7))
            .with_factor(RiskCategory::Budget, factor(9.1, 2.3))
            .with_factor(RiskCategory::Technical, factor(4.4, 4.4));
        let result = score(&input).unwrap();
        for value in [
            result.overall_risk,
            result.schedule_risk,
            result.budget_risk,
            result.technical_risk,
            result.market_risk,
        ] {
            assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-9, "{value}");
        }
    }

    #[test]
    fn overall_rounds_stored_value_not_printed_tie() {
        // 7.0 / 6.2 / 6.7 / 2.7 weigh to a value stored just below 5.85.
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Schedule, factor(7.0, 10.0))
            .with_factor(RiskCategory::Budget, factor(8.0, 7.0))
            .with_factor(RiskCategory::Budget, factor(6.0, 1.0))
            .with_factor(RiskCategory::Technical, factor(8.0, 8.0))
            .with_factor(RiskCategory::Technical, factor(3.0, 1.0))
            .with_factor(RiskCategory::Market, factor(9.0, 3.0));
        let result = score(&input).unwrap();
        assert_eq!(result.schedule_risk, 7.0);
        assert_eq!(result.budget_risk, 6.2);
        assert_eq!(result.technical_risk, 6.7);
        assert_eq!(result.market_risk, 2.7);
        assert_eq!(result.overall_risk, 5.8);
    }

    #[test]
    fn rounding_follows_binary_value() {
        assert_eq!(round_to_tenth(1.45), 1.4);
        assert_eq!(round_to_tenth(8.26), 8.3);
        assert_eq!(round_to_tenth(14.5), 14.5);
        assert_eq!(round_to_tenth(-0.06), -0.1);
    }

    #[test]
    fn custom_weights_shift_overall() {
        let engine = RiskScoringEngine::new(ScoringPolicy {
            weights: CategoryWeights::new(1.0, 0.0, 0.0, 0.0).unwrap(),
            ..ScoringPolicy::default()
        })
        .unwrap();
        let input = ProjectRiskInput::new().with_factor(RiskCategory::Schedule, factor(9.0, 9.0));
        assert_eq!(engine.score(&input).unwrap().overall_risk, 8.1);
    }

    #[test]
    fn engine_rejects_invalid_weights() {
        let policy = ScoringPolicy {
            weights: CategoryWeights {
                schedule: 0.5,
                budget: 0.5,
                technical: 0.5,
                market: 0.5,
            },
            ..ScoringPolicy::default()
        };
        assert!(matches!(
            RiskScoringEngine::new(policy),
            Err(ValidationError::InvalidWeights(_))
        ));
    }

    #[test]
    fn breakdown_ranks_by_severity() {
        let breakdown = RiskScoringEngine::default()
            .breakdown(&reference_portfolio())
            .unwrap();
        assert_eq!(breakdown.result.overall_risk, 7.8);
        let top: Vec<_> = breakdown.top(3).iter().map(|r| r.factor.name.as_str()).collect();
        assert_eq!(
            top,
            vec!["Integration complexity", "Timeline slippage", "Cost overruns"]
        );
        assert_eq!(breakdown.ranked[0].severity, 5.6);
        let market = &breakdown.categories[3];
        assert_eq!(market.factor_count, 2);
        assert!((market.exposure_sum - 67.0).abs() < 1e-9);
        assert!(!market.defaulted);
        assert_eq!(breakdown.top(50).len(), 8);
    }

    #[test]
    fn policy_loads_from_json_with_defaults() {
        let policy: ScoringPolicy =
            serde_json::from_value(json!({ "clamp": true, "unknown_categories": "ignore" })).unwrap();
        assert!(policy.clamp);
        assert_eq!(policy.unknown_categories, UnknownCategoryPolicy::Ignore);
        assert_eq!(policy.weights, CategoryWeights::STANDARD);
    }
}
