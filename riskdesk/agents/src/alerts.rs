use std::fmt;

use chrono::{DateTime, Utc};
use riskdesk_scoring::{RiskCategory, RiskScoreResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default overall score at which an alert is raised.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 7.0;

/// Band of a score: below 4 low, below 7 medium, otherwise high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 4.0.
    Low,
    /// 4.0 up to 7.0.
    Medium,
    /// 7.0 and above.
    High,
}

impl RiskLevel {
    /// Bands a score.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// Threshold outside the score scale.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("alert threshold {0} is outside [0, 10]")]
pub struct InvalidThreshold(pub f64);

/// Alert raised for a project whose overall score reached the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    /// Alert id.
    pub id: Uuid,
    /// Project.
    pub project_id: String,
    /// Project display name.
    pub project_name: String,
    /// Overall score that triggered the alert.
    pub overall_risk: f64,
    /// Threshold in force.
    pub threshold: f64,
    /// Highest-scoring category.
    pub dominant_category: RiskCategory,
    /// One-line summary.
    pub message: String,
    /// Creation time.
    pub raised_at: DateTime<Utc>,
}

/// Decides when an assessment warrants an alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

impl AlertPolicy {
    /// Policy alerting at `threshold` and above.
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if !(0.0..=10.0).contains(&threshold) {
            return Err(InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    /// Configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Alert for `scores` if the overall score reaches the threshold.
    #[must_use]
    pub fn evaluate(
        &self,
        project_id: &str,
        project_name: &str,
        scores: &RiskScoreResult,
    ) -> Option<RiskAlert> {
        if scores.overall_risk < self.threshold {
            return None;
        }
        let dominant = scores.dominant_category();
        Some(RiskAlert {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            project_name: project_name.to_string(),
            overall_risk: scores.overall_risk,
            threshold: self.threshold,
            dominant_category: dominant,
            message: format!(
                "{project_name} risk {:.1}/10 reached the {:.1} threshold; {} risk is highest at {:.1}",
                scores.overall_risk,
                self.threshold,
                dominant.label().to_lowercase(),
                scores.category(dominant)
            ),
            raised_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(overall: f64) -> RiskScoreResult {
        RiskScoreResult {
            overall_risk: overall,
            schedule_risk: 8.2,
            budget_risk: 7.2,
            technical_risk: 8.6,
            market_risk: 6.7,
        }
    }

    #[test]
    fn classifies_bands() {
        assert_eq!(RiskLevel::classify(3.9), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(4.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(6.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(7.0), RiskLevel::High);
        assert_eq!(RiskLevel::classify(14.5), RiskLevel::High);
    }

    #[test]
    fn alerts_at_threshold_inclusive() {
        let policy = AlertPolicy::default();
        assert!(policy.evaluate("p", "Portal", &scores(6.9)).is_none());
        let alert = policy.evaluate("p", "Portal", &scores(7.0)).unwrap();
        assert_eq!(alert.dominant_category, RiskCategory::Technical);
        assert_eq!(
            alert.message,
            "Portal risk 7.0/10 reached the 7.0 threshold; technical risk is highest at 8.6"
        );
    }

    #[test]
    fn rejects_threshold_off_scale() {
        assert_eq!(AlertPolicy::new(10.5), Err(InvalidThreshold(10.5)));
        assert!((AlertPolicy::new(6.5).unwrap().threshold() - 6.5).abs() < f64::EPSILON);
    }
}
