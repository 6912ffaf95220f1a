use chrono::NaiveDate;
use indexmap::IndexMap;
use riskdesk_scoring::{round_to_tenth, RiskCategory};
use serde::Serialize;

use crate::{
    alerts::RiskLevel,
    assessment::ProjectAssessment,
    status::TrendDirection,
};

/// Project at or above the high-risk band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskProject {
    /// Project.
    pub project_id: String,
    /// Display name.
    pub project_name: String,
    /// Overall score.
    pub overall_risk: f64,
    /// Highest-scoring category.
    pub dominant_category: RiskCategory,
    /// Trend direction.
    pub trend: TrendDirection,
    /// Change since the previous assessment.
    pub trend_delta: Option<f64>,
}

/// Dashboard totals across a set of assessments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Latest evaluation date among the assessments.
    pub as_of: Option<NaiveDate>,
    /// Projects assessed.
    pub project_count: usize,
    /// Mean overall score, rounded; `None` for an empty portfolio.
    pub mean_overall_risk: Option<f64>,
    /// Mean score per category, rounded.
    pub category_means: IndexMap<RiskCategory, f64>,
    /// Projects per band.
    pub level_counts: IndexMap<RiskLevel, usize>,
    /// Alerts raised.
    pub alert_count: usize,
    /// High-band projects, highest score first.
    pub high_risk: Vec<HighRiskProject>,
}

impl PortfolioSummary {
    /// Aggregates `assessments`.
    #[must_use]
    pub fn from_assessments(assessments: &[ProjectAssessment]) -> Self {
        let category_means = RiskCategory::ALL
            .into_iter()
            .filter_map(|category| {
                mean(assessments, |assessment| assessment.scores.category(category))
                    .map(|m| (category, m))
            })
            .collect();

        let mut level_counts: IndexMap<RiskLevel, usize> =
            [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]
                .into_iter()
                .map(|level| (level, 0))
                .collect();
        for assessment in assessments {
            *level_counts.entry(assessment.level).or_default() += 1;
        }

        let mut high_risk: Vec<HighRiskProject> = assessments
            .iter()
            .filter(|assessment| assessment.level == RiskLevel::High)
            .map(|assessment| HighRiskProject {
                project_id: assessment.project_id.clone(),
                project_name: assessment.project_name.clone(),
                overall_risk: assessment.scores.overall_risk,
                dominant_category: assessment.scores.dominant_category(),
                trend: assessment.status.trend.direction,
                trend_delta: assessment.status.trend.delta,
            })
            .collect();
        high_risk.sort_by(|a, b| {
            b.overall_risk
                .total_cmp(&a.overall_risk)
                .then_with(|| a.project_name.cmp(&b.project_name))
        });

        Self {
            as_of: assessments.iter().map(|assessment| assessment.as_of).max(),
            project_count: assessments.len(),
            mean_overall_risk: mean(assessments, |assessment| assessment.scores.overall_risk),
            category_means,
            level_counts,
            alert_count: assessments
                .iter()
                .filter(|assessment| assessment.alert.is_some())
                .count(),
            high_risk,
        }
    }
}

fn mean(
    assessments: &[ProjectAssessment],
    pick: impl Fn(&ProjectAssessment) -> f64,
) -> Option<f64> {
    if assessments.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = assessments.len() as f64;
    Some(round_to_tenth(assessments.iter().map(pick).sum::<f64>() / count))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{
        assessment::RiskAssessmentService, config::RiskDeskConfig, project::ProjectRecord,
        telemetry::RiskTelemetry,
    };
    use riskdesk_scoring::RiskFactor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(id: &str, name: &str, factors: &[(RiskCategory, f64, f64)]) -> ProjectRecord {
        factors.iter().enumerate().fold(
            ProjectRecord::new(id, name, date(2024, 1, 1), date(2024, 12, 31), 0.0),
            |record, (idx, (category, impact, likelihood))| {
                record.with_factor(*category, RiskFactor::new(format!("f{idx}"), *impact, *likelihood))
            },
        )
    }

    async fn assess(records: &[ProjectRecord]) -> Vec<ProjectAssessment> {
        let telemetry = RiskTelemetry::builder("portfolio").build().unwrap();
        let service = RiskAssessmentService::new(&RiskDeskConfig::default(), telemetry).unwrap();
        let mut out = Vec::new();
        for record in records {
            out.push(service.assess(record, None, date(2024, 1, 1)).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn aggregates_levels_and_ranks_high_risk() {
        let assessments = assess(&[
            project("a", "Alpha", &[]),
            project(
                "b",
                "Beta",
                &[
                    (RiskCategory::Schedule, 10.0, 10.0),
                    (RiskCategory::Technical, 10.0, 9.0),
                ],
            ),
            project(
                "c",
                "Gamma",
                &[
                    (RiskCategory::Schedule, 10.0, 10.0),
                    (RiskCategory::Budget, 10.0, 10.0),
                    (RiskCategory::Technical, 10.0, 10.0),
                ],
            ),
        ])
        .await;
        let summary = PortfolioSummary::from_assessments(&assessments);
        assert_eq!(summary.project_count, 3);
        assert_eq!(summary.level_counts[&RiskLevel::High], 2);
        assert_eq!(summary.level_counts[&RiskLevel::Medium], 1);
        assert_eq!(summary.level_counts[&RiskLevel::Low], 0);
        assert_eq!(summary.alert_count, 2);
        let names: Vec<_> = summary.high_risk.iter().map(|p| p.project_name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Beta"]);
        assert_eq!(summary.category_means[&RiskCategory::Schedule], 8.3);
        assert_eq!(summary.category_means[&RiskCategory::Market], 5.0);
        assert_eq!(summary.as_of, Some(date(2024, 1, 1)));
    }

    #[test]
    fn empty_portfolio_has_no_means() {
        let summary = PortfolioSummary::from_assessments(&[]);
        assert_eq!(summary.project_count, 0);
        assert_eq!(summary.mean_overall_risk, None);
        assert!(summary.category_means.is_empty());
        assert!(summary.high_risk.is_empty());
    }
}
