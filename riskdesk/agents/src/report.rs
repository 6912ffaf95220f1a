use std::{fmt::Write as _, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    assessment::ProjectAssessment,
    mitigation::MitigationPlaybook,
    narrative::{NarrativeGenerator, NarrativeRequest, TemplateNarrator},
    status::TrendDirection,
};

/// Renders Markdown risk reports from assessments.
#[derive(Clone)]
pub struct ReportGenerator {
    narrator: Arc<dyn NarrativeGenerator>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(Arc::new(TemplateNarrator))
    }
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("narrator", &self.narrator.name())
            .finish()
    }
}

impl ReportGenerator {
    /// Generator using `narrator` for the executive summary.
    #[must_use]
    pub fn new(narrator: Arc<dyn NarrativeGenerator>) -> Self {
        Self { narrator }
    }

    /// Full Markdown report for one assessment.
    pub async fn render(&self, assessment: &ProjectAssessment) -> Result<String> {
        let request = NarrativeRequest {
            project_name: assessment.project_name.clone(),
            overall_risk: assessment.scores.overall_risk,
            level: assessment.level,
            dominant_category: assessment.scores.dominant_category(),
            trend: assessment.status.trend,
            top_factors: assessment
                .top_factors
                .iter()
                .take(3)
                .map(|ranked| ranked.factor.name.clone())
                .collect(),
            major_issues: assessment.status.major_issues.clone(),
        };
        let summary = self
            .narrator
            .executive_summary(&request)
            .await
            .with_context(|| format!("narrator `{}` failed", self.narrator.name()))?;

        let mut out = format!(
            "# Risk Report: {}\n\n_Assessed {}_\n\n## Executive Summary\n\n{summary}\n\n",
            assessment.project_name, assessment.as_of
        );
        if let Some(alert) = &assessment.alert {
            writeln!(out, "> **ALERT:** {}\n", alert.message)?;
        }

        out.push_str("## Risk Scores\n\n| Category | Score | Weight | Factors |\n|---|---|---|---|\n");
        for row in &assessment.categories {
            let factors = if row.defaulted {
                "none (default)".to_string()
            } else {
                row.factor_count.to_string()
            };
            writeln!(
                out,
                "| {} | {:.1} | {:.0}% | {factors} |",
                row.category.label(),
                row.score,
                row.weight * 100.0
            )?;
        }
        writeln!(
            out,
            "| **Overall** | **{:.1}** | | {} |\n",
            assessment.scores.overall_risk, assessment.level
        )?;

        out.push_str("## Top Risk Factors\n\n");
        if assessment.top_factors.is_empty() {
            out.push_str("No risk factors recorded.\n\n");
        } else {
            for (idx, ranked) in assessment.top_factors.iter().enumerate() {
                write!(
                    out,
                    "{}. **{}** ({}, impact {:.1}, likelihood {:.1}, severity {:.1})",
                    idx + 1,
                    ranked.factor.name,
                    ranked.category.label(),
                    ranked.factor.impact,
                    ranked.factor.likelihood,
                    ranked.severity
                )?;
                if let Some(description) = &ranked.factor.description {
                    write!(out, ": {description}")?;
                }
                out.push('\n');
                if let Some(mitigation) = &ranked.factor.mitigation {
                    writeln!(out, "   - Mitigation: {mitigation}")?;
                }
            }
            out.push('\n');
        }

        out.push_str("## Project Status\n\n");
        writeln!(out, "- Schedule: {}", assessment.status.schedule_status)?;
        writeln!(out, "- Budget: {}", assessment.status.budget_status)?;
        if let Some(utilization) = assessment.status.resource_utilization {
            writeln!(out, "- Resource utilization: {:.0}%", utilization * 100.0)?;
        }
        out.push('\n');

        if let Some(market) = &assessment.market {
            writeln!(
                out,
                "## Market Outlook ({})\n\n- Volatility: {:?}\n- Regulatory changes: {:?}\n- Competition: {:?}\n- Technology disruption: {:?}\n- Growth: {:?}\n",
                market.domain,
                market.industry_volatility,
                market.regulatory_changes,
                market.competitive_landscape,
                market.technology_disruption,
                market.market_growth
            )?;
        }

        out.push_str("## Recommended Mitigation Strategies\n\n");
        let focus = assessment
            .top_factors
            .first()
            .map(|ranked| ranked.category);
        out.push_str(&MitigationPlaybook::for_category(focus).render_markdown(3));
        out.push('\n');

        out.push_str("## Risk Trend Analysis\n\n");
        let trend = assessment.status.trend;
        match trend.delta {
            None => out.push_str("No earlier assessment recorded.\n"),
            Some(delta) => {
                let word = match trend.direction {
                    TrendDirection::Increasing => "increasing",
                    TrendDirection::Decreasing => "decreasing",
                    TrendDirection::Stable => "stable",
                };
                writeln!(out, "Overall risk is {word} ({delta:+.1} since the previous assessment).")?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assessment::RiskAssessmentService, config::RiskDeskConfig, project::ProjectRecord,
        telemetry::RiskTelemetry,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use riskdesk_scoring::{RiskCategory, RiskFactor};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn assessment() -> ProjectAssessment {
        let record =
            ProjectRecord::new("p-1", "ERP Migration", date(2024, 1, 1), date(2024, 12, 31), 0.0)
                .with_factor(
                    RiskCategory::Technical,
                    RiskFactor::new("Integration complexity", 8.0, 7.0)
                        .with_mitigation("Add integration test cycles"),
                )
                .with_factor(RiskCategory::Technical, RiskFactor::new("Technical debt", 6.0, 5.0))
                .with_factor(RiskCategory::Schedule, RiskFactor::new("Timeline slippage", 7.0, 6.0));
        let telemetry = RiskTelemetry::builder("report").build().unwrap();
        RiskAssessmentService::new(&RiskDeskConfig::default(), telemetry)
            .unwrap()
            .assess(&record, None, date(2024, 1, 1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn report_contains_name_scores_and_playbook() {
        let report = ReportGenerator::default()
            .render(&assessment().await)
            .await
            .unwrap();
        assert!(report.starts_with("# Risk Report: ERP Migration\n"));
        assert!(report.contains("| Technical | 8.6 | 30% | 2 |"));
        assert!(report.contains("| Market | 5.0 | 20% | none (default) |"));
        assert!(report.contains("1. **Integration complexity** (Technical, impact 8.0"));
        assert!(report.contains("   - Mitigation: Add integration test cycles"));
        assert!(report.contains("### Mitigation Strategy for Technical Risk"));
        assert!(report.contains("No earlier assessment recorded."));
    }

    struct FailingNarrator;

    #[async_trait]
    impl NarrativeGenerator for FailingNarrator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn executive_summary(&self, _request: &NarrativeRequest) -> Result<String> {
            anyhow::bail!("model unavailable")
        }
    }

    #[tokio::test]
    async fn narrator_failure_names_the_narrator() {
        let err = ReportGenerator::new(Arc::new(FailingNarrator))
            .render(&assessment().await)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("narrator `failing` failed"));
    }
}
