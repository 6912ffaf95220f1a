use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;
use riskdesk_scoring::RiskCategory;
use serde::Serialize;

use crate::{
    alerts::RiskLevel,
    status::{RiskTrend, TrendDirection},
};

/// Facts a narrator may draw on for the executive summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    /// Project display name.
    pub project_name: String,
    /// Overall score.
    pub overall_risk: f64,
    /// Band of the overall score.
    pub level: RiskLevel,
    /// Highest-scoring category.
    pub dominant_category: RiskCategory,
    /// Score trend.
    pub trend: RiskTrend,
    /// Names of the most severe factors, most severe first.
    pub top_factors: Vec<String>,
    /// Issues found by status analysis.
    pub major_issues: Vec<String>,
}

/// Source of report prose. Implementations may call out to a language model;
/// they are injected, never constructed globally.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generator name for logs.
    fn name(&self) -> &str;

    /// Executive summary paragraph(s) in Markdown.
    async fn executive_summary(&self, request: &NarrativeRequest) -> Result<String>;
}

/// Deterministic template prose.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    fn name(&self) -> &str {
        "template"
    }

    async fn executive_summary(&self, request: &NarrativeRequest) -> Result<String> {
        let mut out = format!(
            "{} has an overall risk score of **{:.1}/10** ({}) with {}.",
            request.project_name,
            request.overall_risk,
            request.level,
            describe_trend(request.trend)
        );
        if request.top_factors.is_empty() {
            out.push_str(
                " No risk factors are recorded; every category uses the 5.0 no-data score.",
            );
        } else {
            let lead = match request.level {
                RiskLevel::High => "Immediate attention is required for",
                RiskLevel::Medium => "Close monitoring is recommended for",
                RiskLevel::Low => "The main residual risks are",
            };
            writeln!(
                out,
                " {} risk dominates. {lead} the following areas:",
                request.dominant_category.label()
            )?;
            for (idx, name) in request.top_factors.iter().enumerate() {
                write!(out, "\n{}. {name}", idx + 1)?;
            }
        }
        if !request.major_issues.is_empty() {
            out.push_str("\n\nObserved issues:\n");
            for issue in &request.major_issues {
                write!(out, "\n- {issue}")?;
            }
        }
        Ok(out)
    }
}

fn describe_trend(trend: RiskTrend) -> String {
    match (trend.direction, trend.delta) {
        (TrendDirection::Increasing, Some(delta)) => {
            format!("an **increasing** trend (+{delta:.1} since the previous assessment)")
        }
        (TrendDirection::Decreasing, Some(delta)) => {
            format!("a **decreasing** trend ({delta:.1} since the previous assessment)")
        }
        (_, None) => "no earlier assessment to compare against".to_string(),
        _ => "a **stable** trend".to_string(),
    }
}
