use chrono::NaiveDate;
use futures::future::join_all;
use riskdesk_scoring::{
    CategoryBreakdown, ProjectRiskInput, RankedFactor, RiskCategory, RiskScoreResult,
    RiskScoringEngine, ValidationError,
};
use serde::Serialize;
use serde_json::json;
use shared_event_bus::{RISK_ALERT, RISK_ASSESSED};
use shared_logging::LogLevel;
use thiserror::Error;

use crate::{
    alerts::{AlertPolicy, InvalidThreshold, RiskAlert, RiskLevel},
    config::RiskDeskConfig,
    market::{MarketAnalyzer, MarketOutlook, MarketSignals, SignalError},
    mitigation::MitigationPlaybook,
    project::{CategorizedFactor, Portfolio, ProjectRecord, ProjectStore, RiskSnapshot, StoreError},
    status::{ProjectStatusAnalyzer, RiskTrend, StatusAssessment},
    telemetry::RiskTelemetry,
};

/// Number of ranked factors kept on an assessment.
const TOP_FACTORS: usize = 5;
/// Number of factors listed by an area check.
const AREA_FACTORS: usize = 3;

/// Errors raised while assessing a project.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Scoring input rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Market signals rejected.
    #[error(transparent)]
    Signal(#[from] SignalError),
    /// Project lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Alert threshold rejected.
    #[error(transparent)]
    Threshold(#[from] InvalidThreshold),
    /// Payload could not be serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    /// Log or event delivery failed.
    #[error(transparent)]
    Telemetry(#[from] anyhow::Error),
}

/// Full assessment of one project on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAssessment {
    /// Project.
    pub project_id: String,
    /// Display name.
    pub project_name: String,
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// Headline scores.
    pub scores: RiskScoreResult,
    /// Band of the overall score.
    pub level: RiskLevel,
    /// Per-category detail.
    pub categories: Vec<CategoryBreakdown>,
    /// Most severe factors.
    pub top_factors: Vec<RankedFactor>,
    /// Schedule and budget position.
    pub status: StatusAssessment,
    /// Market view, when signals were available.
    pub market: Option<MarketOutlook>,
    /// Alert, when the overall score reached the threshold.
    pub alert: Option<RiskAlert>,
}

impl ProjectAssessment {
    /// History entry for this assessment.
    #[must_use]
    pub const fn snapshot(&self) -> RiskSnapshot {
        RiskSnapshot {
            date: self.as_of,
            overall_risk: self.scores.overall_risk,
        }
    }
}

/// Focused view of one category for a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAssessment {
    /// Project.
    pub project_id: String,
    /// Category examined.
    pub category: RiskCategory,
    /// Category score.
    pub score: f64,
    /// Band of the category score.
    pub level: RiskLevel,
    /// Overall score trend.
    pub trend: RiskTrend,
    /// Most severe factors in the category.
    pub key_factors: Vec<RankedFactor>,
    /// Playbook actions for the category.
    pub recommendations: Vec<String>,
}

/// Combines recorded, status-derived and market-derived factors, scores them
/// and reports the outcome through telemetry.
#[derive(Debug, Clone)]
pub struct RiskAssessmentService {
    engine: RiskScoringEngine,
    status: ProjectStatusAnalyzer,
    market: MarketAnalyzer,
    alerts: AlertPolicy,
    telemetry: RiskTelemetry,
}

impl RiskAssessmentService {
    /// Builds the service from configuration.
    pub fn new(config: &RiskDeskConfig, telemetry: RiskTelemetry) -> Result<Self, AssessmentError> {
        Ok(Self {
            engine: RiskScoringEngine::new(config.scoring)?,
            status: ProjectStatusAnalyzer,
            market: MarketAnalyzer::new(config.market.signal_floor)?,
            alerts: AlertPolicy::new(config.alerts.threshold)?,
            telemetry,
        })
    }

    /// Scoring input for a project. Derived factors replace recorded factors
    /// with the same name in the same category.
    #[must_use]
    pub fn assemble(
        &self,
        record: &ProjectRecord,
        status: &StatusAssessment,
        market: Option<&MarketOutlook>,
    ) -> ProjectRiskInput {
        let market_factors = market
            .into_iter()
            .flat_map(|outlook| &outlook.factors)
            .map(|factor| CategorizedFactor::new(RiskCategory::Market, factor.clone()));
        let derived: Vec<CategorizedFactor> = status
            .derived_factors
            .iter()
            .cloned()
            .chain(market_factors)
            .collect();
        record
            .risk_factors
            .iter()
            .filter(|recorded| {
                !derived.iter().any(|d| {
                    d.category == recorded.category && d.factor.name == recorded.factor.name
                })
            })
            .chain(&derived)
            .map(|entry| (entry.category, entry.factor.clone()))
            .collect()
    }

    /// Assesses one project.
    pub async fn assess(
        &self,
        record: &ProjectRecord,
        market: Option<&MarketSignals>,
        as_of: NaiveDate,
    ) -> Result<ProjectAssessment, AssessmentError> {
        let status = self.status.analyze(record, as_of);
        let market = market.map(|signals| self.market.analyze(signals)).transpose()?;
        let input = self.assemble(record, &status, market.as_ref());
        let breakdown = self.engine.breakdown(&input).map_err(|err| {
            tracing::warn!(project = %record.id, error = %err, "risk input rejected");
            err
        })?;
        let scores = breakdown.result;
        let alert = self.alerts.evaluate(&record.id, &record.name, &scores);
        let assessment = ProjectAssessment {
            project_id: record.id.clone(),
            project_name: record.name.clone(),
            as_of,
            scores,
            level: RiskLevel::classify(scores.overall_risk),
            top_factors: breakdown.top(TOP_FACTORS).to_vec(),
            categories: breakdown.categories,
            status,
            market,
            alert,
        };
        self.report(&assessment).await?;
        Ok(assessment)
    }

    /// Assesses every project in a portfolio concurrently, in portfolio order.
    pub async fn assess_portfolio(
        &self,
        portfolio: &Portfolio,
        as_of: NaiveDate,
    ) -> Result<Vec<ProjectAssessment>, AssessmentError> {
        let futures = portfolio
            .projects
            .iter()
            .map(|record| self.assess(record, portfolio.market_for(record), as_of));
        join_all(futures).await.into_iter().collect()
    }

    /// Assesses a stored project and appends the result to its history.
    pub async fn assess_and_record(
        &self,
        store: &dyn ProjectStore,
        project_id: &str,
        market: Option<&MarketSignals>,
        as_of: NaiveDate,
    ) -> Result<ProjectAssessment, AssessmentError> {
        let record = store.get(project_id)?;
        let assessment = self.assess(&record, market, as_of).await?;
        store.record_score(project_id, assessment.snapshot())?;
        Ok(assessment)
    }

    /// Examines a single category from the same factors `assess` scores.
    pub fn check_area(
        &self,
        record: &ProjectRecord,
        category: RiskCategory,
        market: Option<&MarketSignals>,
        as_of: NaiveDate,
    ) -> Result<AreaAssessment, AssessmentError> {
        let status = self.status.analyze(record, as_of);
        let market = market.map(|signals| self.market.analyze(signals)).transpose()?;
        let input = self.assemble(record, &status, market.as_ref());
        let breakdown = self.engine.breakdown(&input)?;
        let score = breakdown.result.category(category);
        Ok(AreaAssessment {
            project_id: record.id.clone(),
            category,
            score,
            level: RiskLevel::classify(score),
            trend: status.trend,
            key_factors: breakdown
                .ranked
                .into_iter()
                .filter(|ranked| ranked.category == category)
                .take(AREA_FACTORS)
                .collect(),
            recommendations: MitigationPlaybook::for_category(Some(category)).action_lines(),
        })
    }

    async fn report(&self, assessment: &ProjectAssessment) -> Result<(), AssessmentError> {
        let summary = json!({
            "project_id": assessment.project_id,
            "as_of": assessment.as_of.to_string(),
            "overall_risk": assessment.scores.overall_risk,
            "level": assessment.level,
            "dominant_category": assessment.scores.dominant_category(),
        });
        self.telemetry
            .log(LogLevel::Info, "risk.assessed", summary.clone())?;
        let mut payload = summary;
        payload["scores"] = serde_json::to_value(assessment.scores)?;
        self.telemetry.event(RISK_ASSESSED, payload).await?;

        if let Some(alert) = &assessment.alert {
            tracing::info!(project = %alert.project_id, overall = alert.overall_risk, "risk alert raised");
            let payload = serde_json::to_value(alert)?;
            self.telemetry
                .log(LogLevel::Warn, "risk.alert", payload.clone())?;
            self.telemetry.event(RISK_ALERT, payload).await?;
        }
        Ok(())
    }
}
