use chrono::NaiveDate;
use riskdesk_scoring::{round_to_tenth, RiskCategory, RiskFactor};
use serde::{Deserialize, Serialize};

use crate::project::{CategorizedFactor, ProjectRecord, ProjectStatus};

/// Utilization above this fraction counts as overallocation.
const OVERALLOCATION: f64 = 0.9;
/// Score changes smaller than this are reported as stable.
const TREND_EPSILON: f64 = 0.05;

/// Direction of the overall score between the two latest assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Score went up.
    Increasing,
    /// Score went down.
    Decreasing,
    /// Change below 0.05 or not enough history.
    Stable,
}

/// Trend with the score delta, when at least two assessments exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTrend {
    /// Direction.
    pub direction: TrendDirection,
    /// Latest minus previous overall score, rounded to one decimal.
    pub delta: Option<f64>,
}

impl RiskTrend {
    /// Trend from a project's history.
    #[must_use]
    pub fn from_record(record: &ProjectRecord) -> Self {
        let history = record.sorted_history();
        let [.., previous, latest] = history.as_slice() else {
            return Self {
                direction: TrendDirection::Stable,
                delta: None,
            };
        };
        let delta = round_to_tenth(latest.overall_risk - previous.overall_risk);
        let direction = if delta > TREND_EPSILON {
            TrendDirection::Increasing
        } else if delta < -TREND_EPSILON {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        Self {
            direction,
            delta: Some(delta),
        }
    }
}

/// Schedule, budget and staffing position of a project on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAssessment {
    /// Project analysed.
    pub project_id: String,
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// Share of the planned duration elapsed, 0..=1.
    pub expected_progress: f64,
    /// Reported progress, 0..=1.
    pub actual_progress: f64,
    /// Weeks behind plan (negative when ahead).
    pub schedule_slip_weeks: f64,
    /// Spend above earned value, in percent of budget (negative when under).
    pub budget_variance_pct: f64,
    /// e.g. `2 weeks behind`.
    pub schedule_status: String,
    /// e.g. `5% over budget`.
    pub budget_status: String,
    /// Team utilization if known.
    pub resource_utilization: Option<f64>,
    /// Human-readable issues.
    pub major_issues: Vec<String>,
    /// Schedule and budget factors derived from the figures above.
    pub derived_factors: Vec<CategorizedFactor>,
    /// Score trend from history.
    pub trend: RiskTrend,
}

/// Derives schedule and budget risk from a project's plan, spend and progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectStatusAnalyzer;

impl ProjectStatusAnalyzer {
    /// Analyzes `record` as of `as_of`.
    ///
    /// Expected progress is the elapsed share of the planned duration. Slip is
    /// `(expected − actual) × planned days / 7`. Budget variance compares spend
    /// with `budget × progress`.
    #[must_use]
    pub fn analyze(&self, record: &ProjectRecord, as_of: NaiveDate) -> StatusAssessment {
        #[allow(clippy::cast_precision_loss)]
        let planned_days = record.planned_days() as f64;
        #[allow(clippy::cast_precision_loss)]
        let elapsed_days = ((as_of - record.start_date).num_days() as f64).clamp(0.0, planned_days);
        let expected = elapsed_days / planned_days;
        let actual = record.progress.clamp(0.0, 1.0);
        let slip_share = expected - actual;
        let slip_weeks = round_to_tenth(slip_share * planned_days / 7.0);

        let budget_variance_pct = if record.budget > 0.0 {
            round_to_tenth((record.spent - record.budget * actual) / record.budget * 100.0)
        } else {
            0.0
        };

        let mut derived = Vec::new();
        let mut issues = Vec::new();

        if slip_weeks >= 1.0 {
            let factor = RiskFactor::new(
                "Timeline slippage",
                scale(slip_share * 20.0),
                scale(expected * 10.0),
            )
            .with_description(format!(
                "{} against a plan of {:.0}% complete",
                describe_weeks(slip_weeks, "behind"),
                expected * 100.0
            ));
            issues.push(format!("Schedule is {}", describe_weeks(slip_weeks, "behind")));
            derived.push(CategorizedFactor::new(RiskCategory::Schedule, factor));
        }

        if budget_variance_pct >= 2.0 && record.budget > 0.0 {
            let consumed = record.spent / record.budget;
            let factor = RiskFactor::new(
                "Cost overruns",
                scale(budget_variance_pct / 2.0),
                scale(consumed * 10.0),
            )
            .with_description(format!(
                "Spend is {budget_variance_pct:.0}% of budget ahead of delivered work"
            ));
            issues.push(format!("Spending {budget_variance_pct:.0}% ahead of earned value"));
            derived.push(CategorizedFactor::new(RiskCategory::Budget, factor));
        }

        if let Some(utilization) = record.resource_utilization.filter(|u| *u > OVERALLOCATION) {
            let factor = RiskFactor::new(
                "Resource overallocation",
                scale((utilization - OVERALLOCATION) * 50.0 + 5.0),
                scale(utilization * 10.0),
            )
            .with_description(format!("Team allocated at {:.0}% of capacity", utilization * 100.0));
            issues.push(format!("Key resources allocated at {:.0}%", utilization * 100.0));
            derived.push(CategorizedFactor::new(RiskCategory::Schedule, factor));
        }

        if as_of > record.end_date && actual < 1.0 {
            issues.push(format!(
                "Past planned end date with {:.0}% of work remaining",
                (1.0 - actual) * 100.0
            ));
        }
        if record.status == ProjectStatus::AtRisk {
            issues.push("Flagged at risk by the project team".into());
        }

        StatusAssessment {
            project_id: record.id.clone(),
            as_of,
            expected_progress: expected,
            actual_progress: actual,
            schedule_slip_weeks: slip_weeks,
            budget_variance_pct,
            schedule_status: schedule_status(slip_weeks),
            budget_status: budget_status(budget_variance_pct),
            resource_utilization: record.resource_utilization,
            major_issues: issues,
            derived_factors: derived,
            trend: RiskTrend::from_record(record),
        }
    }
}

fn scale(value: f64) -> f64 {
    round_to_tenth(value.clamp(0.0, 10.0))
}

fn describe_weeks(weeks: f64, direction: &str) -> String {
    let whole = weeks.abs().round();
    if (whole - 1.0).abs() < f64::EPSILON {
        format!("1 week {direction}")
    } else {
        format!("{whole:.0} weeks {direction}")
    }
}

fn schedule_status(slip_weeks: f64) -> String {
    if slip_weeks >= 0.5 {
        describe_weeks(slip_weeks, "behind")
    } else if slip_weeks <= -0.5 {
        describe_weeks(slip_weeks, "ahead")
    } else {
        "on schedule".into()
    }
}

fn budget_status(variance_pct: f64) -> String {
    if variance_pct >= 0.5 {
        format!("{variance_pct:.0}% over budget")
    } else if variance_pct <= -0.5 {
        format!("{:.0}% under budget", -variance_pct)
    } else {
        "on budget".into()
    }
}
