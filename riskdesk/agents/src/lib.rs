#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Services around the RiskDesk scoring engine: project status and market
//! analysis, the assessment pipeline, alerting, portfolio summaries and
//! Markdown reporting.

/// Alert policy and risk bands.
pub mod alerts;
/// Assessment pipeline.
pub mod assessment;
/// `riskdesk.toml` configuration.
pub mod config;
/// Market signal analysis.
pub mod market;
/// Mitigation playbooks.
pub mod mitigation;
/// Narrative generation seam.
pub mod narrative;
/// Portfolio-level aggregation.
pub mod portfolio;
/// Project records and stores.
pub mod project;
/// Markdown reports.
pub mod report;
/// Schedule, budget and trend analysis.
pub mod status;
/// Logging and event helpers.
pub mod telemetry;

pub use alerts::{AlertPolicy, InvalidThreshold, RiskAlert, RiskLevel, DEFAULT_ALERT_THRESHOLD};
pub use assessment::{AreaAssessment, AssessmentError, ProjectAssessment, RiskAssessmentService};
pub use config::{AlertSettings, ConfigError, MarketSettings, RiskDeskConfig, TelemetrySettings};
pub use market::{
    GrowthOutlook, MarketAnalyzer, MarketOutlook, MarketSignals, SignalError, SignalLevel,
    DEFAULT_SIGNAL_FLOOR,
};
pub use mitigation::{MitigationAction, MitigationPlaybook};
pub use narrative::{NarrativeGenerator, NarrativeRequest, TemplateNarrator};
pub use portfolio::{HighRiskProject, PortfolioSummary};
pub use project::{
    CategorizedFactor, InMemoryProjectStore, Portfolio, ProjectRecord, ProjectStatus,
    ProjectStore, RiskSnapshot, StoreError,
};
pub use report::ReportGenerator;
pub use status::{ProjectStatusAnalyzer, RiskTrend, StatusAssessment, TrendDirection};
pub use telemetry::{RiskTelemetry, RiskTelemetryBuilder};
