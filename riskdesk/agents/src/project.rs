use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use parking_lot::RwLock;
use riskdesk_scoring::{ProjectRiskInput, RiskCategory, RiskFactor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::market::MarketSignals;

/// Lifecycle status tracked for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Not yet started.
    #[serde(rename = "Planning", alias = "planning")]
    Planning,
    /// Running without known issues.
    #[serde(rename = "On Track", alias = "on_track")]
    OnTrack,
    /// Running.
    #[serde(rename = "In Progress", alias = "in_progress")]
    InProgress,
    /// Flagged by the project team.
    #[serde(rename = "At Risk", alias = "at_risk")]
    AtRisk,
    /// Delivered.
    #[serde(rename = "Completed", alias = "completed")]
    Completed,
}

/// Risk factor tagged with its category, as stored on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedFactor {
    /// Category.
    pub category: RiskCategory,
    /// Factor fields.
    #[serde(flatten)]
    pub factor: RiskFactor,
}

impl CategorizedFactor {
    /// Tags `factor` with `category`.
    #[must_use]
    pub const fn new(category: RiskCategory, factor: RiskFactor) -> Self {
        Self { category, factor }
    }
}

/// Overall score recorded on a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    /// Assessment date.
    pub date: NaiveDate,
    /// Overall score on that date.
    pub overall_risk: f64,
}

/// Project as supplied by the project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text summary.
    #[serde(default)]
    pub description: String,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Business domain, used to look up market signals.
    #[serde(default)]
    pub domain: Option<String>,
    /// Planned start.
    pub start_date: NaiveDate,
    /// Planned end.
    pub end_date: NaiveDate,
    /// Approved budget.
    pub budget: f64,
    /// Spend to date.
    #[serde(default)]
    pub spent: f64,
    /// Completed fraction of work, 0..=1.
    #[serde(default)]
    pub progress: f64,
    /// Fraction of team capacity allocated, 0..=1 (may exceed 1 when overbooked).
    #[serde(default)]
    pub resource_utilization: Option<f64>,
    /// Recorded risk factors.
    #[serde(default)]
    pub risk_factors: Vec<CategorizedFactor>,
    /// Past overall scores, oldest first.
    #[serde(default)]
    pub risk_history: Vec<RiskSnapshot>,
}

impl ProjectRecord {
    /// Creates an in-progress project with no spend, progress or factors.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::InProgress,
            domain: None,
            start_date,
            end_date,
            budget,
            spent: 0.0,
            progress: 0.0,
            resource_utilization: None,
            risk_factors: Vec::new(),
            risk_history: Vec::new(),
        }
    }

    /// Adds a recorded factor.
    #[must_use]
    pub fn with_factor(mut self, category: RiskCategory, factor: RiskFactor) -> Self {
        self.risk_factors.push(CategorizedFactor::new(category, factor));
        self
    }

    /// Groups the recorded factors into scoring input.
    #[must_use]
    pub fn risk_input(&self) -> ProjectRiskInput {
        self.risk_factors
            .iter()
            .map(|entry| (entry.category, entry.factor.clone()))
            .collect()
    }

    /// Planned duration in days, at least one.
    #[must_use]
    pub fn planned_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().max(1)
    }

    /// History sorted by date.
    #[must_use]
    pub fn sorted_history(&self) -> Vec<RiskSnapshot> {
        let mut history = self.risk_history.clone();
        history.sort_by_key(|snapshot| snapshot.date);
        history
    }
}

/// Errors from a project store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No project with this id.
    #[error("project `{0}` not found")]
    NotFound(String),
}

/// Source of project records. Persistence is the implementor's concern.
pub trait ProjectStore: Send + Sync {
    /// Fetches one project.
    fn get(&self, id: &str) -> Result<ProjectRecord, StoreError>;

    /// All projects in insertion order.
    fn list(&self) -> Vec<ProjectRecord>;

    /// Inserts or replaces a project.
    fn upsert(&self, record: ProjectRecord);

    /// Appends an overall score to a project's history, replacing any entry on the same date.
    fn record_score(&self, id: &str, snapshot: RiskSnapshot) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    inner: Arc<RwLock<IndexMap<String, ProjectRecord>>>,
}

impl InMemoryProjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = ProjectRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    /// Number of projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// `true` when no project is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn get(&self, id: &str) -> Result<ProjectRecord, StoreError> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> Vec<ProjectRecord> {
        self.inner.read().values().cloned().collect()
    }

    fn upsert(&self, record: ProjectRecord) {
        self.inner.write().insert(record.id.clone(), record);
    }

    fn record_score(&self, id: &str, snapshot: RiskSnapshot) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let record = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.risk_history.retain(|entry| entry.date != snapshot.date);
        record.risk_history.push(snapshot);
        record.risk_history.sort_by_key(|entry| entry.date);
        Ok(())
    }
}

/// Portfolio file: projects plus market signals keyed by domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Projects.
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    /// Market signals per domain; `default` applies to projects without a match.
    #[serde(default)]
    pub market: IndexMap<String, MarketSignals>,
}

impl Portfolio {
    /// Reads a JSON portfolio file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading portfolio {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing portfolio {}", path.display()))
    }

    /// Writes the portfolio back as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing portfolio {}", path.display()))
    }

    /// Signals for a project's domain, falling back to the `default` entry.
    #[must_use]
    pub fn market_for(&self, project: &ProjectRecord) -> Option<&MarketSignals> {
        project
            .domain
            .as_deref()
            .and_then(|domain| {
                self.market
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(domain))
                    .map(|(_, signals)| signals)
            })
            .or_else(|| self.market.get("default"))
    }

    /// Loads the projects into a fresh in-memory store.
    #[must_use]
    pub fn store(&self) -> InMemoryProjectStore {
        InMemoryProjectStore::with_records(self.projects.clone())
    }
}
