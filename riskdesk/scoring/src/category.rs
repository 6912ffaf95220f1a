use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed risk dimension a factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    /// Timeline and delivery risk.
    Schedule,
    /// Cost and funding risk.
    Budget,
    /// Engineering and integration risk.
    Technical,
    /// External market and regulatory risk.
    Market,
}

impl RiskCategory {
    /// All categories in reporting order.
    pub const ALL: [Self; 4] = [Self::Schedule, Self::Budget, Self::Technical, Self::Market];

    /// Lower-case key used in inputs and outputs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Budget => "budget",
            Self::Technical => "technical",
            Self::Market => "market",
        }
    }

    /// Title-case label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Schedule => "Schedule",
            Self::Budget => "Budget",
            Self::Technical => "Technical",
            Self::Market => "Market",
        }
    }

    /// Resolves an input key. Accepts `schedule`, `schedule_risk` and
    /// `schedule_risk_factors` (any case) for each category.
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let base = key
            .strip_suffix("_risk_factors")
            .or_else(|| key.strip_suffix("_risk"))
            .unwrap_or(key.as_str());
        Self::ALL.into_iter().find(|category| category.as_str() == base)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_key(s).ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}
