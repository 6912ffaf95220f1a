use riskdesk_scoring::{round_to_tenth, RiskFactor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signals at or above this value produce a market risk factor by default.
pub const DEFAULT_SIGNAL_FLOOR: f64 = 4.0;

/// Observed market indicators for one business domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    /// Domain label (e.g. `healthcare`).
    pub domain: String,
    /// Industry volatility, 0..=10.
    #[serde(default)]
    pub volatility: f64,
    /// Pressure from pending or recent regulation, 0..=10.
    #[serde(default)]
    pub regulatory_pressure: f64,
    /// Competitive pressure, 0..=10.
    #[serde(default)]
    pub competitive_pressure: f64,
    /// Pace of disruptive technology change, 0..=10.
    #[serde(default)]
    pub technology_disruption: f64,
    /// Demand outlook, -10 (contracting) ..= 10 (expanding).
    #[serde(default)]
    pub growth_outlook: f64,
}

impl MarketSignals {
    /// Signals with every indicator at zero.
    #[must_use]
    pub fn calm(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            volatility: 0.0,
            regulatory_pressure: 0.0,
            competitive_pressure: 0.0,
            technology_disruption: 0.0,
            growth_outlook: 0.0,
        }
    }

    fn validate(&self) -> Result<(), SignalError> {
        let pressures = [
            ("volatility", self.volatility),
            ("regulatory_pressure", self.regulatory_pressure),
            ("competitive_pressure", self.competitive_pressure),
            ("technology_disruption", self.technology_disruption),
        ];
        for (name, value) in pressures {
            check(name, value, 0.0, 10.0)?;
        }
        check("growth_outlook", self.growth_outlook, -10.0, 10.0)
    }
}

fn check(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), SignalError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SignalError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Invalid market signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Indicator outside its scale.
    #[error("market signal `{name}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Indicator key.
        name: &'static str,
        /// Supplied value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Floor outside the 0-10 scale.
    #[error("signal floor {0} is outside [0, 10]")]
    InvalidFloor(f64),
}

/// Qualitative band of an indicator: below 4 low, below 7 medium, otherwise high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalLevel {
    /// Below 4.
    Low,
    /// 4 up to 7.
    Medium,
    /// 7 and above.
    High,
}

impl SignalLevel {
    /// Bands `value`.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value >= 7.0 {
            Self::High
        } else if value >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Direction of demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthOutlook {
    /// Outlook above +1.
    Positive,
    /// Outlook within ±1.
    Flat,
    /// Outlook below -1.
    Negative,
}

impl GrowthOutlook {
    fn of(value: f64) -> Self {
        if value > 1.0 {
            Self::Positive
        } else if value < -1.0 {
            Self::Negative
        } else {
            Self::Flat
        }
    }
}

/// Market view for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutlook {
    /// Domain analysed.
    pub domain: String,
    /// Volatility band.
    pub industry_volatility: SignalLevel,
    /// Regulatory band.
    pub regulatory_changes: SignalLevel,
    /// Competition band.
    pub competitive_landscape: SignalLevel,
    /// Disruption band.
    pub technology_disruption: SignalLevel,
    /// Demand direction.
    pub market_growth: GrowthOutlook,
    /// Market risk factors derived from the signals, most severe first.
    pub factors: Vec<RiskFactor>,
}

/// Turns market signals into banded indicators and market-category risk factors.
#[derive(Debug, Clone, Copy)]
pub struct MarketAnalyzer {
    floor: f64,
}

impl Default for MarketAnalyzer {
    fn default() -> Self {
        Self {
            floor: DEFAULT_SIGNAL_FLOOR,
        }
    }
}

impl MarketAnalyzer {
    /// Analyzer emitting factors for signals at or above `floor`.
    pub fn new(floor: f64) -> Result<Self, SignalError> {
        if !(0.0..=10.0).contains(&floor) {
            return Err(SignalError::InvalidFloor(floor));
        }
        Ok(Self { floor })
    }

    /// Analyzes one domain.
    ///
    /// Each pressure at or above the floor becomes a factor whose impact is the
    /// signal and whose likelihood is the signal raised by half of any negative
    /// growth outlook. A contracting outlook past the floor adds a demand factor.
    pub fn analyze(&self, signals: &MarketSignals) -> Result<MarketOutlook, SignalError> {
        signals.validate()?;
        let headwind = (-signals.growth_outlook).max(0.0) / 2.0;
        let domain = signals.domain.as_str();
        let mut factors: Vec<RiskFactor> = [
            (
                "Industry volatility",
                signals.volatility,
                format!("Price and demand swings across the {domain} sector"),
            ),
            (
                "Regulatory changes",
                signals.regulatory_pressure,
                format!("Pending regulation in {domain} may delay approvals or force rework"),
            ),
            (
                "Competitive landscape",
                signals.competitive_pressure,
                format!("Competitors in {domain} may ship comparable offerings first"),
            ),
            (
                "Technology obsolescence",
                signals.technology_disruption,
                format!("Rapid technology change in {domain} may outdate the chosen stack"),
            ),
        ]
        .into_iter()
        .filter(|(_, value, _)| *value >= self.floor)
        .map(|(name, value, description)| {
            RiskFactor::new(
                name,
                round_to_tenth(value),
                round_to_tenth((value + headwind).min(10.0)),
            )
            .with_description(description)
        })
        .collect();
        if -signals.growth_outlook >= self.floor {
            let contraction = -signals.growth_outlook;
            factors.push(
                RiskFactor::new(
                    "Market demand shifts",
                    round_to_tenth(contraction),
                    round_to_tenth(contraction * 0.8),
                )
                .with_description(format!("Demand for {domain} offerings is contracting")),
            );
        }
        factors.sort_by(|a, b| b.severity().total_cmp(&a.severity()));
        tracing::debug!(domain, factors = factors.len(), "market signals analysed");
        Ok(MarketOutlook {
            domain: signals.domain.clone(),
            industry_volatility: SignalLevel::of(signals.volatility),
            regulatory_changes: SignalLevel::of(signals.regulatory_pressure),
            competitive_landscape: SignalLevel::of(signals.competitive_pressure),
            technology_disruption: SignalLevel::of(signals.technology_disruption),
            market_growth: GrowthOutlook::of(signals.growth_outlook),
            factors,
        })
    }
}
