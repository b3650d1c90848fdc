//! Typed pipeline configuration.
//!
//! Built from a [`ConfigPort`](crate::ports::config_port::ConfigPort) by
//! [`build_pipeline_config`](crate::domain::config_validation::build_pipeline_config);
//! the threshold sets have no defaults and must be configured.

use crate::domain::error::SignalGateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    Autonomous,
    SignalOnly,
    ManualReview,
}

impl TradingMode {
    /// Lowest execution level this mode will accept.
    pub fn minimum_level(&self) -> ExecutionLevel {
        match self {
            TradingMode::Autonomous => ExecutionLevel::Medium,
            TradingMode::SignalOnly => ExecutionLevel::Low,
            TradingMode::ManualReview => ExecutionLevel::Marginal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Autonomous => "autonomous",
            TradingMode::SignalOnly => "signal_only",
            TradingMode::ManualReview => "manual_review",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = SignalGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "autonomous" => Ok(TradingMode::Autonomous),
            "signal_only" => Ok(TradingMode::SignalOnly),
            "manual_review" => Ok(TradingMode::ManualReview),
            other => Err(SignalGateError::ConfigInvalid {
                section: "trading".into(),
                key: "mode".into(),
                reason: format!("unknown trading mode '{other}'"),
            }),
        }
    }
}

/// Execution tier of a decision, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionLevel {
    /// Below the reject floor.
    Reject,
    /// Between the reject floor and the low threshold; manual review only.
    Marginal,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub reject: f64,
}

impl Thresholds {
    pub fn level(&self, value: f64) -> ExecutionLevel {
        if value >= self.high {
            ExecutionLevel::High
        } else if value >= self.medium {
            ExecutionLevel::Medium
        } else if value >= self.low {
            ExecutionLevel::Low
        } else if value >= self.reject {
            ExecutionLevel::Marginal
        } else {
            ExecutionLevel::Reject
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.high >= self.medium && self.medium >= self.low && self.low >= self.reject
    }
}

/// Risk budget multipliers by confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingMultipliers {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SizingMultipliers {
    fn default() -> Self {
        Self {
            high: 1.0,
            medium: 0.75,
            low: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Percent of equity.
    pub max_risk_per_trade: f64,
    pub max_open_positions: u32,
    /// Percent of equity lost today that halts new entries.
    pub daily_loss_limit: f64,
    pub consecutive_losses: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_risk_per_trade: 2.0,
            max_open_positions: 5,
            daily_loss_limit: 5.0,
            consecutive_losses: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageLimits {
    pub default_max: f64,
    pub per_asset: BTreeMap<String, f64>,
}

impl LeverageLimits {
    pub fn max_for(&self, asset: &str) -> f64 {
        self.per_asset
            .get(&asset.to_uppercase())
            .copied()
            .unwrap_or(self.default_max)
    }
}

impl Default for LeverageLimits {
    fn default() -> Self {
        Self {
            default_max: 10.0,
            per_asset: BTreeMap::new(),
        }
    }
}

pub const DEFAULT_ACCOUNT_EQUITY: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mode: TradingMode,
    /// Allow the pipeline to flip a heavily contradicted entry to the other side.
    pub allow_flip: bool,
    pub account_equity: f64,
    pub confidence: Thresholds,
    /// Expected value thresholds, in percent of entry price.
    pub expected_value: Thresholds,
    pub sizing: SizingMultipliers,
    pub safety: SafetyLimits,
    pub leverage: LeverageLimits,
}

impl PipelineConfig {
    /// Config with the given mode and thresholds and defaults elsewhere.
    pub fn new(mode: TradingMode, confidence: Thresholds, expected_value: Thresholds) -> Self {
        Self {
            mode,
            allow_flip: false,
            account_equity: DEFAULT_ACCOUNT_EQUITY,
            confidence,
            expected_value,
            sizing: SizingMultipliers::default(),
            safety: SafetyLimits::default(),
            leverage: LeverageLimits::default(),
        }
    }

    /// Sizing multiplier for a confidence value, tiered on the confidence thresholds.
    pub fn sizing_multiplier(&self, confidence: f64) -> f64 {
        match self.confidence.level(confidence) {
            ExecutionLevel::High => self.sizing.high,
            ExecutionLevel::Medium => self.sizing.medium,
            _ => self.sizing.low,
        }
    }
}
