//! Configuration loading and validation.
//!
//! Turns a [`ConfigPort`] into a [`PipelineConfig`]. Both threshold sets
//! are required; every other section falls back to its defaults. Any
//! failure here is fatal and stops the pipeline from being built.

use crate::domain::config::{
    DEFAULT_ACCOUNT_EQUITY, LeverageLimits, PipelineConfig, SafetyLimits, SizingMultipliers,
    Thresholds, TradingMode,
};
use crate::domain::error::SignalGateError;
use crate::ports::config_port::ConfigPort;

const THRESHOLD_KEYS: [&str; 4] = ["high", "medium", "low", "reject"];

pub fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, SignalGateError> {
    let mode = match config.get_string("trading", "mode") {
        Some(s) => s.parse::<TradingMode>()?,
        None => TradingMode::SignalOnly,
    };

    let pipeline = PipelineConfig {
        mode,
        allow_flip: config.get_bool("trading", "allow_flip", false),
        account_equity: optional_double(config, "trading", "account_equity", DEFAULT_ACCOUNT_EQUITY)?,
        confidence: read_thresholds(config, "confidence_thresholds")?,
        expected_value: read_thresholds(config, "ev_thresholds")?,
        sizing: read_sizing(config)?,
        safety: read_safety(config)?,
        leverage: read_leverage(config)?,
    };
    validate_pipeline_config(&pipeline)?;
    Ok(pipeline)
}

/// Check a config built in code or loaded from file.
pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), SignalGateError> {
    validate_account_equity(config.account_equity)?;
    validate_thresholds("confidence_thresholds", &config.confidence, Some((0.0, 1.0)))?;
    validate_thresholds("ev_thresholds", &config.expected_value, None)?;
    validate_sizing(&config.sizing)?;
    validate_safety(&config.safety)?;
    validate_leverage(&config.leverage)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalGateError {
    SignalGateError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_double(section: &str, key: &str, raw: &str) -> Result<f64, SignalGateError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(section, key, format!("'{raw}' is not a number")))
}

fn required_double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, SignalGateError> {
    match config.get_string(section, key) {
        Some(raw) => parse_double(section, key, &raw),
        None => Err(SignalGateError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignalGateError> {
    match config.get_string(section, key) {
        Some(raw) => parse_double(section, key, &raw),
        None => Ok(default),
    }
}

fn optional_count(config: &dyn ConfigPort, section: &str, key: &str, default: u32) -> Result<u32, SignalGateError> {
    match config.get_string(section, key) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a non-negative integer"))),
        None => Ok(default),
    }
}

fn read_thresholds(config: &dyn ConfigPort, section: &str) -> Result<Thresholds, SignalGateError> {
    let [high, medium, low, reject] = THRESHOLD_KEYS;
    Ok(Thresholds {
        high: required_double(config, section, high)?,
        medium: required_double(config, section, medium)?,
        low: required_double(config, section, low)?,
        reject: required_double(config, section, reject)?,
    })
}

fn read_sizing(config: &dyn ConfigPort) -> Result<SizingMultipliers, SignalGateError> {
    let defaults = SizingMultipliers::default();
    Ok(SizingMultipliers {
        high: optional_double(config, "position_sizing", "high_multiplier", defaults.high)?,
        medium: optional_double(config, "position_sizing", "medium_multiplier", defaults.medium)?,
        low: optional_double(config, "position_sizing", "low_multiplier", defaults.low)?,
    })
}

fn read_safety(config: &dyn ConfigPort) -> Result<SafetyLimits, SignalGateError> {
    let defaults = SafetyLimits::default();
    Ok(SafetyLimits {
        max_risk_per_trade: optional_double(config, "safety", "max_risk_per_trade", defaults.max_risk_per_trade)?,
        max_open_positions: optional_count(config, "safety", "max_open_positions", defaults.max_open_positions)?,
        daily_loss_limit: optional_double(config, "safety", "daily_loss_limit", defaults.daily_loss_limit)?,
        consecutive_losses: optional_count(config, "safety", "consecutive_losses", defaults.consecutive_losses)?,
    })
}

fn read_leverage(config: &dyn ConfigPort) -> Result<LeverageLimits, SignalGateError> {
    let mut limits = LeverageLimits {
        default_max: optional_double(config, "leverage", "default_max", LeverageLimits::default().default_max)?,
        ..LeverageLimits::default()
    };
    for key in config.section_keys("leverage") {
        if key == "default_max" {
            continue;
        }
        if let Some(raw) = config.get_string("leverage", &key) {
            let value = parse_double("leverage", &key, &raw)?;
            limits.per_asset.insert(key.to_uppercase(), value);
        }
    }
    Ok(limits)
}

fn validate_account_equity(equity: f64) -> Result<(), SignalGateError> {
    if equity <= 0.0 {
        return Err(invalid("trading", "account_equity", "account_equity must be positive"));
    }
    Ok(())
}

fn validate_thresholds(
    section: &str,
    thresholds: &Thresholds,
    range: Option<(f64, f64)>,
) -> Result<(), SignalGateError> {
    let values = [thresholds.high, thresholds.medium, thresholds.low, thresholds.reject];
    for (key, value) in THRESHOLD_KEYS.iter().zip(values) {
        if !value.is_finite() {
            return Err(invalid(section, key, "threshold must be a finite number"));
        }
        if let Some((lo, hi)) = range.filter(|(lo, hi)| value < *lo || value > *hi) {
            return Err(invalid(section, key, format!("threshold must be between {lo} and {hi}")));
        }
    }
    if !thresholds.is_ordered() {
        return Err(invalid(section, "high", "thresholds must satisfy high >= medium >= low >= reject"));
    }
    Ok(())
}

fn validate_sizing(sizing: &SizingMultipliers) -> Result<(), SignalGateError> {
    let entries = [
        ("high_multiplier", sizing.high),
        ("medium_multiplier", sizing.medium),
        ("low_multiplier", sizing.low),
    ];
    for (key, value) in entries {
        if value <= 0.0 || value > 1.0 {
            return Err(invalid("position_sizing", key, format!("{key} must be in (0, 1]")));
        }
    }
    Ok(())
}

fn validate_safety(safety: &SafetyLimits) -> Result<(), SignalGateError> {
    if safety.max_risk_per_trade <= 0.0 || safety.max_risk_per_trade > 100.0 {
        return Err(invalid("safety", "max_risk_per_trade", "max_risk_per_trade must be in (0, 100]"));
    }
    if safety.max_open_positions < 1 {
        return Err(invalid("safety", "max_open_positions", "max_open_positions must be at least 1"));
    }
    if safety.daily_loss_limit <= 0.0 {
        return Err(invalid("safety", "daily_loss_limit", "daily_loss_limit must be positive"));
    }
    if safety.consecutive_losses < 1 {
        return Err(invalid("safety", "consecutive_losses", "consecutive_losses must be at least 1"));
    }
    Ok(())
}

fn validate_leverage(leverage: &LeverageLimits) -> Result<(), SignalGateError> {
    if leverage.default_max < 1.0 {
        return Err(invalid("leverage", "default_max", "default_max must be at least 1"));
    }
    if let Some((asset, _)) = leverage.per_asset.iter().find(|(_, max)| **max < 1.0) {
        return Err(invalid("leverage", &asset.to_lowercase(), "leverage must be at least 1"));
    }
    Ok(())
}
