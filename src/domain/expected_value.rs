//! Expected value and the final execution gate.
//!
//! EV = p * (R * risk) - (1 - p) * risk, with risk in percent of entry.
//!
//! The gate checks, in order: extreme contradiction, trend auto-rejection,
//! account safety limits, the confidence and EV reject floors, then the mode's minimum execution
//! level. The execution level is the lower of the confidence and EV tiers.

use crate::domain::config::{ExecutionLevel, PipelineConfig};
use serde::Serialize;

pub fn expected_value(confidence: f64, reward_risk: f64, risk: f64) -> f64 {
    confidence * (reward_risk * risk) - (1.0 - confidence) * risk
}

/// Inputs the gate reads, already computed by earlier stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateInput<'a> {
    pub confidence: f64,
    /// Percent of entry.
    pub expected_value: f64,
    /// Reason from an extreme contradiction that was not exempted.
    pub contradiction_reject: Option<&'a str>,
    /// Reason from the trend-alignment gatekeeper.
    pub auto_reject: Option<&'a str>,
    /// Reason from an account safety limit.
    pub safety_reject: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    pub execution_level: ExecutionLevel,
    pub accepted: bool,
    pub reason: String,
}

impl GateVerdict {
    fn reject(reason: String) -> Self {
        Self {
            execution_level: ExecutionLevel::Reject,
            accepted: false,
            reason,
        }
    }
}

pub fn apply_gate(config: &PipelineConfig, input: &GateInput<'_>) -> GateVerdict {
    if let Some(reason) = input.contradiction_reject {
        return GateVerdict::reject(format!("rejected: {reason}"));
    }
    if let Some(reason) = input.auto_reject {
        return GateVerdict::reject(format!("auto-rejected: {reason}"));
    }
    if let Some(reason) = input.safety_reject {
        return GateVerdict::reject(format!("safety limit: {reason}"));
    }
    if input.confidence < config.confidence.reject {
        return GateVerdict::reject(format!(
            "rejected: confidence {:.3} below floor {:.3}",
            input.confidence, config.confidence.reject
        ));
    }
    if input.expected_value < config.expected_value.reject {
        return GateVerdict::reject(format!(
            "rejected: expected value {:.3}% below floor {:.3}%",
            input.expected_value, config.expected_value.reject
        ));
    }

    let conf_level = config.confidence.level(input.confidence);
    let ev_level = config.expected_value.level(input.expected_value);
    let level = conf_level.min(ev_level);
    let minimum = config.mode.minimum_level();
    if level < minimum {
        return GateVerdict {
            execution_level: level,
            accepted: false,
            reason: format!(
                "rejected: {level:?} level (confidence {conf_level:?}, EV {ev_level:?}) below {minimum:?} required in {} mode",
                config.mode
            )
            .to_lowercase(),
        };
    }

    GateVerdict {
        execution_level: level,
        accepted: true,
        reason: format!(
            "accepted at {level:?} level: confidence {:.3}, EV {:.3}%",
            input.confidence, input.expected_value
        )
        .to_lowercase(),
    }
}
