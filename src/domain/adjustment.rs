//! Contradiction handling and the correction audit trail.
//!
//! [`decide_adjustment`] maps a pair of contradiction reports (the proposed
//! side and its opposite) to a single [`AdjustmentDecision`]. Flipping is
//! opt-in; by default a contradicted entry is flagged and penalised, and an
//! extreme one is rejected unless exempt.
//!
//! Every field the pipeline rewrites is recorded as an [`Adjustment`].

use crate::domain::contradiction::{ContradictionReport, EXTREME_SCORE, Severity};
use serde::Serialize;

/// Score from which a contradiction is flagged on the decision.
pub const FLAG_SCORE: u32 = 7;
/// The opposite side must score below this for a flip to be taken.
pub const FLIP_MAX_OPPOSITE_SCORE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdjustmentDecision {
    Keep,
    Flip { reason: String },
    Reject { reason: String },
    FlagContradiction { severity: Severity, reason: String },
}

impl AdjustmentDecision {
    pub fn is_reject(&self) -> bool {
        matches!(self, AdjustmentDecision::Reject { .. })
    }
}

/// Decide what to do with a contradicted entry.
///
/// `exempt` marks a contrarian play (an active bounce on the proposed side)
/// that may be neither rejected nor flipped for contradictions alone.
pub fn decide_adjustment(
    report: &ContradictionReport,
    opposite: &ContradictionReport,
    allow_flip: bool,
    exempt: bool,
) -> AdjustmentDecision {
    if report.score < FLAG_SCORE {
        return AdjustmentDecision::Keep;
    }
    if report.score >= EXTREME_SCORE {
        if allow_flip && !exempt && opposite.score < FLIP_MAX_OPPOSITE_SCORE {
            return AdjustmentDecision::Flip {
                reason: format!(
                    "contradiction score {} against proposed side, {} against opposite",
                    report.score, opposite.score
                ),
            };
        }
        if !exempt {
            return AdjustmentDecision::Reject {
                reason: format!("extreme contradiction score {}", report.score),
            };
        }
    }
    AdjustmentDecision::FlagContradiction {
        severity: report.severity,
        reason: format!(
            "{} contradiction(s), score {}: {}",
            report.items.len(),
            report.score,
            report.items.join("; ")
        ),
    }
}

/// One field rewritten during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub field: &'static str,
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub rule: &'static str,
    pub note: String,
}

impl Adjustment {
    pub fn new(
        field: &'static str,
        from: Option<f64>,
        to: Option<f64>,
        rule: &'static str,
        note: impl Into<String>,
    ) -> Self {
        Self {
            field,
            from,
            to,
            rule,
            note: note.into(),
        }
    }
}
