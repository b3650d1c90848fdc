//! Contradiction detector.
//!
//! Checks an entry side against the indicator snapshot, one rule per
//! indicator family. Every rule that finds the indicator leaning against
//! the side appends an explanation and adds its weight (2..=7) to the
//! score. Rules are written for a long and mirrored for a short. Each rule
//! contributes independently, so the score only grows as more indicators
//! oppose the side.
//!
//! Severity buckets: score < 4 low, < 7 medium, < 10 high, else critical.

use crate::domain::indicator::Bias;
use crate::domain::indicator::trend::Trend;
use crate::domain::signal::Side;
use crate::domain::snapshot::IndicatorSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at which a contradiction is considered extreme.
pub const EXTREME_SCORE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..4 => Severity::Low,
            4..7 => Severity::Medium,
            7..10 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContradictionReport {
    pub score: u32,
    pub items: Vec<String>,
    pub severity: Severity,
}

impl ContradictionReport {
    pub fn is_extreme(&self) -> bool {
        self.score >= EXTREME_SCORE
    }

    fn add(&mut self, weight: u32, item: String) {
        self.score += weight;
        self.items.push(item);
    }
}

fn side_word(side: Side) -> &'static str {
    match side {
        Side::Long => "long",
        Side::Short => "short",
    }
}

fn bollinger_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(bands) = snap.bollinger else { return };
    if bands.upper <= bands.lower {
        return;
    }
    let pb = bands.percent_b(snap.price);
    // Distance past the band on the side that argues against the entry.
    let against = match side {
        Side::Long => -pb,
        Side::Short => pb - 1.0,
    };
    if against > 0.0 {
        report.add(4, format!("price outside the Bollinger band against the {} (%B {pb:.2})", side_word(side)));
    } else if against > -0.2 {
        report.add(2, format!("price near the Bollinger band against the {} (%B {pb:.2})", side_word(side)));
    }
}

fn obv_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(slope) = snap.obv_slope else { return };
    if side.opposes(Bias::from_change(slope)) {
        report.add(3, format!("OBV slope {slope:.0} disagrees with the {}", side_word(side)));
    }
}

fn macd_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(pct) = snap.macd_histogram_pct() else { return };
    if !side.opposes(Bias::from_change(pct)) {
        return;
    }
    let weight = match pct.abs() {
        m if m >= 0.3 => 6,
        m if m >= 0.1 => 4,
        _ => 2,
    };
    report.add(weight, format!("MACD histogram {pct:+.3}% of price against the {}", side_word(side)));
}

fn aroon_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(a) = snap.aroon else { return };
    let (own, opposing) = match side {
        Side::Long => (a.up, a.down),
        Side::Short => (a.down, a.up),
    };
    if opposing >= 70.0 && own <= 30.0 {
        report.add(5, format!("Aroon strongly against the {} (up {:.0}, down {:.0})", side_word(side), a.up, a.down));
    } else if opposing > own {
        report.add(2, format!("Aroon leans against the {} (up {:.0}, down {:.0})", side_word(side), a.up, a.down));
    }
}

fn trend_opposes(side: Side, trend: Trend) -> bool {
    matches!(
        (side, trend),
        (Side::Long, Trend::Downtrend) | (Side::Short, Trend::Uptrend)
    )
}

fn trend_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let alignment = &snap.alignment;
    if snap.daily_available && trend_opposes(side, alignment.daily_trend) {
        report.add(7, format!("daily trend opposes the {}", side_word(side)));
    }
    if alignment.h4_trend.is_some_and(|t| trend_opposes(side, t)) {
        report.add(3, format!("4h trend opposes the {}", side_word(side)));
    }
}

fn ema_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let s = side.sign();
    if let (Some(e20), Some(e50), Some(e200)) = (snap.ema_20, snap.ema_50, snap.ema_200) {
        // Fully stacked against the side: price < 20 < 50 < 200 for a long.
        if s * (e20 - snap.price) > 0.0 && s * (e50 - e20) > 0.0 && s * (e200 - e50) > 0.0 {
            report.add(5, format!("EMA ladder fully stacked against the {}", side_word(side)));
            return;
        }
    }
    if snap.ema_20.is_some_and(|e20| s * (e20 - snap.price) > 0.0) {
        report.add(2, format!("price on the wrong side of EMA(20) for the {}", side_word(side)));
    }
}

fn divergence_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    if snap.rsi_divergence.is_some_and(|d| side.opposes(d.bias)) {
        report.add(4, format!("RSI divergence against the {}", side_word(side)));
    }
    if snap.macd_divergence.is_some_and(|d| side.opposes(d.bias)) {
        report.add(3, format!("MACD divergence against the {}", side_word(side)));
    }
}

fn rsi_extreme_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(rsi) = snap.rsi else { return };
    let exhausted = match side {
        Side::Long => rsi >= 75.0,
        Side::Short => rsi <= 25.0,
    };
    if exhausted {
        report.add(3, format!("RSI {rsi:.1} already stretched in the {} direction", side_word(side)));
    }
}

fn psar_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(p) = snap.parabolic_sar else { return };
    let psar_side = if p.uptrend { Side::Long } else { Side::Short };
    if psar_side != side {
        report.add(3, format!("Parabolic SAR flipped against the {}", side_word(side)));
    }
}

fn cci_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(cci) = snap.cci else { return };
    let against = -side.sign() * cci;
    if against > 200.0 {
        report.add(4, format!("CCI {cci:.0} at an extreme against the {}", side_word(side)));
    } else if against > 100.0 {
        report.add(2, format!("CCI {cci:.0} against the {}", side_word(side)));
    }
}

fn price_change_rule(side: Side, snap: &IndicatorSnapshot, report: &mut ContradictionReport) {
    let Some(change) = snap.price_change_24h_pct else { return };
    let against = -side.sign() * change;
    if against >= 5.0 {
        report.add(4, format!("24h move {change:+.2}% against the {}", side_word(side)));
    } else if against >= 2.5 {
        report.add(2, format!("24h move {change:+.2}% against the {}", side_word(side)));
    }
}

/// Score how strongly the snapshot argues against entering on `side`.
pub fn detect_contradictions(side: Side, snap: &IndicatorSnapshot) -> ContradictionReport {
    let mut report = ContradictionReport {
        score: 0,
        items: Vec::new(),
        severity: Severity::Low,
    };

    if !snap.has_directional_indicators() {
        report.add(2, "no directional indicators available".to_string());
    }
    bollinger_rule(side, snap, &mut report);
    obv_rule(side, snap, &mut report);
    macd_rule(side, snap, &mut report);
    aroon_rule(side, snap, &mut report);
    trend_rule(side, snap, &mut report);
    ema_rule(side, snap, &mut report);
    divergence_rule(side, snap, &mut report);
    rsi_extreme_rule(side, snap, &mut report);
    psar_rule(side, snap, &mut report);
    cci_rule(side, snap, &mut report);
    price_change_rule(side, snap, &mut report);

    report.severity = Severity::from_score(report.score);
    report
}
