//! Stop, target, leverage and position sizing.
//!
//! Stop distance is ATR-based with a volatility-tiered multiplier and a
//! percentage floor, plus a fixed wick buffer:
//!
//! | ATR % of price | multiplier | floor |
//! |----------------|------------|-------|
//! | > 4.0          | 2.0x       | 3.0%  |
//! | > 2.5          | 1.75x      | 2.0%  |
//! | otherwise      | 1.5x       | 1.5%  |
//!
//! Without an ATR the stop sits a flat 2% from entry.
//!
//! The take-profit distance starts at 2% of entry, grows with momentum,
//! volatility, trend strength and volume (each bonus capped), stops at 5%,
//! then is pushed out if it would miss the minimum reward:risk ratio.
//!
//! Position margin = risk amount / (stop fraction x leverage), never more
//! than the margin percentage of equity allows.

use crate::domain::indicator::Bias;
use crate::domain::indicator::trend::Structure;
use crate::domain::signal::Side;
use crate::domain::snapshot::IndicatorSnapshot;
use serde::Serialize;

pub const WICK_BUFFER_PCT: f64 = 0.3;
pub const FALLBACK_STOP_PCT: f64 = 2.0;
pub const BASE_TAKE_PROFIT_PCT: f64 = 2.0;
pub const MAX_TAKE_PROFIT_PCT: f64 = 5.0;
pub const DEFAULT_RAW_CONFIDENCE: f64 = 0.5;
pub const BASE_LEVERAGE: f64 = 3.0;
pub const BASE_MARGIN_PCT: f64 = 50.0;
pub const MIN_MARGIN_PCT: f64 = 25.0;
pub const MAX_MARGIN_PCT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StopPlan {
    pub stop_loss: f64,
    /// Absolute distance from entry, buffer included.
    pub distance: f64,
    pub atr_multiplier: Option<f64>,
    pub floor_pct: f64,
}

impl StopPlan {
    pub fn distance_pct(&self, entry: f64) -> f64 {
        if entry == 0.0 { 0.0 } else { self.distance / entry * 100.0 }
    }
}

/// (multiplier, floor %) for an ATR percentage.
pub fn stop_tier(atr_pct: f64) -> (f64, f64) {
    if atr_pct > 4.0 {
        (2.0, 3.0)
    } else if atr_pct > 2.5 {
        (1.75, 2.0)
    } else {
        (1.5, 1.5)
    }
}

pub fn atr_stop(side: Side, entry: f64, atr: Option<f64>) -> StopPlan {
    let buffer = entry * WICK_BUFFER_PCT / 100.0;
    let (base, atr_multiplier, floor_pct) = match atr.filter(|a| *a > 0.0 && entry > 0.0) {
        Some(atr) => {
            let (mult, floor_pct) = stop_tier(atr / entry * 100.0);
            ((atr * mult).max(entry * floor_pct / 100.0), Some(mult), floor_pct)
        }
        None => (entry * FALLBACK_STOP_PCT / 100.0, None, FALLBACK_STOP_PCT),
    };
    let distance = match atr_multiplier {
        Some(_) => base + buffer,
        None => base,
    };
    StopPlan {
        stop_loss: entry - side.sign() * distance,
        distance,
        atr_multiplier,
        floor_pct,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TakeProfitBonuses {
    pub momentum: f64,
    pub volatility: f64,
    pub trend_strength: f64,
    pub volume: f64,
}

impl TakeProfitBonuses {
    pub fn from_snapshot(side: Side, snap: &IndicatorSnapshot) -> Self {
        let momentum = match snap.macd {
            Some(m) if side.agrees(Bias::from_change(m.histogram)) => 0.5,
            _ => 0.0,
        };
        let volatility = snap.atr_pct.map_or(0.0, |a| (a * 0.25).min(1.0));
        let trend_strength = snap
            .adx
            .filter(|a| a.adx > 25.0)
            .map_or(0.0, |a| ((a.adx - 25.0) * 0.04).min(1.0));
        let volume = if snap.volume_ratio.is_some_and(|r| r >= 1.5) { 0.5 } else { 0.0 };
        Self {
            momentum,
            volatility,
            trend_strength,
            volume,
        }
    }

    pub fn total(&self) -> f64 {
        self.momentum + self.volatility + self.trend_strength + self.volume
    }
}

/// Minimum reward:risk for a proposer confidence; less confident
/// proposals must offer more reward.
pub fn min_reward_risk(raw_confidence: f64) -> f64 {
    if raw_confidence >= 0.75 {
        2.0
    } else if raw_confidence >= 0.6 {
        2.5
    } else {
        3.0
    }
}

pub fn take_profit(
    side: Side,
    entry: f64,
    stop_distance: f64,
    bonuses: &TakeProfitBonuses,
    raw_confidence: Option<f64>,
) -> f64 {
    let pct = (BASE_TAKE_PROFIT_PCT + bonuses.total()).min(MAX_TAKE_PROFIT_PCT);
    let min_rr = min_reward_risk(raw_confidence.unwrap_or(DEFAULT_RAW_CONFIDENCE));
    let distance = (entry * pct / 100.0).max(stop_distance * min_rr);
    entry + side.sign() * distance
}

/// Bounce target: the Bollinger middle band, but at least 1.5x the stop
/// distance away.
pub fn bounce_take_profit(side: Side, entry: f64, stop_distance: f64, middle_band: f64) -> f64 {
    let to_middle = side.sign() * (middle_band - entry);
    entry + side.sign() * to_middle.max(stop_distance * 1.5)
}

/// Percent of equity to risk for a scored confidence.
pub fn risk_budget_pct(confidence: f64, sizing_multiplier: f64, max_risk_per_trade: f64) -> f64 {
    let base = if confidence >= 0.8 {
        2.0
    } else if confidence >= 0.7 {
        1.5
    } else if confidence >= 0.6 {
        1.0
    } else {
        0.5
    };
    (base * sizing_multiplier).min(max_risk_per_trade)
}

fn structure_aligned(side: Side, snap: &IndicatorSnapshot) -> bool {
    snap.structure.as_ref().is_some_and(|s| {
        matches!(
            (side, s.structure),
            (Side::Long, Structure::Bullish) | (Side::Short, Structure::Bearish)
        )
    })
}

fn near_high_volume_node(snap: &IndicatorSnapshot) -> bool {
    snap.composite_profile
        .as_ref()
        .and_then(|vp| vp.nearest_hvn_distance_pct(snap.price))
        .is_some_and(|d| d <= 1.0)
}

pub fn leverage(side: Side, snap: &IndicatorSnapshot, confidence: f64, reward_risk: f64, max_leverage: f64) -> f64 {
    let mut lev = BASE_LEVERAGE;
    lev += match snap.atr_pct {
        Some(a) if a < 2.0 => 2.0,
        Some(a) if a < 3.0 => 1.0,
        Some(a) if a > 5.0 => -1.0,
        _ => 0.0,
    };
    lev += match snap.adx.map(|a| a.adx) {
        Some(a) if a > 40.0 => 2.0,
        Some(a) if a > 25.0 => 1.0,
        _ => 0.0,
    };
    lev += if confidence >= 0.75 {
        2.0
    } else if confidence >= 0.6 {
        1.0
    } else {
        0.0
    };
    if reward_risk >= 3.0 {
        lev += 1.0;
    }
    if structure_aligned(side, snap) {
        lev += 1.0;
    }
    if near_high_volume_node(snap) {
        lev += 1.0;
    }
    lev.clamp(1.0, max_leverage.max(1.0))
}

pub fn margin_pct(side: Side, snap: &IndicatorSnapshot, confidence: f64, reward_risk: f64) -> f64 {
    let mut pct = BASE_MARGIN_PCT;
    pct += if confidence >= 0.75 {
        20.0
    } else if confidence >= 0.6 {
        10.0
    } else {
        0.0
    };
    if reward_risk >= 2.5 {
        pct += 10.0;
    }
    if snap.adx.is_some_and(|a| a.adx > 25.0) {
        pct += 10.0;
    }
    if structure_aligned(side, snap) {
        pct += 5.0;
    }
    if snap.atr_pct.is_some_and(|a| a > 4.0) {
        pct -= 15.0;
    }
    pct.clamp(MIN_MARGIN_PCT, MAX_MARGIN_PCT)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSizing {
    /// Percent of equity at risk.
    pub risk_pct: f64,
    pub risk_amount: f64,
    pub leverage: f64,
    pub margin_pct: f64,
    /// Margin committed, in account currency.
    pub position_size: f64,
    pub notional: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SizingInput<'a> {
    pub side: Side,
    pub snapshot: &'a IndicatorSnapshot,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: f64,
    pub equity: f64,
    pub sizing_multiplier: f64,
    pub max_risk_per_trade: f64,
    pub max_leverage: f64,
}

pub fn size_position(input: &SizingInput<'_>) -> PositionSizing {
    let side = input.side;
    let stop_distance = side.sign() * (input.entry - input.stop_loss);
    let reward = side.sign() * (input.take_profit - input.entry);
    let reward_risk = if stop_distance > 0.0 { reward / stop_distance } else { 0.0 };

    let risk_pct = risk_budget_pct(input.confidence, input.sizing_multiplier, input.max_risk_per_trade);
    let risk_amount = input.equity * risk_pct / 100.0;
    let leverage = leverage(side, input.snapshot, input.confidence, reward_risk, input.max_leverage);
    let margin_pct = margin_pct(side, input.snapshot, input.confidence, reward_risk);

    let stop_fraction = if input.entry > 0.0 { stop_distance / input.entry } else { 0.0 };
    let position_size = if stop_fraction > 0.0 {
        (risk_amount / (stop_fraction * leverage)).min(input.equity * margin_pct / 100.0)
    } else {
        0.0
    };
    let notional = position_size * leverage;
    let quantity = if input.entry > 0.0 { notional / input.entry } else { 0.0 };

    PositionSizing {
        risk_pct,
        risk_amount,
        leverage,
        margin_pct,
        position_size,
        notional,
        quantity,
    }
}
