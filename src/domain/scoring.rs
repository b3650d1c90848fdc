//! Confidence scorer.
//!
//! Seven fixed-weight categories, 130 points in total:
//!
//! | category               | max |
//! |------------------------|-----|
//! | trend alignment        |  25 |
//! | risk/reward            |  20 |
//! | technical consensus    |  30 |
//! | market context         |  10 |
//! | support/resistance     |   5 |
//! | divergence & momentum  |  10 |
//! | external confirmation  |  30 |
//!
//! Each category is a sum of sub-items. A sub-item whose input is
//! unavailable is skipped together with its maximum, so missing data
//! neither earns nor costs points. Raw confidence is earned / available.
//!
//! Trend alignment is a gatekeeper: below the mode's floor the signal is
//! auto-rejected with confidence 0 and the other categories are not scored.
//!
//! Penalties are summed and applied as one multiplier clamped to [0.2, 1.0].

use crate::domain::config::TradingMode;
use crate::domain::external::{ExternalData, MarketPhase};
use crate::domain::indicator::Bias;
use crate::domain::indicator::regime::MarketRegime;
use crate::domain::indicator::trend::Trend;
use crate::domain::indicator::volume_profile::ProfilePosition;
use crate::domain::indicator_helpers::pct_distance;
use crate::domain::signal::Side;
use crate::domain::snapshot::IndicatorSnapshot;
use serde::Serialize;
use std::fmt;

pub const MIN_PENALTY_MULTIPLIER: f64 = 0.2;
pub const CONTRADICTION_PENALTY_PER_POINT: f64 = 0.03;
pub const MAX_CONTRADICTION_PENALTY: f64 = 0.6;
pub const LOW_VOLATILITY_ATR_PCT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TrendAlignment,
    RiskReward,
    TechnicalConsensus,
    MarketContext,
    SupportResistance,
    DivergenceMomentum,
    ExternalConfirmation,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::TrendAlignment,
        Category::RiskReward,
        Category::TechnicalConsensus,
        Category::MarketContext,
        Category::SupportResistance,
        Category::DivergenceMomentum,
        Category::ExternalConfirmation,
    ];

    pub fn max_points(&self) -> f64 {
        match self {
            Category::TrendAlignment => 25.0,
            Category::RiskReward => 20.0,
            Category::TechnicalConsensus => 30.0,
            Category::MarketContext => 10.0,
            Category::SupportResistance => 5.0,
            Category::DivergenceMomentum => 10.0,
            Category::ExternalConfirmation => 30.0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::TrendAlignment => "trend alignment",
            Category::RiskReward => "risk/reward",
            Category::TechnicalConsensus => "technical consensus",
            Category::MarketContext => "market context",
            Category::SupportResistance => "support/resistance",
            Category::DivergenceMomentum => "divergence & momentum",
            Category::ExternalConfirmation => "external confirmation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub points: f64,
    /// Sum of the maxima of the sub-items that were available.
    pub max: f64,
    pub notes: Vec<String>,
}

impl CategoryScore {
    fn new(category: Category) -> Self {
        Self {
            category,
            points: 0.0,
            max: 0.0,
            notes: Vec::new(),
        }
    }

    /// Record a sub-item worth up to `max`. `None` means its input is
    /// unavailable and the item is skipped.
    fn item(&mut self, max: f64, points: Option<f64>, note: impl FnOnce(f64) -> String) {
        let Some(points) = points else { return };
        let points = points.clamp(0.0, max);
        self.points += points;
        self.max += max;
        self.notes.push(note(points));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Penalties {
    pub contradiction: f64,
    pub momentum: f64,
    pub low_volatility: f64,
    /// 1 - sum of the above, clamped to [0.2, 1.0].
    pub multiplier: f64,
}

impl Penalties {
    pub fn total(&self) -> f64 {
        self.contradiction + self.momentum + self.low_volatility
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub categories: Vec<CategoryScore>,
    pub total_score: f64,
    pub max_score: f64,
    /// total / max before penalties.
    pub raw_confidence: f64,
    pub penalties: Penalties,
    pub confidence: f64,
    pub auto_rejected: bool,
    pub rejection_reason: Option<String>,
}

impl ConfidenceBreakdown {
    pub fn category(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Scale confidence by `factor`, keeping it in [0, 1].
    pub fn scale_confidence(&mut self, factor: f64) {
        self.confidence = (self.confidence * factor).clamp(0.0, 1.0);
    }
}

/// Everything the scorer reads for one entry.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub side: Side,
    pub snapshot: &'a IndicatorSnapshot,
    pub external: &'a ExternalData,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub contradiction_score: u32,
    pub mode: TradingMode,
}

/// Trend-alignment points a mode requires out of the full 25.
pub fn trend_floor(mode: TradingMode) -> f64 {
    match mode {
        TradingMode::Autonomous => 12.0,
        TradingMode::SignalOnly => 10.0,
        TradingMode::ManualReview => 6.0,
    }
}

fn trend_points(side: Side, trend: Trend, weight: f64) -> f64 {
    match (side, trend) {
        (_, Trend::Neutral) => weight / 2.0,
        (Side::Long, Trend::Uptrend) | (Side::Short, Trend::Downtrend) => weight,
        _ => 0.0,
    }
}

fn trend_name(trend: Trend) -> &'static str {
    match trend {
        Trend::Uptrend => "uptrend",
        Trend::Downtrend => "downtrend",
        Trend::Neutral => "neutral",
    }
}

fn score_trend(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::TrendAlignment);
    let snap = input.snapshot;
    for (label, trend, weight) in snap.alignment.weighted_trends(snap.daily_available) {
        cat.item(weight, Some(trend_points(input.side, trend, weight)), |p| {
            format!("{label} {}: {p:.1}/{weight}", trend_name(trend))
        });
    }
    cat
}

pub fn risk_reward_ratio(side: Side, entry: f64, stop_loss: f64, take_profit: f64) -> f64 {
    let risk = side.sign() * (entry - stop_loss);
    let reward = side.sign() * (take_profit - entry);
    if risk <= 0.0 { 0.0 } else { (reward / risk).max(0.0) }
}

fn score_risk_reward(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::RiskReward);
    let rr = risk_reward_ratio(input.side, input.entry, input.stop_loss, input.take_profit);
    let rr_points = match rr {
        r if r >= 3.0 => 15.0,
        r if r >= 2.5 => 12.0,
        r if r >= 2.0 => 10.0,
        r if r >= 1.5 => 7.0,
        r if r >= 1.0 => 3.0,
        _ => 0.0,
    };
    cat.item(15.0, Some(rr_points), |p| format!("R:R {rr:.2}: {p}/15"));

    let stop_pct = pct_distance(input.entry, input.stop_loss);
    let tight_points = match stop_pct {
        s if s <= 1.5 => 5.0,
        s if s <= 2.0 => 3.0,
        s if s <= 3.0 => 1.0,
        _ => 0.0,
    };
    cat.item(5.0, Some(tight_points), |p| format!("stop {stop_pct:.2}% away: {p}/5"));
    cat
}

/// 1 when `value` sits on the side's favourable side of `reference`.
fn favourable(side: Side, value: f64, reference: f64) -> bool {
    side.sign() * (value - reference) > 0.0
}

fn oscillator_points(side: Side, value: f64, low: f64, high: f64) -> f64 {
    let (good, bad) = match side {
        Side::Long => (value <= low, value >= high),
        Side::Short => (value >= high, value <= low),
    };
    if good {
        2.0
    } else if bad {
        0.0
    } else {
        1.0
    }
}

fn score_technical(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::TechnicalConsensus);
    let snap = input.snapshot;
    let side = input.side;
    let price = snap.price;

    cat.item(3.0, snap.ema_20.map(|e| if favourable(side, price, e) { 3.0 } else { 0.0 }), |p| {
        format!("price vs EMA(20): {p}/3")
    });
    let ema_pair = |fast: Option<f64>, slow: Option<f64>, pts: f64| {
        fast.zip(slow).map(|(f, s)| if favourable(side, f, s) { pts } else { 0.0 })
    };
    cat.item(3.0, ema_pair(snap.ema_20, snap.ema_50, 3.0), |p| format!("EMA(20) vs EMA(50): {p}/3"));
    cat.item(2.0, ema_pair(snap.ema_50, snap.ema_200, 2.0), |p| format!("EMA(50) vs EMA(200): {p}/2"));

    cat.item(5.0, snap.vwap.map(|v| if favourable(side, price, v) { 5.0 } else { 0.0 }), |p| {
        format!("VWAP side: {p}/5")
    });

    let boll = snap.bollinger.map(|b| {
        let pb = b.percent_b(price);
        // Position measured from the band opposite the side: 1.0 is the side's own band.
        let p = match side {
            Side::Long => pb,
            Side::Short => 1.0 - pb,
        };
        if p > 1.0 {
            2.0
        } else if p >= 0.5 {
            5.0
        } else if p >= 0.2 {
            2.0
        } else {
            0.0
        }
    });
    cat.item(5.0, boll, |p| format!("Bollinger position: {p}/5"));

    cat.item(
        4.0,
        snap.parabolic_sar.map(|s| if s.uptrend == (side == Side::Long) { 4.0 } else { 0.0 }),
        |p| format!("Parabolic SAR side: {p}/4"),
    );
    cat.item(
        4.0,
        snap.obv_slope.map(|s| if side.agrees(Bias::from_change(s)) { 4.0 } else { 0.0 }),
        |p| format!("OBV slope: {p}/4"),
    );

    let stoch = snap.stochastic.map(|s| oscillator_points(side, s.k, 20.0, 80.0));
    let wr = snap.williams_r.map(|w| oscillator_points(side, w, -80.0, -20.0));
    cat.item(2.0, stoch, |p| format!("stochastic: {p}/2"));
    cat.item(2.0, wr, |p| format!("Williams %R: {p}/2"));
    cat
}

fn score_market_context(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::MarketContext);
    let snap = input.snapshot;
    let regime = snap.regime.map(|r| match r.regime {
        MarketRegime::Trending => 5.0,
        MarketRegime::Neutral => 3.0,
        MarketRegime::Choppy => 1.0,
    });
    cat.item(5.0, regime, |p| format!("regime: {p}/5"));

    let vol = snap.atr_pct.map(|a| {
        if (1.5..=4.0).contains(&a) {
            5.0
        } else if a > 4.0 && a <= 6.0 {
            3.0
        } else {
            1.0
        }
    });
    cat.item(5.0, vol, |p| format!("ATR% {:.2}: {p}/5", snap.atr_pct.unwrap_or(0.0)));
    cat
}

fn score_support_resistance(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::SupportResistance);
    let snap = input.snapshot;
    let level = snap.support_resistance.as_ref().and_then(|sr| match input.side {
        Side::Long => sr.nearest_support(snap.price),
        Side::Short => sr.nearest_resistance(snap.price),
    });
    let points = level.map(|l| match pct_distance(snap.price, l) {
        d if d <= 1.0 => 5.0,
        d if d <= 2.0 => 3.0,
        d if d <= 3.0 => 1.0,
        _ => 0.0,
    });
    cat.item(5.0, points, |p| format!("nearest level {}: {p}/5", level.map_or("n/a".into(), |l| format!("{l:.4}"))));
    cat
}

fn score_divergence_momentum(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::DivergenceMomentum);
    let snap = input.snapshot;
    let side = input.side;

    let macd = snap.macd.map(|m| {
        let hist = m.histogram;
        if snap.macd_divergence.is_some_and(|d| side.agrees(d.bias)) {
            5.0
        } else if side.agrees(Bias::from_change(hist)) {
            let rising = snap
                .prev_macd_histogram
                .is_some_and(|prev| favourable(side, hist, prev));
            if rising { 5.0 } else { 3.0 }
        } else {
            0.0
        }
    });
    cat.item(5.0, macd, |p| format!("MACD momentum: {p}/5"));

    let rsi = snap.rsi.map(|r| {
        if snap.rsi_divergence.is_some_and(|d| side.agrees(d.bias)) {
            return 5.0;
        }
        let (extreme, ok) = match side {
            Side::Long => (r <= 30.0, r < 70.0),
            Side::Short => (r >= 70.0, r > 30.0),
        };
        if extreme {
            5.0
        } else if ok {
            2.0
        } else {
            0.0
        }
    });
    cat.item(5.0, rsi, |p| format!("RSI zone: {p}/5"));
    cat
}

fn score_external(input: &ScoringInput<'_>) -> CategoryScore {
    let mut cat = CategoryScore::new(Category::ExternalConfirmation);
    let snap = input.snapshot;
    let ext = input.external;
    let side = input.side;
    let s = side.sign();

    // Positive funding means longs pay shorts; paying to hold the side is a headwind.
    let funding = ext.funding_rate.map(|f| {
        let tailwind = -s * f;
        if tailwind > 0.0 {
            4.0
        } else if tailwind >= -0.0001 {
            2.0
        } else {
            0.0
        }
    });
    cat.item(4.0, funding, |p| format!("funding rate: {p}/4"));

    let oi = ext.open_interest_trend.map(|oi| {
        let price_with_side = snap.price_change_24h_pct.is_some_and(|c| s * c > 0.0);
        match (oi > 0.0, price_with_side) {
            (true, true) => 3.0,
            (true, false) => 1.0,
            _ => 0.0,
        }
    });
    cat.item(3.0, oi, |p| format!("open interest: {p}/3"));

    let book = ext.order_book.map(|b| {
        let imbalance = s * b.imbalance;
        let base: f64 = if imbalance >= 0.2 {
            3.0
        } else if imbalance > 0.0 {
            2.0
        } else {
            0.0
        };
        let (own_wall, other_wall) = match side {
            Side::Long => (b.bid_wall, b.ask_wall),
            Side::Short => (b.ask_wall, b.bid_wall),
        };
        let wall = if own_wall.is_some() && other_wall.is_none() { 1.0 } else { 0.0 };
        base + wall
    });
    cat.item(4.0, book, |p| format!("order book: {p}/4"));

    let profile = snap.composite_profile.as_ref().map(|vp| {
        let position = match (vp.position(snap.price), side) {
            (ProfilePosition::BelowValueArea, Side::Long) | (ProfilePosition::AboveValueArea, Side::Short) => 3.0,
            (ProfilePosition::InValueArea, _) => 2.0,
            _ => 1.0,
        };
        let hvn = if vp.nearest_hvn_distance_pct(snap.price).is_some_and(|d| d <= 1.0) {
            2.0
        } else {
            0.0
        };
        position + hvn
    });
    cat.item(5.0, profile, |p| format!("volume profile: {p}/5"));

    let phase = ext.market_phase.map(|phase| match (phase, side) {
        (MarketPhase::Accumulation, Side::Long) | (MarketPhase::Distribution, Side::Short) => 3.0,
        (MarketPhase::Neutral, _) => 1.0,
        _ => 0.0,
    });
    cat.item(3.0, phase, |p| format!("market phase: {p}/3"));

    let coc = snap.change_of_character.as_ref().map(|c| match c.reversal {
        Some(bias) if side.agrees(bias) && c.strength >= 50.0 => 4.0,
        Some(bias) if side.agrees(bias) => 2.0,
        Some(_) => 0.0,
        None => 1.0,
    });
    cat.item(4.0, coc, |p| format!("change of character: {p}/4"));

    let cvd = snap.cvd.map(|c| {
        let trend = if side.agrees(c.trend) {
            2.0
        } else if c.trend == Bias::Neutral {
            1.0
        } else {
            0.0
        };
        let divergence = if c.divergence.is_some_and(|d| side.agrees(d)) { 1.0 } else { 0.0 };
        trend + divergence
    });
    cat.item(3.0, cvd, |p| format!("CVD: {p}/3"));

    // Coins leaving exchanges is read as accumulation.
    let flow = ext.exchange_flow.map(|f| {
        let with_side = -s * f.net_flow;
        if with_side > 0.0 {
            2.0
        } else if with_side == 0.0 {
            1.0
        } else {
            0.0
        }
    });
    cat.item(2.0, flow, |p| format!("exchange flow: {p}/2"));

    cat.item(1.0, snap.volume_ratio.map(|r| if r >= 1.0 { 1.0 } else { 0.0 }), |p| {
        format!("volume trend: {p}/1")
    });
    cat.item(1.0, ext.whale_activity_score.map(|w| if s * w >= 0.3 { 1.0 } else { 0.0 }), |p| {
        format!("whale activity: {p}/1")
    });
    cat
}

fn penalties(input: &ScoringInput<'_>) -> Penalties {
    let snap = input.snapshot;
    let contradiction =
        (input.contradiction_score as f64 * CONTRADICTION_PENALTY_PER_POINT).min(MAX_CONTRADICTION_PENALTY);
    let momentum = snap
        .macd_histogram_pct()
        .filter(|pct| input.side.opposes(Bias::from_change(*pct)))
        .map_or(0.0, |pct| match pct.abs() {
            m if m >= 0.3 => 0.20,
            m if m >= 0.1 => 0.15,
            _ => 0.10,
        });
    let low_volatility = if snap.atr_pct.is_some_and(|a| a < LOW_VOLATILITY_ATR_PCT) {
        0.10
    } else {
        0.0
    };
    let sum = contradiction + momentum + low_volatility;
    Penalties {
        contradiction,
        momentum,
        low_volatility,
        multiplier: (1.0 - sum).clamp(MIN_PENALTY_MULTIPLIER, 1.0),
    }
}

/// Score one entry. Pure; the pipeline calls it again after a flip.
pub fn score_signal(input: &ScoringInput<'_>) -> ConfidenceBreakdown {
    let trend = score_trend(input);

    if trend.max > 0.0 {
        let floor = trend_floor(input.mode) * trend.max / Category::TrendAlignment.max_points();
        if trend.points < floor {
            let reason = format!(
                "trend alignment {:.1}/{:.1} below the {} floor {:.1}",
                trend.points, trend.max, input.mode, floor
            );
            return ConfidenceBreakdown {
                total_score: trend.points,
                max_score: trend.max,
                categories: vec![trend],
                raw_confidence: 0.0,
                penalties: Penalties {
                    multiplier: 1.0,
                    ..Penalties::default()
                },
                confidence: 0.0,
                auto_rejected: true,
                rejection_reason: Some(reason),
            };
        }
    }

    let categories = vec![
        trend,
        score_risk_reward(input),
        score_technical(input),
        score_market_context(input),
        score_support_resistance(input),
        score_divergence_momentum(input),
        score_external(input),
    ];
    let total_score: f64 = categories.iter().map(|c| c.points).sum();
    let max_score: f64 = categories.iter().map(|c| c.max).sum();
    let raw_confidence = if max_score > 0.0 {
        (total_score / max_score).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let penalties = penalties(input);

    ConfidenceBreakdown {
        categories,
        total_score,
        max_score,
        raw_confidence,
        penalties,
        confidence: (raw_confidence * penalties.multiplier).clamp(0.0, 1.0),
        auto_rejected: false,
        rejection_reason: None,
    }
}
