//! Bollinger bounce / reversal detector.
//!
//! A bounce triggers on the bar where price closes back inside a band
//! after closing outside it on the previous bar, provided at least two of
//! five confirmations hold:
//!
//! - RSI at an extreme (<= 30 for a long, >= 70 for a short)
//! - stochastic %K on the bounce side of %D
//! - volume above its 20-bar average
//! - ATR above 1.5% of price
//! - candle body larger than half an ATR
//!
//! Strength is 0.2 per confirmation. The most recent trigger within the
//! last 30 bars is then followed forward to the current bar:
//!
//! - persistence: a 0.5% favourable move within 3 bars, else confidence x0.5
//! - reclaim: a long must close above EMA(20) or the 4h EMA(8), a short
//!   below EMA(20), else confidence x0.85
//! - re-entry: a reclaim within 6 bars of a persistence failure boosts
//!   confidence x1.10 (x1.15 at strength >= 0.6)
//! - decay: 2% per bar once the bounce is older than 12/6/1 bars
//!   (1h/4h/1d), capped at 50%
//! - trim: after a 3% favourable move, a close back across EMA(8)
//! - trail: the bar EMA(8) is crossed against the bounce, the target
//!   moves to the best close since the trigger

use crate::domain::indicator::bollinger::{self, BollingerPoint, bollinger};
use crate::domain::indicator::ema;
use crate::domain::indicator::rsi::{self, rsi};
use crate::domain::indicator::stochastic::{self, StochasticPoint, stochastic};
use crate::domain::indicator::atr::{self, atr};
use crate::domain::ohlcv::{Candle, Interval, closes};
use crate::domain::signal::Side;
use serde::Serialize;

pub const LOOKBACK: usize = 30;
pub const MIN_CONFIRMATIONS: usize = 2;
pub const STRENGTH_PER_CONFIRMATION: f64 = 0.2;
pub const PERSISTENCE_BARS: usize = 3;
pub const PERSISTENCE_MOVE_PCT: f64 = 0.5;
pub const PERSISTENCE_FAILURE_FACTOR: f64 = 0.5;
pub const RECLAIM_FAILURE_FACTOR: f64 = 0.85;
pub const REENTRY_WINDOW: usize = 6;
pub const DECAY_PER_BAR: f64 = 0.02;
pub const MAX_DECAY: f64 = 0.5;
pub const TRIM_MOVE_PCT: f64 = 3.0;
const VOLUME_AVERAGE_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    RsiExtreme,
    StochasticCross,
    VolumeSpike,
    Volatility,
    StrongBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    Pending,
    Passed,
    Failed,
}

/// Indicator values at one bar and the bar before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarInputs {
    pub prev_close: f64,
    pub close: f64,
    pub prev_bands: BollingerPoint,
    pub bands: BollingerPoint,
    pub body: f64,
    pub volume: f64,
    pub avg_volume: Option<f64>,
    pub rsi: Option<f64>,
    pub stochastic: Option<StochasticPoint>,
    pub atr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BounceTrigger {
    pub side: Side,
    pub confirmations: Vec<Confirmation>,
    pub strength: f64,
}

/// Check one bar for a band re-entry with enough confirmations.
pub fn check_trigger(bar: &BarInputs) -> Option<BounceTrigger> {
    let side = if bar.prev_close < bar.prev_bands.lower && bar.close >= bar.bands.lower {
        Side::Long
    } else if bar.prev_close > bar.prev_bands.upper && bar.close <= bar.bands.upper {
        Side::Short
    } else {
        return None;
    };

    let mut confirmations = Vec::new();
    let rsi_extreme = bar.rsi.is_some_and(|r| match side {
        Side::Long => r <= 30.0,
        Side::Short => r >= 70.0,
    });
    if rsi_extreme {
        confirmations.push(Confirmation::RsiExtreme);
    }
    if bar.stochastic.is_some_and(|s| side.sign() * (s.k - s.d) > 0.0) {
        confirmations.push(Confirmation::StochasticCross);
    }
    if bar.avg_volume.is_some_and(|avg| bar.volume > avg) {
        confirmations.push(Confirmation::VolumeSpike);
    }
    if bar.atr.is_some_and(|a| bar.close > 0.0 && a / bar.close * 100.0 > 1.5) {
        confirmations.push(Confirmation::Volatility);
    }
    if bar.atr.is_some_and(|a| bar.body > 0.5 * a) {
        confirmations.push(Confirmation::StrongBody);
    }

    if confirmations.len() < MIN_CONFIRMATIONS {
        return None;
    }
    let strength = (confirmations.len() as f64 * STRENGTH_PER_CONFIRMATION).min(1.0);
    Some(BounceTrigger {
        side,
        confirmations,
        strength,
    })
}

/// Bars after which a bounce starts to decay.
pub fn decay_after(interval: Interval) -> usize {
    match interval {
        Interval::OneHour => 12,
        Interval::FourHours => 6,
        Interval::OneDay => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BounceAnalysis {
    pub detected: bool,
    pub side: Option<Side>,
    pub strength: f64,
    pub confirmations: Vec<Confirmation>,
    /// Bars since the trigger bar; 0 when the trigger is the current bar.
    pub candles_since: usize,
    pub persistence: Option<Persistence>,
    /// Whether the moving-average reclaim holds on the current bar; `None`
    /// when the averages are unavailable.
    pub reclaim: Option<bool>,
    pub reentry: bool,
    /// Fraction of confidence removed by age, in [0, 0.5].
    pub decay: f64,
    pub confidence_multiplier: f64,
    pub trim_recommended: bool,
    pub trail_take_profit: Option<f64>,
    /// Bollinger middle band on the current bar.
    pub middle_band: Option<f64>,
    pub notes: Vec<String>,
}

impl BounceAnalysis {
    pub fn none() -> Self {
        Self {
            detected: false,
            side: None,
            strength: 0.0,
            confirmations: Vec::new(),
            candles_since: 0,
            persistence: None,
            reclaim: None,
            reentry: false,
            decay: 0.0,
            confidence_multiplier: 1.0,
            trim_recommended: false,
            trail_take_profit: None,
            middle_band: None,
            notes: Vec::new(),
        }
    }

    /// A detected bounce that is still fresh and has not failed without a
    /// second attempt. Only an active bounce decides the entry side.
    pub fn is_active(&self, interval: Interval) -> bool {
        self.detected
            && self.candles_since <= decay_after(interval)
            && (self.persistence != Some(Persistence::Failed) || self.reentry)
    }

    pub fn matches(&self, side: Side) -> bool {
        self.detected && self.side == Some(side)
    }
}

/// Suffix-aligned series indexed by candle position.
struct Aligned<'a, T> {
    values: &'a [T],
    offset: usize,
}

impl<'a, T: Copy> Aligned<'a, T> {
    fn new(values: &'a [T], total: usize) -> Self {
        Self {
            values,
            offset: total - values.len(),
        }
    }

    fn at(&self, index: usize) -> Option<T> {
        index.checked_sub(self.offset).and_then(|i| self.values.get(i).copied())
    }
}

fn avg_volume_before(candles: &[Candle], index: usize) -> Option<f64> {
    if index < VOLUME_AVERAGE_PERIOD {
        return None;
    }
    let window = &candles[index - VOLUME_AVERAGE_PERIOD..index];
    Some(window.iter().map(|c| c.volume).sum::<f64>() / VOLUME_AVERAGE_PERIOD as f64)
}

fn favourable_pct(side: Side, from: f64, to: f64) -> f64 {
    if from == 0.0 { 0.0 } else { side.sign() * (to - from) / from * 100.0 }
}

/// Per-bar values the follow-up checks read, indexed by candle position.
#[derive(Debug, Clone, Copy)]
pub struct FollowUpInputs<'a> {
    pub closes: &'a [f64],
    pub ema_8: &'a [Option<f64>],
    pub ema_20: &'a [Option<f64>],
    /// Current 4h EMA(8), if known.
    pub h4_ema_8: Option<f64>,
}

/// Replay the last [`LOOKBACK`] bars for the latest bounce and follow it to
/// the current bar. `h4_ema_8` is the current 4h EMA(8), if known.
pub fn analyze_bounce(candles: &[Candle], interval: Interval, h4_ema_8: Option<f64>) -> BounceAnalysis {
    let n = candles.len();
    let close_values = closes(candles);
    let bands_series = bollinger(&close_values, bollinger::DEFAULT_PERIOD, bollinger::DEFAULT_MULTIPLIER);
    let rsi_series = rsi(&close_values, rsi::DEFAULT_PERIOD);
    let stoch_series = stochastic(candles, stochastic::DEFAULT_K_PERIOD, stochastic::DEFAULT_D_PERIOD);
    let atr_series = atr(candles, atr::DEFAULT_PERIOD);
    let ema8_series = ema(&close_values, 8);
    let ema20_series = ema(&close_values, 20);

    let bands = Aligned::new(&bands_series, n);
    let rsi_at = Aligned::new(&rsi_series, n);
    let stoch_at = Aligned::new(&stoch_series, n);
    let atr_at = Aligned::new(&atr_series, n);

    if n < 2 {
        return BounceAnalysis::none();
    }
    let middle_band = bands.at(n - 1).map(|b| b.middle);

    let start = n.saturating_sub(LOOKBACK).max(1);
    let trigger = (start..n).rev().find_map(|i| {
        let (prev_bands, cur_bands) = (bands.at(i - 1)?, bands.at(i)?);
        let bar = BarInputs {
            prev_close: candles[i - 1].close,
            close: candles[i].close,
            prev_bands,
            bands: cur_bands,
            body: candles[i].body(),
            volume: candles[i].volume,
            avg_volume: avg_volume_before(candles, i),
            rsi: rsi_at.at(i),
            stochastic: stoch_at.at(i),
            atr: atr_at.at(i),
        };
        check_trigger(&bar).map(|t| (i, t))
    });

    let mut analysis = match trigger {
        Some((t, trigger)) => {
            let ema8 = Aligned::new(&ema8_series, n);
            let ema20 = Aligned::new(&ema20_series, n);
            let ema_8: Vec<Option<f64>> = (0..n).map(|i| ema8.at(i)).collect();
            let ema_20: Vec<Option<f64>> = (0..n).map(|i| ema20.at(i)).collect();
            let inputs = FollowUpInputs {
                closes: &close_values,
                ema_8: &ema_8,
                ema_20: &ema_20,
                h4_ema_8,
            };
            follow_bounce(&inputs, t, trigger, interval)
        }
        None => BounceAnalysis::none(),
    };
    analysis.middle_band = middle_band;
    analysis
}

/// Follow a bounce that triggered on bar `t` forward to the last bar.
pub fn follow_bounce(inputs: &FollowUpInputs<'_>, t: usize, trigger: BounceTrigger, interval: Interval) -> BounceAnalysis {
    let closes = inputs.closes;
    let mut analysis = BounceAnalysis::none();
    if t >= closes.len() {
        return analysis;
    }
    let ema8_at = |j: usize| inputs.ema_8.get(j).copied().flatten();
    let ema20_at = |j: usize| inputs.ema_20.get(j).copied().flatten();

    let side = trigger.side;
    let last = closes.len() - 1;
    let k = last - t;
    let trigger_close = closes[t];
    analysis.detected = true;
    analysis.side = Some(side);
    analysis.strength = trigger.strength;
    analysis.confirmations = trigger.confirmations;
    analysis.candles_since = k;
    analysis.notes.push(format!(
        "{:?} bounce {k} bar(s) ago with {} confirmation(s)",
        side,
        analysis.confirmations.len()
    ));

    let mut multiplier = 1.0;

    let window_end = (t + PERSISTENCE_BARS).min(last);
    let held = (t + 1..=window_end).any(|j| favourable_pct(side, trigger_close, closes[j]) >= PERSISTENCE_MOVE_PCT);
    let persistence = if held {
        Persistence::Passed
    } else if k >= PERSISTENCE_BARS {
        Persistence::Failed
    } else {
        Persistence::Pending
    };
    analysis.persistence = Some(persistence);
    if persistence == Persistence::Failed {
        multiplier *= PERSISTENCE_FAILURE_FACTOR;
        analysis.notes.push("no follow-through within 3 bars".into());
    }

    let reclaimed_at = |j: usize| -> Option<bool> {
        let close = closes[j];
        match side {
            Side::Long => {
                let e20 = ema20_at(j).map(|e| close > e);
                let h4 = inputs.h4_ema_8.map(|e| close > e);
                match (e20, h4) {
                    (None, None) => None,
                    (a, b) => Some(a.unwrap_or(false) || b.unwrap_or(false)),
                }
            }
            Side::Short => ema20_at(j).map(|e| close < e),
        }
    };
    analysis.reclaim = reclaimed_at(last);
    if analysis.reclaim == Some(false) {
        multiplier *= RECLAIM_FAILURE_FACTOR;
        analysis.notes.push("moving-average reclaim missing".into());
    }

    if persistence == Persistence::Failed {
        let failed_at = t + PERSISTENCE_BARS;
        let reentry_end = (failed_at + REENTRY_WINDOW).min(last);
        analysis.reentry = (failed_at + 1..=reentry_end).any(|j| reclaimed_at(j) == Some(true));
        if analysis.reentry {
            multiplier *= if trigger.strength >= 0.6 { 1.15 } else { 1.10 };
            analysis.notes.push("second attempt after failed follow-through".into());
        }
    }

    let threshold = decay_after(interval);
    if k > threshold {
        analysis.decay = ((k - threshold) as f64 * DECAY_PER_BAR).min(MAX_DECAY);
        multiplier *= 1.0 - analysis.decay;
    }
    analysis.confidence_multiplier = multiplier;

    let best_move = (t + 1..=last)
        .map(|j| favourable_pct(side, trigger_close, closes[j]))
        .fold(0.0, f64::max);
    let crossed_back = |j: usize| ema8_at(j).is_some_and(|e| side.sign() * (closes[j] - e) < 0.0);
    if best_move > TRIM_MOVE_PCT && crossed_back(last) {
        analysis.trim_recommended = true;
        analysis.notes.push(format!("trim half: {best_move:.2}% run given back below EMA(8)"));
    }
    if k >= 1 && crossed_back(last) && ema8_at(last - 1).is_some() && !crossed_back(last - 1) {
        // Best close since the trigger.
        analysis.trail_take_profit = closes[t..=last]
            .iter()
            .copied()
            .reduce(|best, c| if side.sign() * (c - best) > 0.0 { c } else { best });
        analysis.notes.push("EMA(8) crossed against the bounce; target trailed to the best close".into());
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bands(lower: f64, middle: f64, upper: f64) -> BollingerPoint {
        BollingerPoint { upper, middle, lower }
    }

    fn oversold_bar() -> BarInputs {
        BarInputs {
            prev_close: 89.0,
            close: 91.0,
            prev_bands: bands(90.0, 100.0, 110.0),
            bands: bands(90.5, 100.0, 109.5),
            body: 0.5,
            volume: 100.0,
            avg_volume: Some(1000.0),
            rsi: Some(25.0),
            stochastic: Some(StochasticPoint { k: 18.0, d: 12.0 }),
            atr: Some(1.0),
        }
    }

    #[test]
    fn lower_band_reentry_with_rsi_and_stochastic() {
        let trigger = check_trigger(&oversold_bar()).unwrap();
        assert_eq!(trigger.side, Side::Long);
        assert_eq!(
            trigger.confirmations,
            vec![Confirmation::RsiExtreme, Confirmation::StochasticCross]
        );
        assert!((trigger.strength - 0.4).abs() < 1e-12);
    }

    #[test]
    fn one_confirmation_is_not_enough() {
        let mut bar = oversold_bar();
        bar.rsi = Some(45.0);
        assert_eq!(check_trigger(&bar), None);
    }

    #[test]
    fn staying_outside_is_not_a_bounce() {
        let mut bar = oversold_bar();
        bar.close = 90.0;
        assert_eq!(check_trigger(&bar), None);
    }

    #[test]
    fn upper_band_reentry_is_short() {
        let bar = BarInputs {
            prev_close: 111.0,
            close: 108.0,
            prev_bands: bands(90.0, 100.0, 110.0),
            bands: bands(90.0, 100.0, 110.0),
            body: 3.0,
            volume: 2000.0,
            avg_volume: Some(1000.0),
            rsi: Some(60.0),
            stochastic: Some(StochasticPoint { k: 85.0, d: 90.0 }),
            atr: Some(2.0),
        };
        let trigger = check_trigger(&bar).unwrap();
        assert_eq!(trigger.side, Side::Short);
        assert_eq!(trigger.confirmations.len(), 4);
        assert!((trigger.strength - 0.8).abs() < 1e-12);
    }

    #[test]
    fn decay_thresholds_by_interval() {
        assert_eq!(decay_after(Interval::OneHour), 12);
        assert_eq!(decay_after(Interval::FourHours), 6);
        assert_eq!(decay_after(Interval::OneDay), 1);
    }

    #[test]
    fn flat_history_has_no_bounce() {
        let candles = crate::domain::indicator::make_candles(&[100.0; 60]);
        let analysis = analyze_bounce(&candles, Interval::OneHour, None);
        assert!(!analysis.detected);
        assert_eq!(analysis.confidence_multiplier, 1.0);
        assert_eq!(analysis.middle_band, Some(100.0));
    }

    fn selloff_then_bounce() -> Vec<Candle> {
        // Gentle chop, a sharp drop below the lower band, then a reclaim.
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        closes.extend([98.0, 95.0, 91.0, 97.5]);
        crate::domain::indicator::make_candles(&closes)
    }

    #[test]
    fn replay_finds_fresh_bounce() {
        let candles = selloff_then_bounce();
        let analysis = analyze_bounce(&candles, Interval::OneHour, None);
        assert!(analysis.detected);
        assert_eq!(analysis.side, Some(Side::Long));
        assert_eq!(analysis.candles_since, 0);
        assert_eq!(analysis.persistence, Some(Persistence::Pending));
        assert!(analysis.is_active(Interval::OneHour));
        assert!(analysis.matches(Side::Long));
        assert!(!analysis.matches(Side::Short));
    }

    #[test]
    fn stalled_bounce_fails_persistence() {
        let mut candles = selloff_then_bounce();
        let last = *candles.last().unwrap();
        for step in 1..=3 {
            let mut c = last;
            c.timestamp += step * 3_600_000;
            c.open = last.close;
            c.close = last.close - 0.1 * step as f64;
            c.high = c.open + 1.0;
            c.low = c.close - 1.0;
            candles.push(c);
        }
        let analysis = analyze_bounce(&candles, Interval::OneHour, None);
        assert!(analysis.detected);
        assert_eq!(analysis.candles_since, 3);
        assert_eq!(analysis.persistence, Some(Persistence::Failed));
        assert!(!analysis.reentry);
        assert!(!analysis.is_active(Interval::OneHour));
        assert!(analysis.confidence_multiplier <= PERSISTENCE_FAILURE_FACTOR);
    }

    fn long_trigger(strength: f64) -> BounceTrigger {
        BounceTrigger {
            side: Side::Long,
            confirmations: vec![Confirmation::RsiExtreme, Confirmation::StochasticCross],
            strength,
        }
    }

    fn follow(closes: &[f64], ema_8: &[Option<f64>], ema_20: &[Option<f64>], strength: f64, interval: Interval) -> BounceAnalysis {
        let inputs = FollowUpInputs {
            closes,
            ema_8,
            ema_20,
            h4_ema_8: None,
        };
        follow_bounce(&inputs, 0, long_trigger(strength), interval)
    }

    #[test]
    fn reclaim_after_failed_follow_through_is_a_second_attempt() {
        let closes = [100.0, 100.1, 100.2, 100.3, 100.4];
        let ema_20 = [Some(101.0), Some(101.0), Some(101.0), Some(101.0), Some(100.2)];
        let ema_8 = [None; 5];

        let weak = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert_eq!(weak.persistence, Some(Persistence::Failed));
        assert_eq!(weak.reclaim, Some(true));
        assert!(weak.reentry);
        assert_relative_eq!(weak.confidence_multiplier, 0.5 * 1.10);
        assert!(weak.notes.iter().any(|n| n.contains("second attempt")));
        assert!(weak.is_active(Interval::OneHour));

        let strong = follow(&closes, &ema_8, &ema_20, 0.6, Interval::OneHour);
        assert_relative_eq!(strong.confidence_multiplier, 0.5 * 1.15);
    }

    #[test]
    fn reclaim_outside_the_window_is_not_a_second_attempt() {
        let mut closes = vec![100.0, 100.1, 100.2, 100.3];
        closes.extend([100.2; 6]);
        closes.push(100.4);
        let mut ema_20 = vec![Some(101.0); closes.len()];
        ema_20[10] = Some(100.2);
        let ema_8 = vec![None; closes.len()];

        let analysis = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert_eq!(analysis.persistence, Some(Persistence::Failed));
        assert!(!analysis.reentry);
        assert_relative_eq!(analysis.confidence_multiplier, 0.5);
    }

    #[test]
    fn old_bounce_decays_two_percent_per_bar() {
        let mut closes = vec![100.0];
        closes.extend([101.0; 20]);
        let ema_20 = vec![Some(99.0); closes.len()];
        let ema_8 = vec![None; closes.len()];

        let hourly = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert_eq!(hourly.persistence, Some(Persistence::Passed));
        assert_eq!(hourly.candles_since, 20);
        assert_relative_eq!(hourly.decay, 0.16, epsilon = 1e-12);
        assert_relative_eq!(hourly.confidence_multiplier, 0.84, epsilon = 1e-12);
        assert!(!hourly.is_active(Interval::OneHour));

        let daily = follow(&closes[..6], &ema_8[..6], &ema_20[..6], 0.4, Interval::OneDay);
        assert_relative_eq!(daily.decay, 0.08, epsilon = 1e-12);
    }

    #[test]
    fn decay_is_capped_at_half() {
        let mut closes = vec![100.0];
        closes.extend([101.0; 50]);
        let ema_20 = vec![Some(99.0); closes.len()];
        let ema_8 = vec![None; closes.len()];

        let analysis = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert_relative_eq!(analysis.decay, MAX_DECAY);
        assert_relative_eq!(analysis.confidence_multiplier, 0.5);
    }

    #[test]
    fn big_run_lost_below_ema8_trims_and_trails() {
        let closes = [100.0, 101.0, 102.0, 104.0, 103.5];
        let ema_8 = [None, Some(100.5), Some(101.2), Some(103.0), Some(103.8)];
        let ema_20 = [Some(99.0); 5];

        let analysis = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert!(analysis.trim_recommended);
        assert!(analysis.notes.iter().any(|n| n.starts_with("trim half")));
        assert_eq!(analysis.trail_take_profit, Some(104.0));
        assert_relative_eq!(analysis.confidence_multiplier, 1.0);
    }

    #[test]
    fn small_run_trails_without_trim() {
        let closes = [100.0, 101.0, 102.0, 101.2];
        let ema_8 = [None, Some(100.5), Some(101.5), Some(101.6)];
        let ema_20 = [Some(99.0); 4];

        let analysis = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert!(!analysis.trim_recommended);
        assert_eq!(analysis.trail_take_profit, Some(102.0));
        assert!(analysis.notes.iter().any(|n| n.contains("target trailed")));
    }

    #[test]
    fn trail_only_on_the_crossing_bar() {
        let closes = [100.0, 101.0, 102.0, 101.2, 101.0];
        let ema_8 = [None, Some(100.5), Some(101.5), Some(101.6), Some(101.5)];
        let ema_20 = [Some(99.0); 5];

        let analysis = follow(&closes, &ema_8, &ema_20, 0.4, Interval::OneHour);
        assert_eq!(analysis.trail_take_profit, None);
    }

    #[test]
    fn analyze_bounce_trails_after_a_lost_run() {
        let mut closes: Vec<f64> = selloff_then_bounce().iter().map(|c| c.close).collect();
        closes.extend([99.0, 100.0, 97.0]);
        let candles = crate::domain::indicator::make_candles(&closes);

        let analysis = analyze_bounce(&candles, Interval::OneHour, None);
        assert!(analysis.detected);
        assert_eq!(analysis.candles_since, 3);
        assert_eq!(analysis.persistence, Some(Persistence::Passed));
        assert!(analysis.is_active(Interval::OneHour));
        assert_eq!(analysis.trail_take_profit, Some(100.0));
    }
}
