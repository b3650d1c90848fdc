//! Indicator snapshot builder.
//!
//! Computes the latest value of every indicator for one asset at one
//! evaluation instant, across the primary timeframe and the optional 4h/1d
//! series, plus the [`TrendAlignment`] summary. A snapshot is built fresh
//! for each pipeline run and never cached.

use crate::domain::error::SignalGateError;
use crate::domain::external::ExternalData;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::adx::{self, AdxPoint, adx};
use crate::domain::indicator::aroon::{self, AroonPoint, aroon};
use crate::domain::indicator::atr::{self, atr, atr_percent};
use crate::domain::indicator::bollinger::{self, BollingerPoint, bollinger};
use crate::domain::indicator::candlestick::{CandlestickReading, candlestick_patterns};
use crate::domain::indicator::cci::{self, cci};
use crate::domain::indicator::change_of_character::{ChangeOfCharacter, change_of_character};
use crate::domain::indicator::cvd::{self, CvdReading, cvd_analysis};
use crate::domain::indicator::divergence::{self, Divergence, detect_divergence};
use crate::domain::indicator::ema;
use crate::domain::indicator::macd::{self, MacdPoint, macd};
use crate::domain::indicator::obv::obv;
use crate::domain::indicator::parabolic_sar::{ParabolicSarPoint, parabolic_sar};
use crate::domain::indicator::regime::{RegimeReading, market_regime};
use crate::domain::indicator::rsi::{self, rsi};
use crate::domain::indicator::stochastic::{self, StochasticPoint, stochastic};
use crate::domain::indicator::support_resistance::{self, SupportResistance, support_resistance};
use crate::domain::indicator::trend::{MarketStructure, Trend, TrendReading, detect_trend, market_structure};
use crate::domain::indicator::volume_profile::{VolumeProfile, composite_profile, session_profile};
use crate::domain::indicator::vwap::vwap;
use crate::domain::indicator::williams_r::{self, williams_r};
use crate::domain::ohlcv::{Candle, Interval, OhlcvSeries, closes, volumes};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const VOLUME_AVERAGE_PERIOD: usize = 20;
const OBV_SLOPE_PERIOD: usize = 10;

/// The series available for one asset. The primary series drives every
/// per-candle indicator; the 4h and 1d series only feed trend alignment.
#[derive(Debug, Clone, Copy)]
pub struct TimeframeSet<'a> {
    pub primary: &'a OhlcvSeries,
    pub h4: Option<&'a OhlcvSeries>,
    pub d1: Option<&'a OhlcvSeries>,
}

impl<'a> TimeframeSet<'a> {
    pub fn new(primary: &'a OhlcvSeries) -> Self {
        Self {
            primary,
            h4: None,
            d1: None,
        }
    }

    pub fn with_h4(mut self, series: &'a OhlcvSeries) -> Self {
        self.h4 = Some(series);
        self
    }

    pub fn with_daily(mut self, series: &'a OhlcvSeries) -> Self {
        self.d1 = Some(series);
        self
    }

    /// Series for an interval; the primary series stands in for its own interval.
    pub fn series(&self, interval: Interval) -> Option<&'a OhlcvSeries> {
        if self.primary.interval() == interval {
            return Some(self.primary);
        }
        match interval {
            Interval::FourHours => self.h4,
            Interval::OneDay => self.d1,
            Interval::OneHour => None,
        }
    }

    pub fn asset(&self) -> &str {
        self.primary.asset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAlignment {
    pub daily_trend: Trend,
    pub h4_trend: Option<Trend>,
    pub h1_trend: Option<Trend>,
    pub h4_aligned: bool,
    pub h1_aligned: bool,
    /// 40 for a directional daily trend plus 30 per aligned lower timeframe.
    pub alignment_score: f64,
}

impl TrendAlignment {
    pub fn from_trends(daily: Option<Trend>, h4: Option<Trend>, h1: Option<Trend>) -> Self {
        let daily_trend = daily.unwrap_or(Trend::Neutral);
        let directional = daily_trend != Trend::Neutral;
        let h4_aligned = directional && h4 == Some(daily_trend);
        let h1_aligned = directional && h1 == Some(daily_trend);
        let alignment_score = if directional { 40.0 } else { 0.0 }
            + if h4_aligned { 30.0 } else { 0.0 }
            + if h1_aligned { 30.0 } else { 0.0 };
        Self {
            daily_trend,
            h4_trend: h4,
            h1_trend: h1,
            h4_aligned,
            h1_aligned,
            alignment_score,
        }
    }

    /// Label, trend and trend-alignment weight per available timeframe,
    /// daily first.
    pub fn weighted_trends(&self, daily_available: bool) -> Vec<(&'static str, Trend, f64)> {
        let daily = daily_available.then_some(("daily", self.daily_trend, 12.0));
        let h4 = self.h4_trend.map(|t| ("4h", t, 8.0));
        let h1 = self.h1_trend.map(|t| ("1h", t, 5.0));
        [daily, h4, h1].into_iter().flatten().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub asset: String,
    pub interval: Interval,
    /// Open time of the last visible candle.
    pub timestamp: i64,
    pub price: f64,
    pub candles: usize,
    pub ema_8: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub ema_200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdPoint>,
    pub prev_macd_histogram: Option<f64>,
    pub bollinger: Option<BollingerPoint>,
    pub atr: Option<f64>,
    pub atr_pct: Option<f64>,
    pub adx: Option<AdxPoint>,
    /// OBV change over the last ten candles.
    pub obv_slope: Option<f64>,
    pub vwap: Option<f64>,
    pub stochastic: Option<StochasticPoint>,
    pub cci: Option<f64>,
    pub williams_r: Option<f64>,
    pub parabolic_sar: Option<ParabolicSarPoint>,
    pub aroon: Option<AroonPoint>,
    pub support_resistance: Option<SupportResistance>,
    pub trend: Option<TrendReading>,
    pub structure: Option<MarketStructure>,
    pub regime: Option<RegimeReading>,
    pub candlestick: Option<CandlestickReading>,
    pub rsi_divergence: Option<Divergence>,
    pub macd_divergence: Option<Divergence>,
    pub session_profile: Option<VolumeProfile>,
    pub composite_profile: Option<VolumeProfile>,
    pub change_of_character: Option<ChangeOfCharacter>,
    pub cvd: Option<CvdReading>,
    /// Last volume over the mean of the twenty before it.
    pub volume_ratio: Option<f64>,
    pub price_change_24h_pct: Option<f64>,
    /// EMA(8) of the 4h series, used by the bounce reclaim check.
    pub h4_ema_8: Option<f64>,
    pub daily_available: bool,
    pub alignment: TrendAlignment,
}

fn last<T: Copy>(values: &[T]) -> Option<T> {
    values.last().copied()
}

fn second_last<T: Copy>(values: &[T]) -> Option<T> {
    values.len().checked_sub(2).map(|i| values[i])
}

fn volume_ratio(candles: &[Candle]) -> Option<f64> {
    if candles.len() < VOLUME_AVERAGE_PERIOD + 1 {
        return None;
    }
    let n = candles.len();
    let prior = &candles[n - 1 - VOLUME_AVERAGE_PERIOD..n - 1];
    let avg = prior.iter().map(|c| c.volume).sum::<f64>() / VOLUME_AVERAGE_PERIOD as f64;
    (avg > 0.0).then(|| candles[n - 1].volume / avg)
}

fn price_change_pct(candles: &[Candle], lookback: usize) -> Option<f64> {
    let n = candles.len();
    if n <= lookback {
        return None;
    }
    let base = candles[n - 1 - lookback].close;
    (base > 0.0).then(|| (candles[n - 1].close - base) / base * 100.0)
}

fn timeframe_trend(series: Option<&OhlcvSeries>, now: i64) -> Option<Trend> {
    let visible = series?.up_to(now);
    detect_trend(&closes(visible)).map(|r| r.trend)
}

/// Build the snapshot visible at `now` (epoch ms). Only candles opened at
/// or before `now` are used, so the same inputs always give the same
/// snapshot.
pub fn build_snapshot(
    timeframes: &TimeframeSet<'_>,
    now: i64,
    external: &ExternalData,
) -> Result<IndicatorSnapshot, SignalGateError> {
    let primary = timeframes.primary;
    let candles = primary.up_to(now);
    let Some(last_candle) = candles.last() else {
        return Err(SignalGateError::InsufficientData {
            asset: primary.asset().to_string(),
            interval: primary.interval().to_string(),
            candles: 0,
            minimum: 1,
        });
    };

    let price = last_candle.close;
    let close_values = closes(candles);
    let volume_values = volumes(candles);
    let interval = primary.interval();

    let rsi_series = rsi(&close_values, rsi::DEFAULT_PERIOD);
    let macd_series = macd(&close_values, macd::DEFAULT_FAST, macd::DEFAULT_SLOW, macd::DEFAULT_SIGNAL);
    let histogram: Vec<f64> = macd_series.iter().map(|m| m.histogram).collect();
    let atr_value = last(&atr(candles, atr::DEFAULT_PERIOD));
    let obv_series = obv(&close_values, &volume_values);
    let obv_slope = (obv_series.len() > OBV_SLOPE_PERIOD)
        .then(|| obv_series[obv_series.len() - 1] - obv_series[obv_series.len() - 1 - OBV_SLOPE_PERIOD]);

    let session = session_profile(candles, interval);
    let composite = external
        .volume_profile
        .clone()
        .or_else(|| composite_profile(candles));

    let h4_ema_8 = timeframes
        .series(Interval::FourHours)
        .and_then(|s| last(&ema(&closes(s.up_to(now)), 8)));

    let daily_trend = timeframe_trend(timeframes.series(Interval::OneDay), now);
    let alignment = TrendAlignment::from_trends(
        daily_trend,
        timeframe_trend(timeframes.series(Interval::FourHours), now),
        timeframe_trend(timeframes.series(Interval::OneHour), now),
    );

    let snapshot = IndicatorSnapshot {
        asset: primary.asset().to_string(),
        interval,
        timestamp: last_candle.timestamp,
        price,
        candles: candles.len(),
        ema_8: last(&ema(&close_values, 8)),
        ema_20: last(&ema(&close_values, 20)),
        ema_50: last(&ema(&close_values, 50)),
        ema_200: last(&ema(&close_values, 200)),
        rsi: last(&rsi_series),
        macd: last(&macd_series),
        prev_macd_histogram: second_last(&histogram),
        bollinger: last(&bollinger(
            &close_values,
            bollinger::DEFAULT_PERIOD,
            bollinger::DEFAULT_MULTIPLIER,
        )),
        atr: atr_value,
        atr_pct: atr_value.map(|a| atr_percent(a, price)),
        adx: last(&adx(candles, adx::DEFAULT_PERIOD)),
        obv_slope,
        vwap: vwap(candles),
        stochastic: last(&stochastic(
            candles,
            stochastic::DEFAULT_K_PERIOD,
            stochastic::DEFAULT_D_PERIOD,
        )),
        cci: last(&cci(candles, cci::DEFAULT_PERIOD)),
        williams_r: last(&williams_r(candles, williams_r::DEFAULT_PERIOD)),
        parabolic_sar: last(&parabolic_sar(candles)),
        aroon: last(&aroon(candles, aroon::DEFAULT_PERIOD)),
        support_resistance: support_resistance(candles),
        trend: detect_trend(&close_values),
        structure: market_structure(candles, support_resistance::SWING_STRENGTH),
        regime: market_regime(candles),
        candlestick: candlestick_patterns(candles),
        rsi_divergence: detect_divergence(&close_values, &rsi_series, divergence::DEFAULT_LOOKBACK),
        macd_divergence: detect_divergence(&close_values, &histogram, divergence::DEFAULT_LOOKBACK),
        session_profile: session,
        composite_profile: composite,
        change_of_character: external
            .change_of_character
            .clone()
            .or_else(|| change_of_character(candles)),
        cvd: external
            .cumulative_volume_delta
            .or_else(|| cvd_analysis(candles, cvd::DEFAULT_WINDOW)),
        volume_ratio: volume_ratio(candles),
        price_change_24h_pct: price_change_pct(candles, interval.candles_per_day()),
        h4_ema_8,
        daily_available: daily_trend.is_some(),
        alignment,
    };

    debug!(
        asset = %snapshot.asset,
        interval = %interval,
        candles = snapshot.candles,
        indicators = snapshot.named_values().len(),
        "snapshot built"
    );
    Ok(snapshot)
}

impl IndicatorSnapshot {
    /// Latest values keyed by indicator name, e.g. `"RSI(14)"`. Composite
    /// indicators contribute one entry per component.
    pub fn named_values(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        let mut put = |name: String, value: Option<f64>| {
            if let Some(v) = value {
                out.insert(name, v);
            }
        };

        for (period, value) in [(8, self.ema_8), (20, self.ema_20), (50, self.ema_50), (200, self.ema_200)] {
            put(IndicatorType::Ema(period).to_string(), value);
        }
        put(IndicatorType::Rsi(rsi::DEFAULT_PERIOD).to_string(), self.rsi);
        let macd_name = IndicatorType::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
        .to_string();
        put(format!("{macd_name}.line"), self.macd.map(|m| m.line));
        put(format!("{macd_name}.signal"), self.macd.map(|m| m.signal));
        put(format!("{macd_name}.histogram"), self.macd.map(|m| m.histogram));
        let boll_name = IndicatorType::Bollinger {
            period: bollinger::DEFAULT_PERIOD,
            stddev_mult_x100: (bollinger::DEFAULT_MULTIPLIER * 100.0) as u32,
        }
        .to_string();
        put(format!("{boll_name}.upper"), self.bollinger.map(|b| b.upper));
        put(format!("{boll_name}.middle"), self.bollinger.map(|b| b.middle));
        put(format!("{boll_name}.lower"), self.bollinger.map(|b| b.lower));
        put(IndicatorType::Atr(atr::DEFAULT_PERIOD).to_string(), self.atr);
        let adx_name = IndicatorType::Adx(adx::DEFAULT_PERIOD).to_string();
        put(adx_name.clone(), self.adx.map(|a| a.adx));
        put(format!("{adx_name}.plus_di"), self.adx.map(|a| a.plus_di));
        put(format!("{adx_name}.minus_di"), self.adx.map(|a| a.minus_di));
        put(IndicatorType::Obv.to_string(), self.obv_slope);
        put(IndicatorType::Vwap.to_string(), self.vwap);
        let stoch_name = IndicatorType::Stochastic {
            k_period: stochastic::DEFAULT_K_PERIOD,
            d_period: stochastic::DEFAULT_D_PERIOD,
        }
        .to_string();
        put(format!("{stoch_name}.k"), self.stochastic.map(|s| s.k));
        put(format!("{stoch_name}.d"), self.stochastic.map(|s| s.d));
        put(IndicatorType::Cci(cci::DEFAULT_PERIOD).to_string(), self.cci);
        put(IndicatorType::WilliamsR(williams_r::DEFAULT_PERIOD).to_string(), self.williams_r);
        put(IndicatorType::ParabolicSar.to_string(), self.parabolic_sar.map(|p| p.sar));
        let aroon_name = IndicatorType::Aroon(aroon::DEFAULT_PERIOD).to_string();
        put(format!("{aroon_name}.up"), self.aroon.map(|a| a.up));
        put(format!("{aroon_name}.down"), self.aroon.map(|a| a.down));
        let sr_name = IndicatorType::SupportResistance.to_string();
        put(format!("{sr_name}.support"), self.support_resistance.as_ref().and_then(|s| s.support));
        put(format!("{sr_name}.resistance"), self.support_resistance.as_ref().and_then(|s| s.resistance));
        let vp_name = IndicatorType::VolumeProfile.to_string();
        put(format!("{vp_name}.poc"), self.composite_profile.as_ref().map(|v| v.poc));
        put(IndicatorType::ChangeOfCharacter.to_string(), self.change_of_character.as_ref().map(|c| c.strength));
        put(IndicatorType::Cvd(cvd::DEFAULT_WINDOW).to_string(), self.cvd.map(|c| c.value));
        out
    }

    /// True when at least one of the directional studies that need a full
    /// warm-up window (RSI, MACD, Bollinger, Aroon, EMA(20), CCI, ADX) is present.
    pub fn has_directional_indicators(&self) -> bool {
        self.rsi.is_some()
            || self.macd.is_some()
            || self.bollinger.is_some()
            || self.aroon.is_some()
            || self.ema_20.is_some()
            || self.cci.is_some()
            || self.adx.is_some()
    }

    /// MACD histogram as a percentage of price.
    pub fn macd_histogram_pct(&self) -> Option<f64> {
        let hist = self.macd?.histogram;
        (self.price > 0.0).then(|| hist / self.price * 100.0)
    }
}
