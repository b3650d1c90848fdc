//! Parabolic SAR (Wilder's stop-and-reverse).
//!
//! Sequential: tracks direction, extreme point (EP) and acceleration factor
//! (AF). AF starts at 0.02, steps by 0.02 on each new EP, caps at 0.20, and
//! resets on reversal. The initial direction comes from the first two closes.
//! Output starts at the second candle: length len - 1.

use crate::domain::ohlcv::Candle;
use serde::Serialize;

pub const AF_START: f64 = 0.02;
pub const AF_STEP: f64 = 0.02;
pub const AF_MAX: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParabolicSarPoint {
    pub sar: f64,
    pub uptrend: bool,
}

pub fn parabolic_sar(candles: &[Candle]) -> Vec<ParabolicSarPoint> {
    parabolic_sar_with(candles, AF_START, AF_STEP, AF_MAX)
}

pub fn parabolic_sar_with(
    candles: &[Candle],
    af_start: f64,
    af_step: f64,
    af_max: f64,
) -> Vec<ParabolicSarPoint> {
    if candles.len() < 2 {
        return Vec::new();
    }

    let mut uptrend = candles[1].close >= candles[0].close;
    let mut af = af_start;
    let (mut sar, mut ep) = if uptrend {
        (candles[0].low, candles[1].high)
    } else {
        (candles[0].high, candles[1].low)
    };

    let mut out = Vec::with_capacity(candles.len() - 1);
    out.push(ParabolicSarPoint { sar, uptrend });

    for i in 2..candles.len() {
        let bar = &candles[i];
        let mut next = sar + af * (ep - sar);

        if uptrend {
            // Never above the two prior lows.
            next = next.min(candles[i - 1].low).min(candles[i - 2].low);
            if bar.low < next {
                uptrend = false;
                next = ep;
                ep = bar.low;
                af = af_start;
            } else if bar.high > ep {
                ep = bar.high;
                af = (af + af_step).min(af_max);
            }
        } else {
            next = next.max(candles[i - 1].high).max(candles[i - 2].high);
            if bar.high > next {
                uptrend = true;
                next = ep;
                ep = bar.high;
                af = af_start;
            } else if bar.low < ep {
                ep = bar.low;
                af = (af + af_step).min(af_max);
            }
        }

        sar = next;
        out.push(ParabolicSarPoint { sar, uptrend });
    }
    out
}
