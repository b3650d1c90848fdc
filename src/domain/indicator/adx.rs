//! ADX, +DI and -DI (Wilder).
//!
//! 1. +DM = up move if it is larger than the down move and positive, else 0;
//!    -DM symmetric. Equal moves give 0 to both.
//! 2. Wilder-smooth +DM, -DM and TR over n
//! 3. +DI = 100 * sm(+DM) / sm(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when the sum is 0
//! 5. ADX = Wilder-smoothed DX
//!
//! Needs 2n candles; output length len - 2n + 1.

use crate::domain::indicator_helpers::wilder_smooth;
use crate::domain::ohlcv::Candle;
use serde::Serialize;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdxPoint {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

pub fn adx(candles: &[Candle], period: usize) -> Vec<AdxPoint> {
    if period == 0 || candles.len() < 2 * period {
        return Vec::new();
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    let mut tr = Vec::with_capacity(candles.len() - 1);

    for w in candles.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let up = cur.high - prev.high;
        let down = prev.low - cur.low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        tr.push(cur.true_range(prev.close));
    }

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let di: Vec<(f64, f64)> = smooth_tr
        .iter()
        .zip(smooth_plus.iter().zip(&smooth_minus))
        .map(|(&str_, (&sp, &sm))| {
            if str_ == 0.0 {
                (0.0, 0.0)
            } else {
                (100.0 * sp / str_, 100.0 * sm / str_)
            }
        })
        .collect();

    let dx: Vec<f64> = di
        .iter()
        .map(|&(p, m)| {
            let sum = p + m;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (p - m).abs() / sum
            }
        })
        .collect();

    let adx_values = wilder_smooth(&dx, period);
    let offset = period - 1;

    adx_values
        .into_iter()
        .enumerate()
        .map(|(i, adx)| {
            let (plus_di, minus_di) = di[i + offset];
            AdxPoint {
                adx,
                plus_di,
                minus_di,
            }
        })
        .collect()
}
