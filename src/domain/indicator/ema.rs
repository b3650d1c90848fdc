//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = (x[i] - EMA[i-1]) * k + EMA[i-1].
//! Output length: len - n + 1; empty if len < n.

pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out.push(prev);

    for &x in &values[period..] {
        prev = (x - prev) * k + prev;
        out.push(prev);
    }
    out
}
