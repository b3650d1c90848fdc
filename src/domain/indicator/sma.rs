//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(values[i-n+1..=i]), computed with a running sum.
//! Output length: len - n + 1; empty if len < n.

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut sum: f64 = values[..period].iter().sum();
    out.push(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out.push(sum / period as f64);
    }
    out
}
