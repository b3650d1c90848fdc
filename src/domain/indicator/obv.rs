//! OBV (On-Balance Volume).
//!
//! OBV[0] = 0
//! close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
//! close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
//! close[i] == close[i-1]: OBV[i] = OBV[i-1]
//!
//! No warm-up; one value per input point.

pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let n = closes.len().min(volumes.len());
    if n == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n);
    let mut total = 0.0;
    out.push(total);
    for i in 1..n {
        if closes[i] > closes[i - 1] {
            total += volumes[i];
        } else if closes[i] < closes[i - 1] {
            total -= volumes[i];
        }
        out.push(total);
    }
    out
}
