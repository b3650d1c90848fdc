//! Rolling population standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((x[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Output length: len - n + 1.

use crate::domain::indicator_helpers::population_stddev;

pub fn rolling_stddev(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    values
        .windows(period)
        .filter_map(population_stddev)
        .collect()
}
