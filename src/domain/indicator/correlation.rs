//! Cross-asset correlation.
//!
//! Pearson correlation of percentage-change series. Series of different
//! lengths are aligned on their most recent values. A pair with zero
//! variance on either side has no correlation (`None`).

use crate::domain::indicator_helpers::pct_changes;
use serde::Serialize;

pub const DEFAULT_LOOKBACK: usize = 30;

pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub assets: Vec<String>,
    /// `values[i][j]` is the correlation of assets i and j.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        self.values[i][j]
    }
}

/// Pairwise correlation of the last `lookback` percentage changes of each
/// close series.
pub fn correlation_matrix(series: &[(String, Vec<f64>)], lookback: usize) -> CorrelationMatrix {
    let changes: Vec<Vec<f64>> = series
        .iter()
        .map(|(_, closes)| {
            let start = closes.len().saturating_sub(lookback + 1);
            pct_changes(&closes[start..])
        })
        .collect();

    let values = changes
        .iter()
        .map(|a| changes.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        assets: series.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}
