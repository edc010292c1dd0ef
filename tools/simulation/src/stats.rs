//! Small statistics helpers shared by the tracker and the reports.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (n - 1) as f64).sqrt())
}

/// Nearest-rank percentile of an ascending slice, `p` in [0, 1].
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted.get(idx).copied()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = match equity_curve.first() {
        Some(first) => *first,
        None => return 0.0,
    };
    let mut max_dd: f64 = 0.0;
    for &value in equity_curve {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Historical value-at-risk of a series of P&L changes, reported as a
/// positive loss.
pub fn historical_var(changes: &[f64], confidence: f64) -> f64 {
    let sorted = sorted(changes);
    percentile(&sorted, 1.0 - confidence)
        .map(|v| -v.min(0.0))
        .unwrap_or(0.0)
}
