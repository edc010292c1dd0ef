//! Monte Carlo ensemble summary
//!
//! Distribution of outcomes across the scenarios of one ensemble.

use crate::metrics::SimulationMetrics;
use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub scenarios: usize,
    pub mean_pnl: f64,
    pub pnl_std_dev: f64,
    /// 5th percentile of total P&L
    pub pnl_p5: f64,
    pub pnl_p95: f64,
    pub mean_success_rate: f64,
    pub success_rate_std_dev: f64,
    /// Fraction of scenarios ending with positive P&L
    pub probability_of_profit: f64,
    pub worst_drawdown_pct: f64,
}

pub fn summarize(ensemble: &[SimulationMetrics]) -> EnsembleSummary {
    if ensemble.is_empty() {
        return EnsembleSummary::default();
    }

    let pnls: Vec<f64> = ensemble.iter().map(|m| m.total_pnl).collect();
    let rates: Vec<f64> = ensemble.iter().map(|m| m.success_rate).collect();
    let sorted_pnls = stats::sorted(&pnls);
    let profitable = pnls.iter().filter(|&&p| p > 0.0).count();

    EnsembleSummary {
        scenarios: ensemble.len(),
        mean_pnl: stats::mean(&pnls).unwrap_or(0.0),
        pnl_std_dev: stats::sample_std_dev(&pnls).unwrap_or(0.0),
        pnl_p5: stats::percentile(&sorted_pnls, 0.05).unwrap_or(0.0),
        pnl_p95: stats::percentile(&sorted_pnls, 0.95).unwrap_or(0.0),
        mean_success_rate: stats::mean(&rates).unwrap_or(0.0),
        success_rate_std_dev: stats::sample_std_dev(&rates).unwrap_or(0.0),
        probability_of_profit: profitable as f64 / ensemble.len() as f64,
        worst_drawdown_pct: ensemble
            .iter()
            .map(|m| m.max_drawdown_pct)
            .fold(0.0, f64::max),
    }
}
