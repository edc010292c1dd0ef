//! Performance metrics for simulation
//!
//! Derived fresh from the execution history and the P&L tracker snapshot
//! on every request; never updated in place.

use crate::execution::SimulatedExecution;
use crate::tracker::PnlSnapshot;
use serde::{Deserialize, Serialize};

/// Aggregated simulation metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub partial_fills: usize,
    pub success_rate: f64,
    pub avg_slippage: f64,
    pub avg_market_impact: f64,
    pub avg_latency_ms: f64,
    pub total_transaction_costs: f64,
    pub total_pnl: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub var_95: f64,
}

impl SimulationMetrics {
    /// Build metrics from a history and a tracker snapshot.
    ///
    /// Slippage and impact averages cover successful executions only;
    /// latency covers every attempt.
    pub fn from_history(history: &[SimulatedExecution], pnl: &PnlSnapshot) -> Self {
        let total = history.len();
        let mut successful = 0usize;
        let mut partial = 0usize;
        let mut slippage_sum = 0.0;
        let mut impact_sum = 0.0;
        let mut latency_sum = 0.0;
        let mut costs = 0.0;

        for exec in history {
            latency_sum += exec.latency_ms();
            if !exec.was_executed {
                continue;
            }
            successful += 1;
            slippage_sum += exec.slippage;
            impact_sum += exec.market_impact;
            costs += exec.transaction_cost;
            if exec.is_partial_fill() {
                partial += 1;
            }
        }

        let ratio = |sum: f64, n: usize| if n > 0 { sum / n as f64 } else { 0.0 };

        Self {
            total_executions: total,
            successful_executions: successful,
            failed_executions: total - successful,
            partial_fills: partial,
            success_rate: ratio(successful as f64, total),
            avg_slippage: ratio(slippage_sum, successful),
            avg_market_impact: ratio(impact_sum, successful),
            avg_latency_ms: ratio(latency_sum, total),
            total_transaction_costs: costs,
            total_pnl: pnl.total_pnl,
            sharpe_ratio: pnl.sharpe_ratio,
            max_drawdown_pct: pnl.max_drawdown_pct,
            win_rate_pct: pnl.win_rate_pct,
            var_95: pnl.var_95,
        }
    }

    /// Build a summary string.
    pub fn summary(&self) -> String {
        format!(
            "Executions: {} | Success: {:.1}% | Partial: {} | Avg slippage: {:.2} bps | PnL: {:.2} | Sharpe: {:.2}",
            self.total_executions,
            self.success_rate * 100.0,
            self.partial_fills,
            self.avg_slippage * 10_000.0,
            self.total_pnl,
            self.sharpe_ratio,
        )
    }
}
