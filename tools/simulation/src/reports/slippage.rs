//! Slippage report
//!
//! Slippage of executed orders against their reference price (the target,
//! or the touch when no target was set), in basis points.
//! Provides aggregated statistics (mean, p50, p99) overall and per side.

use crate::execution::SimulatedExecution;
use crate::stats;
use serde::{Deserialize, Serialize};
use types::order::Side;

const BPS: f64 = 10_000.0;

/// Slippage record for a single executed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlippageRecord {
    pub order_id: String,
    pub side: Side,
    pub reference_price: f64,
    pub executed_price: f64,
    pub slippage_bps: f64,
    pub quantity: f64,
}

/// Aggregated slippage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlippageReport {
    pub records: Vec<SlippageRecord>,
    pub mean_slippage_bps: f64,
    pub median_slippage_bps: f64,
    pub p99_slippage_bps: f64,
    pub max_slippage_bps: f64,
    pub buy_mean_slippage_bps: f64,
    pub sell_mean_slippage_bps: f64,
    pub total_orders_analyzed: usize,
}

/// Generate a slippage report from an execution history.
///
/// Failed executions carry no slippage and are skipped.
pub fn analyze(executions: &[SimulatedExecution]) -> SlippageReport {
    let records: Vec<SlippageRecord> = executions
        .iter()
        .filter(|e| e.was_executed)
        .map(|e| {
            let order = &e.original_order;
            let reference_price = if order.target_price > 0.0 {
                order.target_price
            } else {
                match order.side {
                    Side::BUY => e.market_snapshot.ask,
                    Side::SELL => e.market_snapshot.bid,
                }
            };
            SlippageRecord {
                order_id: e.original_order.order_id.to_string(),
                side: e.original_order.side,
                reference_price,
                executed_price: e.executed_price,
                slippage_bps: e.slippage * BPS,
                quantity: e.executed_quantity,
            }
        })
        .collect();

    let all: Vec<f64> = records.iter().map(|r| r.slippage_bps).collect();
    let sorted = stats::sorted(&all);
    let side_mean = |side: Side| {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| r.side == side)
            .map(|r| r.slippage_bps)
            .collect();
        stats::mean(&values).unwrap_or(0.0)
    };

    SlippageReport {
        mean_slippage_bps: stats::mean(&all).unwrap_or(0.0),
        median_slippage_bps: stats::percentile(&sorted, 0.50).unwrap_or(0.0),
        p99_slippage_bps: stats::percentile(&sorted, 0.99).unwrap_or(0.0),
        max_slippage_bps: sorted.last().copied().unwrap_or(0.0),
        buy_mean_slippage_bps: side_mean(Side::BUY),
        sell_mean_slippage_bps: side_mean(Side::SELL),
        total_orders_analyzed: records.len(),
        records,
    }
}
