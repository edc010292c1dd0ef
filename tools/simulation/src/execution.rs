//! Simulated execution records
//!
//! One `SimulatedExecution` is produced per order, successful or not.
//! Failures are carried as data in `failure_reasons`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::errors::ExecutionFailure;
use types::ids::PlanId;
use types::market::MarketDataPoint;
use types::order::ExecutionOrder;

/// Market state observed at the moment of execution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub bid: f64,
    pub ask: f64,
    pub spread: f64,
    pub volume: f64,
}

impl From<&MarketDataPoint> for MarketSnapshot {
    fn from(point: &MarketDataPoint) -> Self {
        Self {
            bid: point.bid,
            ask: point.ask,
            spread: point.spread(),
            volume: point.volume,
        }
    }
}

/// Outcome of simulating a single order.
///
/// Invariants:
/// - `0 <= executed_quantity <= original_order.quantity`
/// - `!was_executed` implies zero price and quantity and at least one failure reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedExecution {
    pub plan_id: Option<PlanId>,
    pub original_order: ExecutionOrder,
    pub was_executed: bool,
    pub executed_price: f64,
    pub executed_quantity: f64,
    /// Unix nanos, or logical nanos in deterministic mode
    pub execution_timestamp: i64,
    pub execution_latency: Duration,
    pub slippage: f64,
    pub market_impact: f64,
    pub transaction_cost: f64,
    pub total_cost: f64,
    pub failure_reasons: Vec<ExecutionFailure>,
    pub market_snapshot: MarketSnapshot,
}

impl SimulatedExecution {
    /// Record for an order that did not execute.
    pub fn rejected(
        order: &ExecutionOrder,
        reason: ExecutionFailure,
        snapshot: MarketSnapshot,
        timestamp: i64,
        latency: Duration,
    ) -> Self {
        Self {
            plan_id: None,
            original_order: order.clone(),
            was_executed: false,
            executed_price: 0.0,
            executed_quantity: 0.0,
            execution_timestamp: timestamp,
            execution_latency: latency,
            slippage: 0.0,
            market_impact: 0.0,
            transaction_cost: 0.0,
            total_cost: 0.0,
            failure_reasons: vec![reason],
            market_snapshot: snapshot,
        }
    }

    /// Executed for less than the requested quantity.
    pub fn is_partial_fill(&self) -> bool {
        self.was_executed && self.executed_quantity < self.original_order.quantity
    }

    pub fn executed_notional(&self) -> f64 {
        self.executed_price * self.executed_quantity
    }

    pub fn latency_ms(&self) -> f64 {
        self.execution_latency.as_secs_f64() * 1000.0
    }

    /// Check the record's structural invariants.
    pub fn is_consistent(&self) -> bool {
        let qty_ok = self.executed_quantity >= 0.0
            && self.executed_quantity <= self.original_order.quantity.max(0.0);
        let failure_ok = self.was_executed
            || (self.executed_price == 0.0
                && self.executed_quantity == 0.0
                && !self.failure_reasons.is_empty());
        let fill_ok = self.executed_quantity == 0.0 || self.was_executed;
        qty_ok && failure_ok && fill_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::Side;

    fn order() -> ExecutionOrder {
        ExecutionOrder::new("BTC-USDT", "binance", Side::BUY, 2.0, 100.0)
    }

    #[test]
    fn test_rejected_record_shape() {
        let exec = SimulatedExecution::rejected(
            &order(),
            ExecutionFailure::SimulatedNetworkPartition,
            MarketSnapshot::default(),
            10,
            Duration::from_millis(5),
        );
        assert!(!exec.was_executed);
        assert_eq!(exec.executed_price, 0.0);
        assert_eq!(exec.executed_quantity, 0.0);
        assert_eq!(exec.failure_reasons.len(), 1);
        assert!(exec.is_consistent());
        assert!(!exec.is_partial_fill());
        assert_eq!(exec.latency_ms(), 5.0);
    }

    #[test]
    fn test_partial_fill_detection() {
        let mut exec = SimulatedExecution::rejected(
            &order(),
            ExecutionFailure::MarketConditionRejection,
            MarketSnapshot::default(),
            0,
            Duration::ZERO,
        );
        exec.was_executed = true;
        exec.failure_reasons.clear();
        exec.executed_price = 100.0;
        exec.executed_quantity = 1.0;
        assert!(exec.is_partial_fill());
        assert_eq!(exec.executed_notional(), 100.0);
        assert!(exec.is_consistent());

        exec.executed_quantity = 3.0;
        assert!(!exec.is_consistent());
    }

    #[test]
    fn test_snapshot_from_point() {
        let point = MarketDataPoint::new("BTC-USDT", "binance", 99.0, 101.0, 100.0, 42.0);
        let snap = MarketSnapshot::from(&point);
        assert_eq!(snap.spread, 2.0);
        assert_eq!(snap.volume, 42.0);
    }
}
