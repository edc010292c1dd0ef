//! Order types consumed by the execution simulator

use crate::ids::OrderId;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (lifts the ask)
    BUY,
    /// Sell order (hits the bid)
    SELL,
}

impl Side {
    /// +1 for buys, -1 for sells
    pub fn sign(&self) -> f64 {
        match self {
            Side::BUY => 1.0,
            Side::SELL => -1.0,
        }
    }
}

/// A single executable leg of an execution plan.
///
/// Produced by the execution planner; the simulator only ever reads it
/// and copies it into the resulting execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOrder {
    pub order_id: OrderId,
    pub symbol: String,
    pub exchange: String,
    pub side: Side,
    pub quantity: f64,
    pub target_price: f64,
}

impl ExecutionOrder {
    pub fn new(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        side: Side,
        quantity: f64,
        target_price: f64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            symbol: symbol.into(),
            exchange: exchange.into(),
            side,
            quantity,
            target_price,
        }
    }

    /// Notional value at the target price
    pub fn notional(&self) -> f64 {
        self.quantity * self.target_price
    }
}
