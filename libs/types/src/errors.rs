//! Error types shared across the simulator
//!
//! Comprehensive error taxonomy using thiserror

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a simulated order did not execute.
///
/// These are recorded on the execution as data and never raised; a
/// failing order does not abort its plan.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionFailure {
    #[error("No market data available for {symbol} on {exchange}")]
    NoMarketData { symbol: String, exchange: String },

    #[error("Simulated exchange outage on {exchange}")]
    SimulatedExchangeOutage { exchange: String },

    #[error("Simulated network partition")]
    SimulatedNetworkPartition,

    #[error("Order rejected due to market conditions")]
    MarketConditionRejection,
}

/// Plan lifecycle errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid state transition for plan {plan_id} from {from} to {to}")]
    InvalidStateTransition { plan_id: String, from: String, to: String },
}
