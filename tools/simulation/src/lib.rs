//! Execution Simulation Engine
//!
//! Simulates how arbitrage execution plans would play out on real venues
//! without touching them: stochastic slippage, market impact, latency,
//! partial fills and venue failures, under configurable market regimes.
//! Used for paper trading, deterministic backtests, Monte Carlo ensembles
//! and adversarial stress tests.
//!
//! # Modules
//! - `params`: Simulation modes, market conditions and parameters
//! - `models`: Seeded stochastic execution model
//! - `execution`: Per-order simulation results
//! - `simulator`: Plan queue with a single worker thread
//! - `tracker`: P&L tracking seam and the default ledger
//! - `planner`: Opportunity to execution plan conversion
//! - `scenarios`: Backtest, Monte Carlo and stress runners
//! - `metrics`: Aggregate execution metrics
//! - `validation`: Predicted vs realized comparison
//! - `reports`: Slippage and ensemble reports
//! - `export`: JSON export of scenario results

pub mod error;
pub mod execution;
pub mod export;
pub mod metrics;
pub mod models;
pub mod params;
pub mod planner;
pub mod reports;
pub mod scenarios;
pub mod simulator;
pub mod stats;
pub mod tracker;
pub mod validation;

pub use error::SimulationError;
pub use execution::{MarketSnapshot, SimulatedExecution};
pub use metrics::SimulationMetrics;
pub use params::{MarketConditions, Mode, SimulationParameters};
pub use planner::{ExecutionPlanner, LegPlanner, LegPlannerConfig};
pub use scenarios::{ScenarioReport, ScenarioRunner};
pub use simulator::ExecutionSimulator;
pub use tracker::{PnlLedger, PnlSnapshot, PnlTracker};
pub use validation::ValidationResult;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
