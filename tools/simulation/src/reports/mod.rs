//! Report modules for simulation output
//!
//! Slippage distribution over executed orders and Monte Carlo ensemble
//! summaries.

pub mod ensemble;
pub mod slippage;
