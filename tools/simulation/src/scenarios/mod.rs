//! Scenario runners
//!
//! Each scenario owns a fresh `ExecutionSimulator` for its lifetime, feeds it
//! market data, turns ranked opportunities into plans and waits for the
//! worker to drain them.

pub mod backtest;
pub mod monte_carlo;
pub mod stress;

use crate::error::SimulationError;
use crate::metrics::SimulationMetrics;
use crate::params::{MarketConditions, Mode, SimulationParameters};
use crate::planner::{ExecutionPlanner, LegPlanner};
use crate::simulator::ExecutionSimulator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use types::market::MarketDataPoint;
use types::opportunity::RankedOpportunity;

/// Result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub mode: Mode,
    pub seed: u64,
    pub plans_submitted: usize,
    pub opportunities_skipped: usize,
    /// False when the completion timeout fired before the queue drained
    pub drained: bool,
    pub elapsed_ms: u64,
    pub metrics: SimulationMetrics,
}

/// Runs backtests, Monte Carlo ensembles and stress tests against one
/// base configuration.
pub struct ScenarioRunner {
    params: SimulationParameters,
    planner: Arc<dyn ExecutionPlanner>,
    market_data: Vec<MarketDataPoint>,
}

impl ScenarioRunner {
    pub fn new(
        params: SimulationParameters,
        planner: Arc<dyn ExecutionPlanner>,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            params,
            planner,
            market_data: Vec::new(),
        })
    }

    /// Runner using the one-order-per-leg planner.
    pub fn with_leg_planner(params: SimulationParameters) -> Result<Self, SimulationError> {
        Self::new(params, Arc::new(LegPlanner::default()))
    }

    /// Snapshot used by Monte Carlo and stress runs.
    pub fn set_market_data_feed(&mut self, data: Vec<MarketDataPoint>) {
        self.market_data = data;
    }

    pub fn run_backtest(
        &self,
        opportunities: &[RankedOpportunity],
        historical_data: &[MarketDataPoint],
    ) -> Result<SimulationMetrics, SimulationError> {
        backtest::run(&self.params, self.planner.as_ref(), opportunities, historical_data)
            .map(|report| report.metrics)
    }

    /// One metrics entry per scenario; entry `i` ran with seed `random_seed + i`.
    pub fn run_monte_carlo_simulation(
        &self,
        opportunities: &[RankedOpportunity],
        num_simulations: usize,
    ) -> Result<Vec<SimulationMetrics>, SimulationError> {
        let reports = monte_carlo::run(
            &self.params,
            self.planner.as_ref(),
            opportunities,
            &self.market_data,
            num_simulations,
        )?;
        Ok(reports.into_iter().map(|report| report.metrics).collect())
    }

    pub fn run_stress_test(
        &self,
        opportunities: &[RankedOpportunity],
        conditions: &MarketConditions,
    ) -> Result<SimulationMetrics, SimulationError> {
        stress::run(
            &self.params,
            self.planner.as_ref(),
            opportunities,
            &self.market_data,
            conditions,
        )
        .map(|report| report.metrics)
    }
}

/// Drive one simulator through a full scenario.
pub(crate) fn execute(
    name: &str,
    params: SimulationParameters,
    planner: &dyn ExecutionPlanner,
    opportunities: &[RankedOpportunity],
    market_data: &[MarketDataPoint],
) -> Result<ScenarioReport, SimulationError> {
    let started = Instant::now();
    let mode = params.mode;
    let seed = params.random_seed;
    let timeout = params.completion_timeout();

    let simulator = ExecutionSimulator::new(params)?;
    simulator.set_market_data_feed(market_data.to_vec());

    let mut plans_submitted = 0;
    let mut opportunities_skipped = 0;
    for opportunity in opportunities {
        let queued = match planner.create_execution_plan(opportunity) {
            Some(plan) => simulator.submit(Some(plan)),
            None => false,
        };
        if queued {
            plans_submitted += 1;
        } else {
            opportunities_skipped += 1;
        }
    }

    simulator.start();
    let drained = simulator.wait_until_idle(timeout);
    simulator.stop();

    if !drained {
        warn!(
            scenario = name,
            pending = simulator.pending_plans(),
            timeout_ms = timeout.as_millis() as u64,
            "Scenario timed out before the queue drained; reporting partial metrics"
        );
    }

    let metrics = simulator.current_metrics();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        scenario = name,
        %mode,
        seed,
        plans_submitted,
        opportunities_skipped,
        success_rate = metrics.success_rate,
        total_pnl = metrics.total_pnl,
        elapsed_ms,
        "Scenario finished"
    );

    Ok(ScenarioReport {
        name: name.to_string(),
        mode,
        seed,
        plans_submitted,
        opportunities_skipped,
        drained,
        elapsed_ms,
        metrics,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use types::market::MarketDataPoint;
    use types::opportunity::{ArbitrageOpportunity, OpportunityLeg, RankedOpportunity};
    use types::order::Side;

    pub fn markets() -> Vec<MarketDataPoint> {
        vec![
            MarketDataPoint::new("BTC-USDT", "binance", 49_990.0, 50_010.0, 50_000.0, 5_000.0),
            MarketDataPoint::new("BTC-USDT", "kraken", 50_090.0, 50_110.0, 50_100.0, 5_000.0),
        ]
    }

    pub fn opportunities(n: usize) -> Vec<RankedOpportunity> {
        (0..n)
            .map(|i| {
                let legs = vec![
                    OpportunityLeg {
                        symbol: "BTC-USDT".into(),
                        exchange: "binance".into(),
                        side: Side::BUY,
                        quantity: 0.1,
                        price: 50_010.0,
                    },
                    OpportunityLeg {
                        symbol: "BTC-USDT".into(),
                        exchange: "kraken".into(),
                        side: Side::SELL,
                        quantity: 0.1,
                        price: 50_090.0,
                    },
                ];
                let opp = ArbitrageOpportunity::new(legs, 0.0016, 0.8, 5_000.0);
                RankedOpportunity::new(opp, i + 1, 1.0)
            })
            .collect()
    }
}
