//! Monte Carlo ensemble
//!
//! Runs `n` independent scenarios over the same opportunities, scenario `i`
//! seeded with `random_seed + i`. Scenarios execute in parallel batches of
//! scoped threads, one batch per available core, each scenario with its own
//! simulator. Output order matches scenario index.

use crate::error::SimulationError;
use crate::params::SimulationParameters;
use crate::planner::ExecutionPlanner;
use crate::scenarios::{execute, ScenarioReport};
use std::panic;
use std::thread;
use tracing::info;
use types::market::MarketDataPoint;
use types::opportunity::RankedOpportunity;

pub fn run(
    base: &SimulationParameters,
    planner: &dyn ExecutionPlanner,
    opportunities: &[RankedOpportunity],
    market_data: &[MarketDataPoint],
    num_simulations: usize,
) -> Result<Vec<ScenarioReport>, SimulationError> {
    let batch_size = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    info!(
        scenarios = num_simulations,
        base_seed = base.random_seed,
        batch_size,
        "Starting Monte Carlo ensemble"
    );

    let indices: Vec<u64> = (0..num_simulations as u64).collect();
    let mut reports = Vec::with_capacity(num_simulations);

    for batch in indices.chunks(batch_size) {
        let finished: Result<Vec<ScenarioReport>, SimulationError> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&index| {
                    let params = base.for_monte_carlo_scenario(index);
                    scope.spawn(move || {
                        execute("monte_carlo", params, planner, opportunities, market_data)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        });
        reports.extend(finished?);
    }

    Ok(reports)
}
