//! Stress scenario
//!
//! Layers caller-supplied conditions on the runner's regime, then amplifies
//! volatility, spreads and latency, halves liquidity and switches on the
//! high-volatility, low-liquidity, wide-spread and high-latency flags.

use crate::error::SimulationError;
use crate::params::{MarketConditions, SimulationParameters};
use crate::planner::ExecutionPlanner;
use crate::scenarios::{execute, ScenarioReport};
use tracing::debug;
use types::market::MarketDataPoint;
use types::opportunity::RankedOpportunity;

pub fn run(
    base: &SimulationParameters,
    planner: &dyn ExecutionPlanner,
    opportunities: &[RankedOpportunity],
    market_data: &[MarketDataPoint],
    conditions: &MarketConditions,
) -> Result<ScenarioReport, SimulationError> {
    let params = base.for_stress_test(conditions);
    debug!(conditions = ?params.market_conditions, "Stress conditions");
    execute("stress_test", params, planner, opportunities, market_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Mode;
    use crate::planner::LegPlanner;
    use crate::scenarios::fixtures::{markets, opportunities};

    #[test]
    fn test_stress_degrades_fills() {
        let base = SimulationParameters {
            order_pacing_ms: 0,
            deterministic: true,
            random_seed: 5,
            ..Default::default()
        };
        let opps = opportunities(40);
        let calm = crate::scenarios::backtest::run(&base, &LegPlanner::default(), &opps, &markets()).unwrap();
        let stressed =
            run(&base, &LegPlanner::default(), &opps, &markets(), &MarketConditions::default()).unwrap();

        assert_eq!(stressed.mode, Mode::StressTesting);
        assert_eq!(stressed.metrics.total_executions, 80);
        assert!(stressed.metrics.success_rate < calm.metrics.success_rate);
        assert!(stressed.metrics.avg_latency_ms > calm.metrics.avg_latency_ms);
    }
}
