//! Backtest scenario
//!
//! Replays opportunities against historical snapshots with a seeded,
//! deterministic model. Two backtests with the same inputs and seed produce
//! identical execution outcomes.

use crate::error::SimulationError;
use crate::params::SimulationParameters;
use crate::planner::ExecutionPlanner;
use crate::scenarios::{execute, ScenarioReport};
use types::market::MarketDataPoint;
use types::opportunity::RankedOpportunity;

pub fn run(
    base: &SimulationParameters,
    planner: &dyn ExecutionPlanner,
    opportunities: &[RankedOpportunity],
    historical_data: &[MarketDataPoint],
) -> Result<ScenarioReport, SimulationError> {
    execute("backtest", base.for_backtest(), planner, opportunities, historical_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Mode;
    use crate::planner::LegPlanner;
    use crate::scenarios::fixtures::{markets, opportunities};

    fn base() -> SimulationParameters {
        SimulationParameters {
            order_pacing_ms: 0,
            random_seed: 1234,
            ..Default::default()
        }
    }

    #[test]
    fn test_backtest_is_deterministic() {
        let opps = opportunities(5);
        let a = run(&base(), &LegPlanner::default(), &opps, &markets()).unwrap();
        let b = run(&base(), &LegPlanner::default(), &opps, &markets()).unwrap();
        assert_eq!(a.mode, Mode::Backtesting);
        assert_eq!(a.metrics.successful_executions, b.metrics.successful_executions);
        assert_eq!(a.metrics.partial_fills, b.metrics.partial_fills);
        assert_eq!(a.metrics.avg_slippage, b.metrics.avg_slippage);
        assert_eq!(a.metrics.total_pnl, b.metrics.total_pnl);
    }

    #[test]
    fn test_backtest_without_history_fails_every_order() {
        let report = run(&base(), &LegPlanner::default(), &opportunities(2), &[]).unwrap();
        assert_eq!(report.metrics.total_executions, 4);
        assert_eq!(report.metrics.failed_executions, 4);
        assert_eq!(report.metrics.success_rate, 0.0);
    }
}
