//! End-to-end scenario tests
//!
//! Plan lifecycle through a live worker, runner ensembles and the stress
//! regime compared against calm backtests.

use execution_sim::reports::{ensemble, slippage};
use execution_sim::{
    ExecutionSimulator, MarketConditions, Mode, ScenarioRunner, SimulationParameters,
};
use std::collections::HashSet;
use std::time::Duration;
use types::market::MarketDataPoint;
use types::opportunity::{ArbitrageOpportunity, OpportunityLeg, RankedOpportunity};
use types::order::{ExecutionOrder, Side};
use types::plan::{ExecutionPlan, PlanStatus};

fn base_params(seed: u64) -> SimulationParameters {
    SimulationParameters {
        random_seed: seed,
        order_pacing_ms: 0,
        completion_timeout_ms: 10_000,
        ..Default::default()
    }
}

fn markets() -> Vec<MarketDataPoint> {
    vec![
        MarketDataPoint::new("ETH-USDT", "binance", 2_999.0, 3_001.0, 3_000.0, 50_000.0),
        MarketDataPoint::new("ETH-USDT", "bybit", 3_008.0, 3_010.0, 3_009.0, 50_000.0),
    ]
}

fn opportunity(rank: usize) -> RankedOpportunity {
    let legs = vec![
        OpportunityLeg {
            symbol: "ETH-USDT".into(),
            exchange: "binance".into(),
            side: Side::BUY,
            quantity: 1.0,
            price: 3_001.0,
        },
        OpportunityLeg {
            symbol: "ETH-USDT".into(),
            exchange: "bybit".into(),
            side: Side::SELL,
            quantity: 1.0,
            price: 3_008.0,
        },
    ];
    RankedOpportunity::new(ArbitrageOpportunity::new(legs, 0.002, 0.85, 3_000.0), rank, 0.5)
}

fn opportunities(n: usize) -> Vec<RankedOpportunity> {
    (1..=n).map(opportunity).collect()
}

#[test]
fn test_single_plan_lifecycle() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let sim = ExecutionSimulator::new(base_params(11)).unwrap();
    sim.set_market_data_feed(markets());
    let plan = ExecutionPlan::new(
        None,
        vec![ExecutionOrder::new("ETH-USDT", "binance", Side::BUY, 1.0, 3_001.0)],
    );
    let plan_id = plan.plan_id;

    assert!(sim.submit(Some(plan)));
    assert_eq!(sim.plan(plan_id).unwrap().status, PlanStatus::Pending);

    sim.start();
    assert!(sim.wait_until_idle(Duration::from_secs(5)));
    sim.stop();

    assert_eq!(sim.execution_history().len(), 1);
    let plan = sim.plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Completed);
    let start = plan.actual_start_time.unwrap();
    assert!(plan.completion_time.unwrap() >= start);
}

#[test]
fn test_same_seed_simulators_agree() {
    let deterministic = SimulationParameters {
        deterministic: true,
        partial_fill_probability: 0.3,
        ..base_params(31)
    };
    let a = ExecutionSimulator::new(deterministic.clone()).unwrap();
    let b = ExecutionSimulator::new(deterministic).unwrap();

    let market = &markets()[0];
    for i in 0..20 {
        let side = if i % 2 == 0 { Side::BUY } else { Side::SELL };
        let order = ExecutionOrder::new("ETH-USDT", "binance", side, 0.5 + i as f64, 3_000.0);
        let x = a.simulate_order_execution(&order, market).unwrap();
        let y = b.simulate_order_execution(&order, market).unwrap();
        assert_eq!(x, y);
    }
}

#[test]
fn test_null_plan_submission() {
    let sim = ExecutionSimulator::new(base_params(12)).unwrap();
    assert!(!sim.submit(None));
    assert_eq!(sim.pending_plans(), 0);
    assert!(sim.execution_history().is_empty());
    assert_eq!(sim.current_metrics().total_executions, 0);
}

#[test]
fn test_backtest_reproducible() {
    let runner = ScenarioRunner::with_leg_planner(base_params(2024)).unwrap();
    let opps = opportunities(10);
    let a = runner.run_backtest(&opps, &markets()).unwrap();
    let b = runner.run_backtest(&opps, &markets()).unwrap();
    assert_eq!(a.total_executions, 20);
    assert_eq!(a.successful_executions, b.successful_executions);
    assert_eq!(a.avg_slippage, b.avg_slippage);
    assert_eq!(a.total_pnl, b.total_pnl);
}

#[test]
fn test_monte_carlo_count_and_diversity() {
    let mut runner = ScenarioRunner::with_leg_planner(base_params(500)).unwrap();
    runner.set_market_data_feed(markets());
    let ensemble_metrics = runner.run_monte_carlo_simulation(&opportunities(10), 8).unwrap();

    assert_eq!(ensemble_metrics.len(), 8);
    assert!(ensemble_metrics.iter().all(|m| m.total_executions == 20));

    let distinct: HashSet<u64> = ensemble_metrics
        .iter()
        .map(|m| m.avg_slippage.to_bits())
        .collect();
    assert!(distinct.len() > 1, "differently seeded scenarios should differ");

    let summary = ensemble::summarize(&ensemble_metrics);
    assert_eq!(summary.scenarios, 8);
    assert!(summary.mean_success_rate > 0.5);
    assert!(summary.pnl_p5 <= summary.pnl_p95);
}

#[test]
fn test_stress_lowers_success_rate_on_average() {
    let opps = opportunities(15);
    let trials = 6u64;
    let mut calm_total = 0.0;
    let mut stressed_total = 0.0;

    for trial in 0..trials {
        let mut runner = ScenarioRunner::with_leg_planner(SimulationParameters {
            deterministic: true,
            ..base_params(trial * 1_000)
        })
        .unwrap();
        runner.set_market_data_feed(markets());
        calm_total += runner.run_backtest(&opps, &markets()).unwrap().success_rate;
        stressed_total += runner
            .run_stress_test(&opps, &MarketConditions::default())
            .unwrap()
            .success_rate;
    }

    assert!(stressed_total / trials as f64 <= calm_total / trials as f64);
}

#[test]
fn test_stress_conditions_stack_on_runner_regime() {
    let mut params = base_params(9);
    params.market_conditions.flash_crash = true;
    let stressed = params.for_stress_test(&MarketConditions {
        exchange_outage: true,
        ..Default::default()
    });
    assert_eq!(stressed.mode, Mode::StressTesting);
    let mc = &stressed.market_conditions;
    assert!(mc.flash_crash && mc.exchange_outage);
    assert!(mc.high_volatility && mc.low_liquidity && mc.wide_spreads && mc.high_latency);
}

#[test]
fn test_slippage_report_over_backtest_history() {
    let sim = ExecutionSimulator::new(SimulationParameters {
        deterministic: true,
        ..base_params(77)
    })
    .unwrap();
    sim.set_market_data_feed(markets());
    for opp in opportunities(5) {
        let orders = opp
            .opportunity
            .legs
            .iter()
            .map(|l| ExecutionOrder::new(&l.symbol, &l.exchange, l.side, l.quantity, l.price))
            .collect();
        sim.submit(Some(ExecutionPlan::new(Some(opp.opportunity.opportunity_id), orders)));
    }
    sim.start();
    assert!(sim.wait_until_idle(Duration::from_secs(5)));
    sim.stop();

    let history = sim.execution_history();
    let report = slippage::analyze(&history);
    let executed = history.iter().filter(|e| e.was_executed).count();
    assert_eq!(report.total_orders_analyzed, executed);
    assert!(report.mean_slippage_bps >= 0.0);
    assert!(report.median_slippage_bps <= report.max_slippage_bps);
}

#[test]
fn test_validation_against_live_tracker() {
    let sim = ExecutionSimulator::new(base_params(3)).unwrap();
    let predicted: Vec<ArbitrageOpportunity> = Vec::new();
    let result = sim.validate_trading_logic(&predicted, &sim.execution_history());
    assert!(!result.is_accurate);
    assert_eq!(result.validation_issues.len(), 1);
}
