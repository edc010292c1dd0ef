//! Stochastic market models
//!
//! Slippage, market impact, latency, partial fills and venue failures.
//! The deterministic parts are free functions over the parameters and the
//! market snapshot; the random draws happen inside `MarketModel`, which owns
//! the simulator's only RNG.
//!
//! Draw order per order is fixed (latency, outage, partition, success,
//! slippage, partial fill) so that a seeded model replays bit-for-bit.

use crate::execution::{MarketSnapshot, SimulatedExecution};
use crate::params::SimulationParameters;
use chrono::Utc;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::time::Duration;
use types::errors::ExecutionFailure;
use types::market::MarketDataPoint;
use types::order::{ExecutionOrder, Side};

/// Probability of a simulated venue outage while the flag is set.
pub const EXCHANGE_OUTAGE_PROBABILITY: f64 = 0.05;
/// Probability of a simulated network partition while the flag is set.
pub const NETWORK_PARTITION_PROBABILITY: f64 = 0.03;
/// Maximum market impact (1%).
pub const MAX_MARKET_IMPACT: f64 = 0.01;
/// Floor on simulated latency.
pub const MIN_LATENCY_MS: f64 = 5.0;
/// Ceiling on simulated latency (one hour).
pub const MAX_LATENCY_MS: f64 = 3_600_000.0;

const HIGH_VOLATILITY_SUCCESS_FACTOR: f64 = 0.9;
const LOW_LIQUIDITY_SUCCESS_FACTOR: f64 = 0.8;
const FLASH_CRASH_SUCCESS_FACTOR: f64 = 0.7;
/// Orders above this share of traded notional lose success probability.
const LARGE_ORDER_RATIO: f64 = 0.1;
const SIZE_SLIPPAGE_SCALE: f64 = 0.1;
const MAX_SIZE_SLIPPAGE: f64 = 0.001;
const NOISE_SLIPPAGE: f64 = 0.0005;
const FLASH_CRASH_SLIPPAGE: f64 = 0.005;
const LATENCY_JITTER: f64 = 0.2;
const PARTIAL_FILL_MIN: f64 = 0.1;
const PARTIAL_FILL_MAX: f64 = 0.9;

/// Price the order is expected to trade at: the target, or the touch when
/// the planner left no target.
pub fn reference_price(order: &ExecutionOrder, market: &MarketDataPoint) -> f64 {
    if order.target_price > 0.0 {
        return order.target_price;
    }
    match order.side {
        Side::BUY => market.ask,
        Side::SELL => market.bid,
    }
}

pub fn order_value(order: &ExecutionOrder, market: &MarketDataPoint) -> f64 {
    order.quantity.max(0.0) * reference_price(order, market)
}

/// Order value relative to traded notional. Zero when volume is unknown.
pub fn size_ratio(order: &ExecutionOrder, market: &MarketDataPoint) -> f64 {
    let notional = market.notional_volume();
    if notional > 0.0 {
        order_value(order, market) / notional
    } else {
        0.0
    }
}

/// Probability that the order clears the market-condition check.
pub fn success_probability(
    params: &SimulationParameters,
    order: &ExecutionOrder,
    market: &MarketDataPoint,
) -> f64 {
    let mc = &params.market_conditions;
    let mut p = params.execution_success_rate;

    if mc.high_volatility {
        p *= HIGH_VOLATILITY_SUCCESS_FACTOR;
    }
    if mc.low_liquidity {
        p *= LOW_LIQUIDITY_SUCCESS_FACTOR;
    }
    if mc.flash_crash {
        p *= FLASH_CRASH_SUCCESS_FACTOR;
    }

    let ratio = size_ratio(order, market);
    if ratio > LARGE_ORDER_RATIO {
        p *= (1.0 - ratio).max(0.0);
    }

    p.clamp(0.0, 1.0)
}

/// Slippage before the random noise term.
pub fn base_slippage(
    params: &SimulationParameters,
    order: &ExecutionOrder,
    market: &MarketDataPoint,
) -> f64 {
    let mc = &params.market_conditions;
    let volatility = params.base_slippage * mc.volatility_multiplier;
    let spread = market.spread_pct() * mc.spread_multiplier;
    let size = (size_ratio(order, market) * SIZE_SLIPPAGE_SCALE).min(MAX_SIZE_SLIPPAGE);
    (volatility + spread + size).max(0.0)
}

/// Impact of the order's own flow, capped at `MAX_MARKET_IMPACT`.
pub fn market_impact(params: &SimulationParameters, order: &ExecutionOrder) -> f64 {
    let liquidity = params.market_conditions.liquidity_multiplier;
    if liquidity <= 0.0 || params.liquidity_depth_factor <= 0.0 {
        return MAX_MARKET_IMPACT;
    }
    let value = if order.quantity > 0.0 && order.target_price > 0.0 {
        order.notional()
    } else {
        0.0
    };
    let impact = (params.market_impact_coefficient / liquidity) * (value / params.liquidity_depth_factor);
    impact.clamp(0.0, MAX_MARKET_IMPACT)
}

/// Latency for a standard-normal draw `z`.
pub fn latency_ms(params: &SimulationParameters, z: f64) -> f64 {
    let scaled = params.base_latency_ms
        * params.market_conditions.latency_multiplier
        * (1.0 + z * LATENCY_JITTER);
    scaled.max(MIN_LATENCY_MS).min(MAX_LATENCY_MS)
}

/// Seeded stochastic execution model.
///
/// Owns the RNG; whoever holds the model by value is the only thread that
/// can draw from it.
pub struct MarketModel {
    params: SimulationParameters,
    rng: ChaCha8Rng,
    /// Logical clock for deterministic runs (nanos)
    clock_ns: i64,
}

impl MarketModel {
    /// Seed from `random_seed` when deterministic, from OS entropy otherwise.
    pub fn new(params: SimulationParameters) -> Self {
        let seed = if params.deterministic {
            params.random_seed
        } else {
            rand::random()
        };
        Self {
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock_ns: 0,
        }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Simulate one order against the snapshot for its market, if any.
    pub fn simulate(
        &mut self,
        order: &ExecutionOrder,
        market: Option<&MarketDataPoint>,
    ) -> SimulatedExecution {
        let latency = self.latency();
        let timestamp = self.advance_clock(latency);

        let market = match market {
            Some(m) => m,
            None => {
                return SimulatedExecution::rejected(
                    order,
                    ExecutionFailure::NoMarketData {
                        symbol: order.symbol.clone(),
                        exchange: order.exchange.clone(),
                    },
                    MarketSnapshot::default(),
                    timestamp,
                    latency,
                );
            }
        };
        let snapshot = MarketSnapshot::from(market);

        if let Some(reason) = self.venue_failure(order) {
            return SimulatedExecution::rejected(order, reason, snapshot, timestamp, latency);
        }

        if !self.should_succeed(order, market) {
            return SimulatedExecution::rejected(
                order,
                ExecutionFailure::MarketConditionRejection,
                snapshot,
                timestamp,
                latency,
            );
        }

        let slippage = self.slippage(order, market);
        let impact = market_impact(&self.params, order);
        let quantity = self.fill_quantity(order);

        let reference = reference_price(order, market);
        let executed_price = match order.side {
            Side::BUY => reference * (1.0 + slippage),
            Side::SELL => reference * (1.0 - slippage).max(0.0),
        };

        let notional = executed_price * quantity;
        let transaction_cost = notional * self.params.base_fee_rate;
        let total_cost = notional * (1.0 + impact) + transaction_cost;

        SimulatedExecution {
            plan_id: None,
            original_order: order.clone(),
            was_executed: true,
            executed_price,
            executed_quantity: quantity,
            execution_timestamp: timestamp,
            execution_latency: latency,
            slippage,
            market_impact: impact,
            transaction_cost,
            total_cost,
            failure_reasons: Vec::new(),
            market_snapshot: snapshot,
        }
    }

    /// Outage and partition are independent Bernoulli events, drawn only
    /// while their flag is set.
    fn venue_failure(&mut self, order: &ExecutionOrder) -> Option<ExecutionFailure> {
        let outage = self.params.market_conditions.exchange_outage
            && self.uniform() < EXCHANGE_OUTAGE_PROBABILITY;
        let partition = self.params.market_conditions.network_partition
            && self.uniform() < NETWORK_PARTITION_PROBABILITY;

        if outage {
            Some(ExecutionFailure::SimulatedExchangeOutage {
                exchange: order.exchange.clone(),
            })
        } else if partition {
            Some(ExecutionFailure::SimulatedNetworkPartition)
        } else {
            None
        }
    }

    fn should_succeed(&mut self, order: &ExecutionOrder, market: &MarketDataPoint) -> bool {
        let p = success_probability(&self.params, order, market);
        self.uniform() < p
    }

    fn slippage(&mut self, order: &ExecutionOrder, market: &MarketDataPoint) -> f64 {
        let mut slippage = base_slippage(&self.params, order, market);
        slippage += self.standard_normal().abs() * NOISE_SLIPPAGE;
        if self.params.market_conditions.flash_crash {
            slippage += self.standard_normal().abs() * FLASH_CRASH_SLIPPAGE;
        }
        slippage
    }

    fn fill_quantity(&mut self, order: &ExecutionOrder) -> f64 {
        let quantity = order.quantity.max(0.0);
        if self.uniform() < self.params.partial_fill_probability {
            quantity * self.rng.gen_range(PARTIAL_FILL_MIN..PARTIAL_FILL_MAX)
        } else {
            quantity
        }
    }

    fn latency(&mut self) -> Duration {
        let z = self.standard_normal();
        Duration::from_secs_f64(latency_ms(&self.params, z) / 1000.0)
    }

    fn advance_clock(&mut self, latency: Duration) -> i64 {
        if self.params.deterministic {
            let nanos = i64::try_from(latency.as_nanos()).unwrap_or(i64::MAX);
            self.clock_ns = self.clock_ns.saturating_add(nanos);
            self.clock_ns
        } else {
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        }
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}
