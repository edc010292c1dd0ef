//! Simulation parameters
//!
//! Parameters are immutable for the lifetime of a simulator instance.
//! Scenario runners derive their own variants by cloning a base
//! configuration and adjusting it (`for_backtest`, `for_monte_carlo_scenario`,
//! `for_stress_test`).

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Latency multiplier applied on top of the configured conditions in stress runs.
const STRESS_LATENCY_MULTIPLIER: f64 = 2.0;

/// Simulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    PaperTrading,
    Backtesting,
    StressTesting,
    MonteCarlo,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::PaperTrading => "paper_trading",
            Mode::Backtesting => "backtesting",
            Mode::StressTesting => "stress_testing",
            Mode::MonteCarlo => "monte_carlo",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Modeled market regime.
///
/// Multipliers scale the base model coefficients; flags switch on
/// discrete adverse behavior. Several flags may be active at once and
/// their effects compose multiplicatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConditions {
    pub volatility_multiplier: f64,
    pub liquidity_multiplier: f64,
    pub spread_multiplier: f64,
    pub latency_multiplier: f64,
    pub high_volatility: bool,
    pub low_liquidity: bool,
    pub wide_spreads: bool,
    pub high_latency: bool,
    pub flash_crash: bool,
    pub exchange_outage: bool,
    pub network_partition: bool,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            volatility_multiplier: 1.0,
            liquidity_multiplier: 1.0,
            spread_multiplier: 1.0,
            latency_multiplier: 1.0,
            high_volatility: false,
            low_liquidity: false,
            wide_spreads: false,
            high_latency: false,
            flash_crash: false,
            exchange_outage: false,
            network_partition: false,
        }
    }
}

impl MarketConditions {
    /// Layer `other` on top of `self`: multipliers multiply, flags OR.
    pub fn combine(&self, other: &MarketConditions) -> Self {
        Self {
            volatility_multiplier: self.volatility_multiplier * other.volatility_multiplier,
            liquidity_multiplier: self.liquidity_multiplier * other.liquidity_multiplier,
            spread_multiplier: self.spread_multiplier * other.spread_multiplier,
            latency_multiplier: self.latency_multiplier * other.latency_multiplier,
            high_volatility: self.high_volatility || other.high_volatility,
            low_liquidity: self.low_liquidity || other.low_liquidity,
            wide_spreads: self.wide_spreads || other.wide_spreads,
            high_latency: self.high_latency || other.high_latency,
            flash_crash: self.flash_crash || other.flash_crash,
            exchange_outage: self.exchange_outage || other.exchange_outage,
            network_partition: self.network_partition || other.network_partition,
        }
    }

    /// Set the four basic stress flags.
    pub fn with_basic_stress_flags(mut self) -> Self {
        self.high_volatility = true;
        self.low_liquidity = true;
        self.wide_spreads = true;
        self.high_latency = true;
        self
    }
}

/// Full configuration of one simulator instance.
///
/// Deserializes from partial JSON: missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub mode: Mode,
    pub market_conditions: MarketConditions,
    /// Base slippage as a fraction of price
    pub base_slippage: f64,
    pub base_latency_ms: f64,
    /// Fee charged on executed notional
    pub base_fee_rate: f64,
    pub market_impact_coefficient: f64,
    /// Notional depth that moves the price by one impact coefficient
    pub liquidity_depth_factor: f64,
    pub execution_success_rate: f64,
    pub partial_fill_probability: f64,
    pub stress_volatility_multiplier: f64,
    pub stress_liquidity_reduction: f64,
    pub stress_spread_widening: f64,
    pub random_seed: u64,
    pub deterministic: bool,
    /// Sleep between consecutive orders of a plan
    pub order_pacing_ms: u64,
    /// Upper bound a scenario runner waits for its simulator to drain
    pub completion_timeout_ms: u64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mode: Mode::PaperTrading,
            market_conditions: MarketConditions::default(),
            base_slippage: 0.0005,
            base_latency_ms: 50.0,
            base_fee_rate: 0.001,
            market_impact_coefficient: 0.1,
            liquidity_depth_factor: 1_000_000.0,
            execution_success_rate: 0.95,
            partial_fill_probability: 0.1,
            stress_volatility_multiplier: 3.0,
            stress_liquidity_reduction: 0.5,
            stress_spread_widening: 2.0,
            random_seed: 42,
            deterministic: false,
            order_pacing_ms: 10,
            completion_timeout_ms: 30_000,
        }
    }
}

impl SimulationParameters {
    /// Parse and validate parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Check ranges of probabilities, coefficients and multipliers.
    pub fn validate(&self) -> Result<(), SimulationError> {
        check_unit("execution_success_rate", self.execution_success_rate)?;
        check_unit("partial_fill_probability", self.partial_fill_probability)?;
        check_non_negative("base_slippage", self.base_slippage)?;
        check_non_negative("base_latency_ms", self.base_latency_ms)?;
        check_non_negative("base_fee_rate", self.base_fee_rate)?;
        check_non_negative("market_impact_coefficient", self.market_impact_coefficient)?;
        check_positive("liquidity_depth_factor", self.liquidity_depth_factor)?;
        check_positive("stress_volatility_multiplier", self.stress_volatility_multiplier)?;
        check_positive("stress_liquidity_reduction", self.stress_liquidity_reduction)?;
        check_positive("stress_spread_widening", self.stress_spread_widening)?;

        let mc = &self.market_conditions;
        check_non_negative("volatility_multiplier", mc.volatility_multiplier)?;
        check_positive("liquidity_multiplier", mc.liquidity_multiplier)?;
        check_non_negative("spread_multiplier", mc.spread_multiplier)?;
        check_non_negative("latency_multiplier", mc.latency_multiplier)?;
        Ok(())
    }

    pub fn order_pacing(&self) -> Duration {
        Duration::from_millis(self.order_pacing_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    /// Deterministic replay configuration.
    pub fn for_backtest(&self) -> Self {
        Self {
            mode: Mode::Backtesting,
            deterministic: true,
            ..self.clone()
        }
    }

    /// Configuration of Monte Carlo scenario `index`: seed `random_seed + index`.
    pub fn for_monte_carlo_scenario(&self, index: u64) -> Self {
        Self {
            mode: Mode::MonteCarlo,
            deterministic: true,
            random_seed: self.random_seed.wrapping_add(index),
            ..self.clone()
        }
    }

    /// Adverse configuration: `conditions` layered on the current regime,
    /// then amplified by the stress multipliers with the basic flags set.
    pub fn for_stress_test(&self, conditions: &MarketConditions) -> Self {
        let mut mc = self.market_conditions.combine(conditions);
        mc.volatility_multiplier *= self.stress_volatility_multiplier;
        mc.liquidity_multiplier *= self.stress_liquidity_reduction;
        mc.spread_multiplier *= self.stress_spread_widening;
        mc.latency_multiplier *= STRESS_LATENCY_MULTIPLIER;

        Self {
            mode: Mode::StressTesting,
            market_conditions: mc.with_basic_stress_flags(),
            ..self.clone()
        }
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameters {
            name,
            reason: format!("must be within [0, 1], got {}", value),
        })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameters {
            name,
            reason: format!("must be finite and non-negative, got {}", value),
        })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameters {
            name,
            reason: format!("must be finite and positive, got {}", value),
        })
    }
}
