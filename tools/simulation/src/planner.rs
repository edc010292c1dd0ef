//! Execution planning
//!
//! Turns ranked opportunities into execution plans. Scenario runners only
//! depend on the `ExecutionPlanner` trait; `LegPlanner` is the built-in
//! one-order-per-leg planner.

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::opportunity::RankedOpportunity;
use types::order::ExecutionOrder;
use types::plan::ExecutionPlan;

pub trait ExecutionPlanner: Send + Sync {
    /// Build a plan, or `None` when the opportunity should not be traded.
    fn create_execution_plan(&self, opportunity: &RankedOpportunity) -> Option<ExecutionPlan>;
}

/// Configuration for the leg planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegPlannerConfig {
    /// Opportunities below this confidence are skipped
    pub min_confidence: f64,
    /// Multiplier applied to every leg quantity
    pub size_scale: f64,
}

impl Default for LegPlannerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            size_scale: 1.0,
        }
    }
}

/// One order per opportunity leg, in leg order.
#[derive(Debug, Clone, Default)]
pub struct LegPlanner {
    pub config: LegPlannerConfig,
}

impl LegPlanner {
    pub fn new(config: LegPlannerConfig) -> Self {
        Self { config }
    }
}

impl ExecutionPlanner for LegPlanner {
    fn create_execution_plan(&self, ranked: &RankedOpportunity) -> Option<ExecutionPlan> {
        let opp = &ranked.opportunity;
        if opp.legs.is_empty() || opp.confidence < self.config.min_confidence {
            debug!(
                opportunity_id = %opp.opportunity_id,
                legs = opp.legs.len(),
                confidence = opp.confidence,
                "Skipping opportunity"
            );
            return None;
        }

        let orders = opp
            .legs
            .iter()
            .filter(|leg| leg.quantity > 0.0)
            .map(|leg| {
                ExecutionOrder::new(
                    leg.symbol.as_str(),
                    leg.exchange.as_str(),
                    leg.side,
                    leg.quantity * self.config.size_scale,
                    leg.price,
                )
            })
            .collect::<Vec<_>>();

        if orders.is_empty() {
            return None;
        }
        Some(ExecutionPlan::new(Some(opp.opportunity_id), orders))
    }
}
