//! Arbitrage opportunities handed to the execution planner
//!
//! Produced by the opportunity detector; the simulator only reads them,
//! either to build plans or to compare predictions with realized results.

use crate::ids::OpportunityId;
use crate::order::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One leg of a synthetic arbitrage (e.g. buy spot on A, sell perp on B).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityLeg {
    pub symbol: String,
    pub exchange: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
}

/// A detected arbitrage opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub opportunity_id: OpportunityId,
    pub legs: Vec<OpportunityLeg>,
    /// Expected profit as a fraction of required capital (0.004 = 0.4%)
    pub expected_profit: f64,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    pub required_capital: f64,
    pub detected_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    pub fn new(legs: Vec<OpportunityLeg>, expected_profit: f64, confidence: f64, required_capital: f64) -> Self {
        Self {
            opportunity_id: OpportunityId::new(),
            legs,
            expected_profit,
            confidence: confidence.clamp(0.0, 1.0),
            required_capital,
            detected_at: Utc::now(),
        }
    }

    /// Confidence-weighted expected profit in quote currency
    pub fn weighted_expected_profit(&self) -> f64 {
        self.expected_profit * self.confidence * self.required_capital
    }
}

/// An opportunity after ranking by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOpportunity {
    pub opportunity: ArbitrageOpportunity,
    pub rank: usize,
    pub score: f64,
}

impl RankedOpportunity {
    pub fn new(opportunity: ArbitrageOpportunity, rank: usize, score: f64) -> Self {
        Self { opportunity, rank, score }
    }
}
