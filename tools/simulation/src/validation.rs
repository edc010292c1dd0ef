//! Trading-logic validation
//!
//! Scores how well the detector's predictions matched what the simulator
//! actually realized.

use crate::execution::SimulatedExecution;
use crate::tracker::PnlTracker;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use types::opportunity::ArbitrageOpportunity;

/// Accuracy below this marks the logic as inaccurate.
pub const MIN_PREDICTION_ACCURACY: f64 = 0.5;
/// Relative profit error above this marks the logic as inaccurate.
pub const MAX_PROFIT_PREDICTION_ERROR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_accurate: bool,
    pub prediction_accuracy: f64,
    pub profit_prediction_error: f64,
    pub predicted_success_rate: f64,
    pub actual_success_rate: f64,
    pub validation_issues: Vec<String>,
}

/// Compare predicted opportunities with realized executions.
pub fn validate_trading_logic(
    predicted: &[ArbitrageOpportunity],
    actual: &[SimulatedExecution],
    tracker: &dyn PnlTracker,
) -> ValidationResult {
    if predicted.is_empty() || actual.is_empty() {
        warn!(
            predicted = predicted.len(),
            actual = actual.len(),
            "Cannot validate trading logic without predictions and executions"
        );
        return ValidationResult {
            validation_issues: vec!["Insufficient data for validation".to_string()],
            ..Default::default()
        };
    }

    let predicted_success_rate =
        predicted.iter().map(|o| o.confidence).sum::<f64>() / predicted.len() as f64;

    let executed: Vec<&SimulatedExecution> = actual.iter().filter(|e| e.was_executed).collect();
    let profitable = executed
        .iter()
        .filter(|e| realized_profit(e, tracker) > 0.0)
        .count();
    let actual_success_rate = if executed.is_empty() {
        0.0
    } else {
        profitable as f64 / executed.len() as f64
    };

    let prediction_accuracy = (1.0 - (predicted_success_rate - actual_success_rate).abs()).clamp(0.0, 1.0);

    let predicted_profit: f64 = predicted.iter().map(|o| o.weighted_expected_profit()).sum();
    let realized_pnl = tracker.current_snapshot().total_pnl;
    let profit_prediction_error = if predicted_profit != 0.0 {
        (predicted_profit - realized_pnl).abs() / predicted_profit.abs()
    } else if realized_pnl == 0.0 {
        0.0
    } else {
        1.0
    };

    let mut issues = Vec::new();
    if prediction_accuracy < MIN_PREDICTION_ACCURACY {
        issues.push(format!(
            "Low prediction accuracy: {:.1}% (predicted success {:.1}%, actual {:.1}%)",
            prediction_accuracy * 100.0,
            predicted_success_rate * 100.0,
            actual_success_rate * 100.0,
        ));
    }
    if profit_prediction_error > MAX_PROFIT_PREDICTION_ERROR {
        issues.push(format!(
            "High profit prediction error: {:.1}% (predicted {:.2}, realized {:.2})",
            profit_prediction_error * 100.0,
            predicted_profit,
            realized_pnl,
        ));
    }

    let result = ValidationResult {
        is_accurate: issues.is_empty(),
        prediction_accuracy,
        profit_prediction_error,
        predicted_success_rate,
        actual_success_rate,
        validation_issues: issues,
    };

    info!(
        accurate = result.is_accurate,
        accuracy = result.prediction_accuracy,
        profit_error = result.profit_prediction_error,
        "Trading logic validated"
    );
    result
}

/// Profit of an executed trade against the tracker's current price,
/// falling back to the mid observed at execution.
fn realized_profit(exec: &SimulatedExecution, tracker: &dyn PnlTracker) -> f64 {
    let order = &exec.original_order;
    let snap = &exec.market_snapshot;
    let market = tracker
        .market_price(&order.symbol, &order.exchange)
        .unwrap_or((snap.bid + snap.ask) / 2.0);
    (market - exec.executed_price) * order.side.sign() * exec.executed_quantity
}
