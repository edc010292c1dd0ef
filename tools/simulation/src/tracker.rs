//! P&L tracking
//!
//! The simulator feeds every successful execution into a `PnlTracker` it
//! owns exclusively. `PnlLedger` is the default implementation: net
//! positions per (symbol, exchange) with average-cost accounting in
//! fixed-point `Decimal`, marked to the latest market price.

use crate::stats;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use types::market::MarketKey;
use types::order::{ExecutionOrder, Side};

/// Point-in-time performance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PnlSnapshot {
    pub total_pnl: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub var_95: f64,
    pub trade_count: usize,
}

/// Collaborator that turns fills into P&L.
pub trait PnlTracker: Send {
    fn record_trade(&mut self, order: &ExecutionOrder, executed_price: f64, executed_quantity: f64);

    fn update_market_price(&mut self, symbol: &str, exchange: &str, price: f64);

    fn market_price(&self, symbol: &str, exchange: &str) -> Option<f64>;

    fn current_snapshot(&self) -> PnlSnapshot;
}

#[derive(Debug, Clone, Default)]
struct Position {
    /// Signed: positive long, negative short
    quantity: Decimal,
    avg_price: Decimal,
}

/// Default average-cost P&L ledger.
#[derive(Debug, Clone)]
pub struct PnlLedger {
    initial_capital: Decimal,
    positions: HashMap<MarketKey, Position>,
    marks: HashMap<MarketKey, Decimal>,
    realized: Decimal,
    /// Realized P&L of every position-reducing trade
    closed_pnls: Vec<Decimal>,
    /// Equity after each trade, starting with the initial capital
    equity_curve: Vec<f64>,
}

impl PnlLedger {
    pub const DEFAULT_CAPITAL: i64 = 100_000;

    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            positions: HashMap::new(),
            marks: HashMap::new(),
            realized: Decimal::ZERO,
            closed_pnls: Vec::new(),
            equity_curve: vec![initial_capital.to_f64().unwrap_or(0.0)],
        }
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        // Every committed fill and mark was checked to keep this representable.
        self.unrealized_with(None).unwrap_or(Decimal::ZERO)
    }

    /// Net signed position for a market.
    pub fn position(&self, symbol: &str, exchange: &str) -> Decimal {
        self.positions
            .get(&MarketKey::new(symbol, exchange))
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Unrealized P&L, optionally with one position and mark replaced.
    /// `None` on overflow.
    fn unrealized_with(&self, replaced: Option<(&MarketKey, &Position, Decimal)>) -> Option<Decimal> {
        let others = self
            .positions
            .iter()
            .filter(|(key, _)| replaced.map_or(true, |(k, _, _)| k != *key))
            .filter_map(|(key, pos)| self.marks.get(key).map(|mark| (pos, *mark)));
        replaced
            .map(|(_, pos, mark)| (pos, mark))
            .into_iter()
            .chain(others)
            .try_fold(Decimal::ZERO, |acc, (pos, mark)| {
                acc.checked_add(pos.quantity.checked_mul(mark.checked_sub(pos.avg_price)?)?)
            })
    }

    fn equity_with(&self, realized: Decimal, unrealized: Decimal) -> Option<Decimal> {
        self.initial_capital.checked_add(realized)?.checked_add(unrealized)
    }
}

/// Position after a fill, plus the realized P&L when the fill reduces it.
/// `None` when the arithmetic overflows.
fn fill_outcome(pos: &Position, signed_qty: Decimal, price: Decimal) -> Option<(Position, Option<Decimal>)> {
    let same_direction =
        pos.quantity.is_zero() || pos.quantity.is_sign_positive() == signed_qty.is_sign_positive();
    if same_direction {
        let total = pos.quantity.abs().checked_add(signed_qty.abs())?;
        let avg_price = if total.is_zero() {
            pos.avg_price
        } else {
            pos.quantity
                .abs()
                .checked_mul(pos.avg_price)?
                .checked_add(signed_qty.abs().checked_mul(price)?)?
                .checked_div(total)?
        };
        let quantity = pos.quantity.checked_add(signed_qty)?;
        return Some((Position { quantity, avg_price }, None));
    }

    let closing = signed_qty.abs().min(pos.quantity.abs());
    let direction = if pos.quantity.is_sign_positive() {
        Decimal::ONE
    } else {
        Decimal::NEGATIVE_ONE
    };
    let pnl = closing
        .checked_mul(price.checked_sub(pos.avg_price)?)?
        .checked_mul(direction)?;

    let quantity = pos.quantity.checked_add(signed_qty)?;
    let avg_price = if quantity.is_zero() {
        Decimal::ZERO
    } else if quantity.is_sign_positive() != direction.is_sign_positive() {
        // Flipped through zero: the remainder opens at the fill price.
        price
    } else {
        pos.avg_price
    };
    Some((Position { quantity, avg_price }, Some(pnl)))
}

impl Default for PnlLedger {
    fn default() -> Self {
        Self::new(Decimal::from(Self::DEFAULT_CAPITAL))
    }
}

impl PnlTracker for PnlLedger {
    fn record_trade(&mut self, order: &ExecutionOrder, executed_price: f64, executed_quantity: f64) {
        let (price, qty) = match (
            Decimal::from_f64(executed_price),
            Decimal::from_f64(executed_quantity),
        ) {
            (Some(p), Some(q)) if p > Decimal::ZERO && q > Decimal::ZERO => (p, q),
            _ => {
                warn!(
                    symbol = %order.symbol,
                    exchange = %order.exchange,
                    executed_price,
                    executed_quantity,
                    "Ignoring fill with unrepresentable price or quantity"
                );
                return;
            }
        };

        let key = MarketKey::new(&order.symbol, &order.exchange);
        let signed_qty = match order.side {
            Side::BUY => qty,
            Side::SELL => -qty,
        };
        let current = self.positions.get(&key).cloned().unwrap_or_default();
        let mark = self.marks.get(&key).copied().unwrap_or(price);

        let committed = fill_outcome(&current, signed_qty, price).and_then(|(next, closed)| {
            let realized = match closed {
                Some(pnl) => self.realized.checked_add(pnl)?,
                None => self.realized,
            };
            let unrealized = self.unrealized_with(Some((&key, &next, mark)))?;
            let equity = self.equity_with(realized, unrealized)?;
            Some((next, closed, realized, equity))
        });
        let Some((next, closed, realized, equity)) = committed else {
            warn!(
                symbol = %order.symbol,
                exchange = %order.exchange,
                executed_price,
                executed_quantity,
                "Ignoring fill that overflows the ledger"
            );
            return;
        };

        self.positions.insert(key.clone(), next);
        self.marks.entry(key).or_insert(price);
        self.realized = realized;
        if let Some(pnl) = closed {
            self.closed_pnls.push(pnl);
        }
        self.equity_curve.push(equity.to_f64().unwrap_or(0.0));
    }

    fn update_market_price(&mut self, symbol: &str, exchange: &str, price: f64) {
        let Some(px) = Decimal::from_f64(price).filter(|p| *p > Decimal::ZERO) else {
            return;
        };
        let key = MarketKey::new(symbol, exchange);
        if let Some(pos) = self.positions.get(&key) {
            let fits = self
                .unrealized_with(Some((&key, pos, px)))
                .and_then(|unrealized| self.equity_with(self.realized, unrealized))
                .is_some();
            if !fits {
                warn!(symbol, exchange, price, "Ignoring mark that overflows the ledger");
                return;
            }
        }
        self.marks.insert(key, px);
    }

    fn market_price(&self, symbol: &str, exchange: &str) -> Option<f64> {
        self.marks
            .get(&MarketKey::new(symbol, exchange))
            .and_then(|p| p.to_f64())
    }

    fn current_snapshot(&self) -> PnlSnapshot {
        let realized = self.realized.to_f64().unwrap_or(0.0);
        let unrealized = self.unrealized_pnl().to_f64().unwrap_or(0.0);

        let returns: Vec<f64> = self
            .equity_curve
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();
        let sharpe_ratio = match (stats::mean(&returns), stats::sample_std_dev(&returns)) {
            (Some(m), Some(sd)) if sd > 0.0 => m / sd,
            _ => 0.0,
        };

        let changes: Vec<f64> = self.equity_curve.windows(2).map(|w| w[1] - w[0]).collect();

        let wins = self.closed_pnls.iter().filter(|p| **p > Decimal::ZERO).count();
        let win_rate_pct = if self.closed_pnls.is_empty() {
            0.0
        } else {
            wins as f64 / self.closed_pnls.len() as f64 * 100.0
        };

        PnlSnapshot {
            total_pnl: realized + unrealized,
            realized_pnl: realized,
            unrealized_pnl: unrealized,
            sharpe_ratio,
            max_drawdown_pct: stats::max_drawdown(&self.equity_curve) * 100.0,
            win_rate_pct,
            var_95: stats::historical_var(&changes, 0.95),
            trade_count: self.equity_curve.len() - 1,
        }
    }
}
