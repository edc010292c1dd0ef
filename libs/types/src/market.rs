//! Market data points pushed into the simulator's snapshot feed

use serde::{Deserialize, Serialize};

/// Top-of-book quote plus traded volume for one symbol on one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    pub symbol: String,
    pub exchange: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: f64,
    pub timestamp: i64, // Unix nanos
}

impl MarketDataPoint {
    pub fn new(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        bid: f64,
        ask: f64,
        last: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            bid,
            ask,
            last,
            volume,
            timestamp: 0,
        }
    }

    /// Lookup key for snapshot maps
    pub fn key(&self) -> MarketKey {
        MarketKey::new(&self.symbol, &self.exchange)
    }

    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    pub fn spread(&self) -> f64 {
        (self.ask - self.bid).max(0.0)
    }

    /// Spread as a fraction of mid; zero when the book is empty or crossed.
    pub fn spread_pct(&self) -> f64 {
        let mid = self.mid();
        if mid > 0.0 {
            self.spread() / mid
        } else {
            0.0
        }
    }

    /// Traded volume in quote currency, priced at last (mid if no last).
    pub fn notional_volume(&self) -> f64 {
        let px = if self.last > 0.0 { self.last } else { self.mid() };
        self.volume * px
    }
}

/// (symbol, exchange) pair identifying one market on one venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketKey {
    pub symbol: String,
    pub exchange: String,
}

impl MarketKey {
    pub fn new(symbol: &str, exchange: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
        }
    }
}
