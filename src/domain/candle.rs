//! OHLCV candle and live tick representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable OHLCV bar. Constructed by adapters from external market
/// data and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// close >= open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// |close - open|
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// high - max(open, close)
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// min(open, close) - low
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

/// One timestamped price observation for a symbol, as delivered by a
/// streaming transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePrice {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub volume: Option<f64>,
    pub change_24h: Option<f64>,
}

impl LivePrice {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            volume: None,
            change_24h: None,
        }
    }

    /// Malformed ticks are dropped by the engine rather than surfaced as
    /// errors: the symbol must be non-empty and the price finite and positive.
    pub fn is_well_formed(&self) -> bool {
        !self.symbol.is_empty() && self.price.is_finite() && self.price > 0.0
    }
}
