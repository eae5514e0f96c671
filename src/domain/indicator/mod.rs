//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//! - `IndicatorConfig`: An enabled/disabled indicator selection with an id
//!
//! All calculations are pure functions over an ordered candle slice and return
//! a series of the same length; points inside the warmup window carry
//! `valid: false` as the explicit no-value marker.

pub mod sma;
pub mod ema;
pub mod rsi;
pub mod bollinger;
pub mod macd;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::candle::Candle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

/// One configured indicator slot on a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub id: String,
    pub indicator_type: IndicatorType,
    pub enabled: bool,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// Dispatch a single indicator calculation by type.
pub fn compute_indicator(candles: &[Candle], indicator_type: &IndicatorType) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Sma(period) => calculate_sma(candles, period),
        IndicatorType::Ema(period) => calculate_ema(candles, period),
        IndicatorType::Rsi(period) => calculate_rsi(candles, period),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(candles, period, stddev_mult_x100),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(candles, fast, slow, signal),
    }
}

/// Compute every enabled config against the same candle sequence.
/// Disabled configs are skipped entirely.
pub fn compute_enabled(
    candles: &[Candle],
    configs: &[IndicatorConfig],
) -> Vec<(String, IndicatorSeries)> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .map(|c| (c.id.clone(), compute_indicator(candles, &c.indicator_type)))
        .collect()
}

/// Build an all-invalid series aligned with the input, used whenever the
/// requested parameters cannot produce any value.
pub(crate) fn invalid_series(
    candles: &[Candle],
    indicator_type: IndicatorType,
    placeholder: fn() -> IndicatorValue,
) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type,
        values: candles
            .iter()
            .map(|c| IndicatorPoint {
                timestamp: c.timestamp,
                valid: false,
                value: placeholder(),
            })
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Build flat candles from a close series, one minute apart.
    pub fn make_candles(prices: &[f64]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                symbol: "TEST".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
                    + chrono::Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}
