//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded with the simple mean of
//! the first `signal` defined MACD values.
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 candles.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    calculate_ema, invalid_series, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return invalid_series(candles, indicator_type, || IndicatorValue::Macd {
            line: 0.0,
            signal: 0.0,
            histogram: 0.0,
        });
    }

    let ema_fast = ema_raw_values(candles, fast);
    let ema_slow = ema_raw_values(candles, slow);

    let mut macd_line: Vec<f64> = Vec::with_capacity(candles.len());
    for i in 0..candles.len() {
        macd_line.push(ema_fast[i] - ema_slow[i]);
    }

    // The MACD line is defined once both EMAs are defined.
    let line_warmup = fast.max(slow) - 1;

    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal_line: Vec<f64> = vec![0.0; candles.len()];

    if line_warmup + signal_period <= candles.len() {
        let seed: f64 = macd_line[line_warmup..line_warmup + signal_period]
            .iter()
            .sum::<f64>()
            / signal_period as f64;

        let mut signal_ema = seed;
        signal_line[line_warmup + signal_period - 1] = signal_ema;

        for i in (line_warmup + signal_period)..candles.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let signal_warmup = line_warmup + signal_period - 1;

    let mut values = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        let valid = i >= signal_warmup;
        let line = macd_line[i];
        let signal = signal_line[i];

        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid,
            value: IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(candles: &[Candle]) -> IndicatorSeries {
    calculate_macd(candles, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

/// Extract raw f64 values from the EMA module, using 0.0 for warmup candles.
fn ema_raw_values(candles: &[Candle], period: usize) -> Vec<f64> {
    let series = calculate_ema(candles, period);
    series
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Simple(v) => v,
            _ => 0.0,
        })
        .collect()
}
