//! Simple Moving Average indicator.
//!
//! SMA[i] = mean of close over the trailing `period` candles ending at i.
//! Warmup: first (period-1) candles are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    invalid_series, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 {
        return invalid_series(candles, IndicatorType::Sma(period), || {
            IndicatorValue::Simple(0.0)
        });
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        sum += candle.close;
        if i >= period {
            sum -= candles[i - period].close;
        }

        if i < period - 1 {
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else {
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: IndicatorValue::Simple(sum / period as f64),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
