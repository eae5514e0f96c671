//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) candles are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    invalid_series, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub fn calculate_bollinger(
    candles: &[Candle],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    if period == 0 {
        return invalid_series(
            candles,
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            },
            || IndicatorValue::Bollinger {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
            },
        );
    }

    let mut values = Vec::with_capacity(candles.len());
    let warmup = period - 1;
    let mult = stddev_mult_x100 as f64 / 100.0;

    for i in 0..candles.len() {
        let timestamp = candles[i].timestamp;
        let valid = i >= warmup;

        let (upper, middle, lower) = if valid {
            let start = i + 1 - period;
            let window = &candles[start..=i];

            let middle_val: f64 = window.iter().map(|c| c.close).sum::<f64>() / period as f64;

            let variance: f64 = window
                .iter()
                .map(|c| {
                    let diff = c.close - middle_val;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;

            let stddev = variance.sqrt();
            (middle_val + mult * stddev, middle_val, middle_val - mult * stddev)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            timestamp,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
