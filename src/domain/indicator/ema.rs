//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) candles are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    invalid_series, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 {
        return invalid_series(candles, IndicatorType::Ema(period), || {
            IndicatorValue::Simple(0.0)
        });
    }

    let mut values = Vec::with_capacity(candles.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i < period - 1 {
            sum += candle.close;
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i == period - 1 {
            sum += candle.close;
            ema = sum / period as f64;
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        } else {
            ema = candle.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_candles;

    #[test]
    fn ema_warmup() {
        let candles = make_candles(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&candles, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_seed_is_sma() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);

        if let IndicatorValue::Simple(v) = series.values[2].value {
            let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
            assert!((v - expected_sma).abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn ema_recursive_calculation() {
        let candles = make_candles(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&candles, 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;

        if let IndicatorValue::Simple(v) = series.values[2].value {
            assert!((v - sma).abs() < f64::EPSILON);
        }

        let ema_3 = 40.0 * k + sma * (1.0 - k);
        if let IndicatorValue::Simple(v) = series.values[3].value {
            assert!((v - ema_3).abs() < f64::EPSILON);
        }

        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        if let IndicatorValue::Simple(v) = series.values[4].value {
            assert!((v - ema_4).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_period_1() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 1);

        for (i, point) in series.values.iter().enumerate() {
            assert!(point.valid);
            if let IndicatorValue::Simple(v) = point.value {
                assert!((v - candles[i].close).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn ema_equal_prices() {
        let candles = make_candles(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let series = calculate_ema(&candles, 3);

        for i in 2..5 {
            if let IndicatorValue::Simple(v) = series.values[i].value {
                assert!((v - 100.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn ema_insufficient_history_all_invalid() {
        let candles = make_candles(&[10.0, 20.0]);
        let series = calculate_ema(&candles, 5);

        assert_eq!(series.values.len(), 2);
        for point in &series.values {
            assert!(!point.valid);
        }
    }

    #[test]
    fn ema_zero_period_all_invalid() {
        let candles = make_candles(&[10.0, 20.0]);
        let series = calculate_ema(&candles, 0);

        assert_eq!(series.values.len(), 2);
        for point in &series.values {
            assert!(!point.valid);
        }
    }

    #[test]
    fn ema_empty_candles() {
        let candles: Vec<crate::domain::candle::Candle> = vec![];
        let series = calculate_ema(&candles, 3);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_indicator_type() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 5);
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_smoothing_factor() {
        let period = 10;
        let k = 2.0 / (period as f64 + 1.0);
        assert!((k - 2.0 / 11.0).abs() < f64::EPSILON);
    }
}
