//! CSV file candle source.
//!
//! One file per symbol (`{SYMBOL}.csv`) with the columns
//! `timestamp,open,high,low,close,volume`, timestamps in RFC 3339.
//! A malformed batch yields an empty vector rather than a partial one.

use crate::domain::candle::Candle;
use crate::domain::error::PapertradeError;
use crate::ports::candle_port::CandleSource;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

pub struct CsvCandleAdapter {
    base_path: PathBuf,
}

impl CsvCandleAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn parse_candle(symbol: &str, record: &csv::StringRecord) -> Option<Candle> {
        let timestamp = DateTime::parse_from_rfc3339(record.get(0)?)
            .ok()?
            .with_timezone(&Utc);
        let open: f64 = record.get(1)?.parse().ok()?;
        let high: f64 = record.get(2)?.parse().ok()?;
        let low: f64 = record.get(3)?.parse().ok()?;
        let close: f64 = record.get(4)?.parse().ok()?;
        let volume: f64 = record.get(5)?.parse().ok()?;

        Some(Candle {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

impl CandleSource for CsvCandleAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, PapertradeError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| PapertradeError::Store {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(symbol, error = %e, "malformed candle batch, returning empty");
                    return Ok(Vec::new());
                }
            };

            let Some(candle) = Self::parse_candle(symbol, &record) else {
                warn!(symbol, row = ?record, "malformed candle batch, returning empty");
                return Ok(Vec::new());
            };

            if candle.timestamp < start || candle.timestamp > end {
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PapertradeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PapertradeError::Store {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PapertradeError::Store {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
