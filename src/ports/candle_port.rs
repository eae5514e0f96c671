//! Candle source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::PapertradeError;
use chrono::{DateTime, Utc};

/// Supplies ordered candle batches per symbol; the transport behind it
/// (files, REST, websocket recorder) is not this crate's concern.
pub trait CandleSource {
    /// Fetch candles for a symbol within [start, end], ordered by timestamp.
    /// A malformed batch yields an empty vector, never a partial one.
    fn fetch_candles(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, PapertradeError>;

    fn list_symbols(&self) -> Result<Vec<String>, PapertradeError>;
}
