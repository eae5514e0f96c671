//! Session transcript CSV adapter.
//!
//! A transcript is a deterministic record of one paper-trading session:
//! `command,symbol,price,timestamp` rows where `command` is one of
//! `tick`, `buy`, `sell`, `close`, `reset`. `close` takes only a symbol
//! (the open position for that symbol is closed), `reset` takes nothing.
//! Malformed rows are dropped with a warning, mirroring the engine's
//! malformed-tick policy.

use crate::domain::candle::LivePrice;
use crate::domain::error::PapertradeError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Tick(LivePrice),
    Buy { symbol: String, price: f64 },
    Sell { symbol: String, price: f64 },
    Close { symbol: String },
    Reset,
}

pub fn read_session_file(path: &Path) -> Result<Vec<SessionCommand>, PapertradeError> {
    let content = fs::read_to_string(path).map_err(|e| PapertradeError::Store {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    Ok(parse_session(&content))
}

pub fn parse_session(content: &str) -> Vec<SessionCommand> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut commands = Vec::new();

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "dropping malformed session row");
                continue;
            }
        };
        match parse_command(&record) {
            Some(command) => commands.push(command),
            None => warn!(row = ?record, "dropping malformed session row"),
        }
    }

    commands
}

fn parse_command(record: &csv::StringRecord) -> Option<SessionCommand> {
    let command = record.get(0)?.trim().to_ascii_lowercase();
    match command.as_str() {
        "tick" => {
            let symbol = non_empty(record.get(1)?)?;
            let price: f64 = record.get(2)?.trim().parse().ok()?;
            let timestamp = parse_timestamp(record.get(3)?)?;
            Some(SessionCommand::Tick(LivePrice::new(symbol, price, timestamp)))
        }
        "buy" | "sell" => {
            let symbol = non_empty(record.get(1)?)?;
            let price: f64 = record.get(2)?.trim().parse().ok()?;
            if command == "buy" {
                Some(SessionCommand::Buy { symbol, price })
            } else {
                Some(SessionCommand::Sell { symbol, price })
            }
        }
        "close" => {
            let symbol = non_empty(record.get(1)?)?;
            Some(SessionCommand::Close { symbol })
        }
        "reset" => Some(SessionCommand::Reset),
        _ => None,
    }
}

fn non_empty(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timestamp(field: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(field.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SESSION: &str = "\
command,symbol,price,timestamp
buy,BTCUSD,100.0,
tick,BTCUSD,101.5,2024-01-15T10:01:00Z
tick,BTCUSD,99.0,2024-01-15T10:02:00Z
close,BTCUSD,,
reset,,,
";

    #[test]
    fn parses_full_session() {
        let commands = parse_session(SESSION);

        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[0],
            SessionCommand::Buy {
                symbol: "BTCUSD".into(),
                price: 100.0
            }
        );
        match &commands[1] {
            SessionCommand::Tick(tick) => {
                assert_eq!(tick.symbol, "BTCUSD");
                assert_eq!(tick.price, 101.5);
                assert_eq!(
                    tick.timestamp,
                    Utc.with_ymd_and_hms(2024, 1, 15, 10, 1, 0).unwrap()
                );
            }
            other => panic!("expected tick, got {:?}", other),
        }
        assert_eq!(
            commands[3],
            SessionCommand::Close {
                symbol: "BTCUSD".into()
            }
        );
        assert_eq!(commands[4], SessionCommand::Reset);
    }

    #[test]
    fn sell_command() {
        let commands = parse_session("command,symbol,price,timestamp\nsell,ETHUSD,50.5,\n");
        assert_eq!(
            commands,
            vec![SessionCommand::Sell {
                symbol: "ETHUSD".into(),
                price: 50.5
            }]
        );
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let content = "\
command,symbol,price,timestamp
tick,BTCUSD,not-a-price,2024-01-15T10:01:00Z
tick,BTCUSD,100.0,not-a-timestamp
frobnicate,BTCUSD,1.0,
buy,,100.0,
tick,BTCUSD,100.0,2024-01-15T10:01:00Z
";
        let commands = parse_session(content);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], SessionCommand::Tick(_)));
    }

    #[test]
    fn empty_session() {
        assert!(parse_session("command,symbol,price,timestamp\n").is_empty());
    }

    #[test]
    fn commands_are_case_insensitive() {
        let commands = parse_session("command,symbol,price,timestamp\nBUY,BTCUSD,100.0,\n");
        assert_eq!(commands.len(), 1);
    }
}
