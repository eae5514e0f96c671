#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use papertrade::domain::candle::{Candle, LivePrice};
use papertrade::domain::engine::EngineConfig;
use papertrade::ports::event_port::EventSink;
use std::cell::RefCell;
use std::rc::Rc;

pub fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap()
}

pub fn tick(symbol: &str, price: f64, minute: u32) -> LivePrice {
    LivePrice::new(symbol, price, ts(minute))
}

pub fn make_candle(symbol: &str, minute: u32, close: f64) -> Candle {
    Candle {
        symbol: symbol.to_string(),
        timestamp: ts(minute),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

pub fn make_candles(symbol: &str, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(symbol, i as u32, close))
        .collect()
}

/// Engine config with 2%/4% default offsets, the shape most scenarios use.
pub fn offsets_config() -> EngineConfig {
    EngineConfig {
        stop_loss_pct: 2.0,
        take_profit_pct: 4.0,
        ..EngineConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    PositionClosed(String),
    ToolShouldBeRemoved(String),
}

/// Event sink that records notifications into a shared buffer the test body
/// keeps a handle to.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Rc<RefCell<Vec<SinkEvent>>>) {
        let sink = Self::default();
        let events = sink.events.clone();
        (sink, events)
    }
}

impl EventSink for RecordingSink {
    fn on_position_closed(&mut self, position_id: &str) {
        self.events
            .borrow_mut()
            .push(SinkEvent::PositionClosed(position_id.to_string()));
    }

    fn on_tool_should_be_removed(&mut self, tool_id: &str) {
        self.events
            .borrow_mut()
            .push(SinkEvent::ToolShouldBeRemoved(tool_id.to_string()));
    }
}
