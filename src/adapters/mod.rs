//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod csv_candle_adapter;
pub mod csv_replay_adapter;
pub mod memory_store_adapter;
pub mod json_store_adapter;
