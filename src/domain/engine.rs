//! Paper trading engine: owns one account and its positions, executes
//! synchronous market fills, and evaluates stop-loss/take-profit triggers on
//! each incoming tick.
//!
//! Single-writer by construction: every mutating operation takes `&mut self`
//! and commits its transition atomically (validate first, then apply). A host
//! with multiple writers wraps the engine in its own mutex; readers get
//! consistent snapshots because no operation ever leaves partial state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::domain::account::PaperAccount;
use crate::domain::candle::LivePrice;
use crate::domain::error::PapertradeError;
use crate::domain::order::{OrderSide, PaperOrder};
use crate::domain::position::{PaperPosition, PositionSide};
use crate::ports::config_port::ConfigPort;
use crate::ports::event_port::EventSink;
use crate::ports::store_port::RecordStore;

/// Engine parameters, loaded from the `[account]` and `[trading]` config
/// sections.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Quantity used by plain `buy`/`sell`.
    pub default_quantity: f64,
    /// Percentage offset for the default stop-loss; 0 disables it.
    pub stop_loss_pct: f64,
    /// Percentage offset for the default take-profit; 0 disables it.
    pub take_profit_pct: f64,
    /// Reject a second open position on the same symbol.
    pub single_position_per_symbol: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_balance: 10_000.0,
            default_quantity: 1.0,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            single_position_per_symbol: true,
        }
    }
}

impl EngineConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PapertradeError> {
        let defaults = EngineConfig::default();
        let built = EngineConfig {
            initial_balance: config.get_double(
                "account",
                "initial_balance",
                defaults.initial_balance,
            ),
            default_quantity: config.get_double(
                "trading",
                "default_quantity",
                defaults.default_quantity,
            ),
            stop_loss_pct: config.get_double("trading", "stop_loss_pct", defaults.stop_loss_pct),
            take_profit_pct: config.get_double(
                "trading",
                "take_profit_pct",
                defaults.take_profit_pct,
            ),
            single_position_per_symbol: config.get_bool(
                "trading",
                "single_position_per_symbol",
                defaults.single_position_per_symbol,
            ),
        };
        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), PapertradeError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(PapertradeError::ConfigInvalid {
                section: "account".into(),
                key: "initial_balance".into(),
                reason: "must be a positive number".into(),
            });
        }
        if !(self.default_quantity.is_finite() && self.default_quantity > 0.0) {
            return Err(PapertradeError::ConfigInvalid {
                section: "trading".into(),
                key: "default_quantity".into(),
                reason: "must be a positive number".into(),
            });
        }
        if !(0.0..100.0).contains(&self.stop_loss_pct) {
            return Err(PapertradeError::ConfigInvalid {
                section: "trading".into(),
                key: "stop_loss_pct".into(),
                reason: "must be in [0, 100)".into(),
            });
        }
        if !(0.0..100.0).contains(&self.take_profit_pct) {
            return Err(PapertradeError::ConfigInvalid {
                section: "trading".into(),
                key: "take_profit_pct".into(),
                reason: "must be in [0, 100)".into(),
            });
        }
        Ok(())
    }
}

/// Exit details of a closed position, for callers synchronizing a linked
/// drawing after the closure notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedPositionResult {
    pub exit_price: f64,
    pub pnl: f64,
}

pub struct PaperTradingEngine {
    config: EngineConfig,
    account: PaperAccount,
    positions: HashMap<String, PaperPosition>,
    orders: Vec<PaperOrder>,
    last_prices: HashMap<String, f64>,
    last_error: Option<String>,
    sink: Option<Box<dyn EventSink>>,
}

impl PaperTradingEngine {
    pub fn new(config: EngineConfig) -> Self {
        let account = PaperAccount::new(config.initial_balance);
        Self {
            config,
            account,
            positions: HashMap::new(),
            orders: Vec::new(),
            last_prices: HashMap::new(),
            last_error: None,
            sink: None,
        }
    }

    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = Some(sink);
    }

    // ── Read accessors ──────────────────────────────────────────────

    pub fn account(&self) -> &PaperAccount {
        &self.account
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.last_prices.get(symbol).copied()
    }

    pub fn position(&self, id: &str) -> Option<&PaperPosition> {
        self.positions.get(id)
    }

    pub fn open_position_for_symbol(&self, symbol: &str) -> Option<&PaperPosition> {
        self.positions
            .values()
            .find(|p| p.is_open() && p.symbol == symbol)
    }

    pub fn open_positions(&self) -> Vec<&PaperPosition> {
        let mut open: Vec<&PaperPosition> =
            self.positions.values().filter(|p| p.is_open()).collect();
        open.sort_by_key(|p| p.opened_at);
        open
    }

    pub fn closed_positions(&self) -> Vec<&PaperPosition> {
        let mut closed: Vec<&PaperPosition> =
            self.positions.values().filter(|p| !p.is_open()).collect();
        closed.sort_by_key(|p| p.closed_at);
        closed
    }

    pub fn orders(&self) -> &[PaperOrder] {
        &self.orders
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Exit details for a position that has already closed.
    pub fn closed_position_result(&self, id: &str) -> Option<ClosedPositionResult> {
        let position = self.positions.get(id)?;
        match (position.exit_price, position.realized_pnl) {
            (Some(exit_price), Some(pnl)) => Some(ClosedPositionResult { exit_price, pnl }),
            _ => None,
        }
    }

    // ── Mutating operations ─────────────────────────────────────────

    /// Open a long position at the quoted price using the configured default
    /// quantity and percentage SL/TP offsets.
    pub fn buy(&mut self, symbol: &str, price: f64) -> Result<String, PapertradeError> {
        self.open_market(symbol, PositionSide::Long, price)
    }

    /// Open a short position at the quoted price using the configured default
    /// quantity and percentage SL/TP offsets.
    pub fn sell(&mut self, symbol: &str, price: f64) -> Result<String, PapertradeError> {
        self.open_market(symbol, PositionSide::Short, price)
    }

    fn open_market(
        &mut self,
        symbol: &str,
        side: PositionSide,
        price: f64,
    ) -> Result<String, PapertradeError> {
        let quantity = self.config.default_quantity;
        let (stop_loss, take_profit) = default_levels(side, price, &self.config);
        self.open_position(symbol, side, price, quantity, stop_loss, take_profit, None)
    }

    /// Open a position from validated tool parameters, linking the tool id
    /// for later closure notifications.
    #[allow(clippy::too_many_arguments)]
    pub fn open_position_from_tool(
        &mut self,
        symbol: &str,
        is_long: bool,
        entry_price: f64,
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
        tool_id: &str,
    ) -> Result<String, PapertradeError> {
        let side = if is_long {
            PositionSide::Long
        } else {
            PositionSide::Short
        };
        self.open_position(
            symbol,
            side,
            entry_price,
            quantity,
            Some(stop_loss),
            Some(take_profit),
            Some(tool_id.to_string()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn open_position(
        &mut self,
        symbol: &str,
        side: PositionSide,
        entry_price: f64,
        quantity: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        tool_id: Option<String>,
    ) -> Result<String, PapertradeError> {
        // All validation happens before any state changes.
        if !(entry_price.is_finite() && entry_price > 0.0) {
            return self.fail(PapertradeError::InvalidPrice { value: entry_price });
        }
        if !(quantity.is_finite() && quantity > 0.0) {
            return self.fail(PapertradeError::InvalidQuantity { value: quantity });
        }
        if !levels_ordered(side, entry_price, stop_loss, take_profit) {
            return self.fail(PapertradeError::InvalidLevels {
                side: side.to_string(),
                entry: entry_price,
                stop_loss,
                take_profit,
            });
        }
        if self.config.single_position_per_symbol
            && self.open_position_for_symbol(symbol).is_some()
        {
            return self.fail(PapertradeError::DuplicatePosition {
                symbol: symbol.to_string(),
            });
        }

        let now = Utc::now();
        let order_side = match side {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        };
        let order = PaperOrder::market_fill(symbol, order_side, quantity, entry_price, now);
        let position = PaperPosition::open(
            symbol,
            side,
            quantity,
            entry_price,
            stop_loss,
            take_profit,
            now,
            tool_id,
        );
        let id = position.id.clone();

        info!(
            symbol,
            %side,
            entry_price,
            quantity,
            position_id = %id,
            "opened position"
        );

        self.last_prices.insert(symbol.to_string(), entry_price);
        self.orders.push(order);
        self.positions.insert(id.clone(), position);
        Ok(id)
    }

    /// Record the latest price for the tick's symbol and evaluate trigger
    /// conditions on every open position for it: stop-loss first, then
    /// take-profit. A triggered position closes at the tick price, not the
    /// exact level, reflecting a gap-through fill. Malformed ticks are
    /// dropped with a warning.
    pub fn update_price(&mut self, tick: &LivePrice) {
        if !tick.is_well_formed() {
            warn!(symbol = %tick.symbol, price = tick.price, "dropping malformed tick");
            return;
        }

        self.last_prices.insert(tick.symbol.clone(), tick.price);

        let triggered: Vec<(String, &'static str)> = self
            .positions
            .values()
            .filter(|p| p.is_open() && p.symbol == tick.symbol)
            .filter_map(|p| {
                if p.should_trigger_stop_loss(tick.price) {
                    Some((p.id.clone(), "stop-loss"))
                } else if p.should_trigger_take_profit(tick.price) {
                    Some((p.id.clone(), "take-profit"))
                } else {
                    None
                }
            })
            .collect();

        for (id, reason) in triggered {
            let pnl = self.commit_close(&id, tick.price, tick.timestamp);
            info!(
                position_id = %id,
                reason,
                exit_price = tick.price,
                pnl,
                "trigger closed position"
            );
        }
    }

    /// Manually close a position at the last known price for its symbol.
    /// Closing an already-closed position is a no-op so duplicate UI actions
    /// stay harmless; an unknown id or a missing price is an error.
    pub fn close_position(&mut self, id: &str) -> Result<(), PapertradeError> {
        let (symbol, is_open) = match self.positions.get(id) {
            Some(p) => (p.symbol.clone(), p.is_open()),
            None => {
                return self.fail(PapertradeError::UnknownPosition { id: id.to_string() });
            }
        };
        if !is_open {
            return Ok(());
        }
        let price = match self.last_prices.get(&symbol) {
            Some(p) => *p,
            None => {
                return self.fail(PapertradeError::PriceUnavailable { symbol });
            }
        };

        let pnl = self.commit_close(id, price, Utc::now());
        info!(position_id = %id, exit_price = price, pnl, "manually closed position");
        Ok(())
    }

    /// Reinitialize the account to the configured starting balance and
    /// discard every position and order. Linked tools are notified so the
    /// drawing layer is not left pointing at dead ids.
    pub fn reset_account(&mut self) {
        let linked_tools: Vec<String> = self
            .positions
            .values()
            .filter(|p| p.is_open())
            .filter_map(|p| p.tool_id.clone())
            .collect();

        self.positions.clear();
        self.orders.clear();
        self.last_error = None;
        self.account.reset(self.config.initial_balance);

        for tool_id in linked_tools {
            if let Some(sink) = self.sink.as_mut() {
                sink.on_tool_should_be_removed(&tool_id);
            }
        }

        info!(balance = self.config.initial_balance, "account reset");
    }

    // ── Persistence ─────────────────────────────────────────────────

    pub fn save_to(&self, store: &mut dyn RecordStore) -> Result<(), PapertradeError> {
        store.save_account(&self.account)?;
        for order in &self.orders {
            store.save_order(order)?;
        }
        for position in self.positions.values() {
            store.save_position(position)?;
        }
        Ok(())
    }

    /// Rebuild an engine from stored records. Returns `None` when the store
    /// has no account under the given id. Last-seen prices are transient and
    /// start empty.
    pub fn load_from(
        config: EngineConfig,
        store: &dyn RecordStore,
        account_id: &str,
    ) -> Result<Option<Self>, PapertradeError> {
        let Some(account) = store.load_account(account_id)? else {
            return Ok(None);
        };
        let positions = store
            .load_positions()?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let orders = store.load_orders()?;

        Ok(Some(Self {
            config,
            account,
            positions,
            orders,
            last_prices: HashMap::new(),
            last_error: None,
            sink: None,
        }))
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Apply a closure as one transition: position exit fields, account
    /// balance, cumulative realized P&L, then notifications. The caller has
    /// already verified the position exists and is open.
    fn commit_close(&mut self, id: &str, exit_price: f64, closed_at: DateTime<Utc>) -> f64 {
        let Some(position) = self.positions.get_mut(id) else {
            return 0.0;
        };
        let Some(pnl) = position.close(exit_price, closed_at) else {
            return 0.0;
        };
        let tool_id = position.tool_id.clone();

        self.account.apply_realized(pnl);

        if let Some(sink) = self.sink.as_mut() {
            sink.on_position_closed(id);
            if let Some(tool_id) = tool_id {
                sink.on_tool_should_be_removed(&tool_id);
            }
        }
        pnl
    }

    fn fail<T>(&mut self, err: PapertradeError) -> Result<T, PapertradeError> {
        warn!(error = %err, "rejected operation");
        self.last_error = Some(err.to_string());
        Err(err)
    }
}

/// Derive default SL/TP levels from percentage offsets; 0 disables a level.
fn default_levels(side: PositionSide, price: f64, config: &EngineConfig) -> (Option<f64>, Option<f64>) {
    let stop_loss = (config.stop_loss_pct > 0.0).then(|| match side {
        PositionSide::Long => price * (1.0 - config.stop_loss_pct / 100.0),
        PositionSide::Short => price * (1.0 + config.stop_loss_pct / 100.0),
    });
    let take_profit = (config.take_profit_pct > 0.0).then(|| match side {
        PositionSide::Long => price * (1.0 + config.take_profit_pct / 100.0),
        PositionSide::Short => price * (1.0 - config.take_profit_pct / 100.0),
    });
    (stop_loss, take_profit)
}

/// Stop-loss must sit on the losing side of entry and take-profit on the
/// winning side; unset levels are always acceptable.
fn levels_ordered(
    side: PositionSide,
    entry: f64,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
) -> bool {
    match side {
        PositionSide::Long => {
            stop_loss.is_none_or(|sl| sl < entry) && take_profit.is_none_or(|tp| tp > entry)
        }
        PositionSide::Short => {
            stop_loss.is_none_or(|sl| sl > entry) && take_profit.is_none_or(|tp| tp < entry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap()
    }

    fn tick(symbol: &str, price: f64, minute: u32) -> LivePrice {
        LivePrice::new(symbol, price, ts(minute))
    }

    fn engine() -> PaperTradingEngine {
        PaperTradingEngine::new(EngineConfig::default())
    }

    /// Records every notification it receives, shared with the test body.
    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl EventSink for RecordingSink {
        fn on_position_closed(&mut self, position_id: &str) {
            self.events.borrow_mut().push(format!("closed:{position_id}"));
        }
        fn on_tool_should_be_removed(&mut self, tool_id: &str) {
            self.events.borrow_mut().push(format!("remove-tool:{tool_id}"));
        }
    }

    #[test]
    fn buy_opens_long_with_default_quantity() {
        let mut engine = engine();
        let id = engine.buy("BTCUSD", 100.0).unwrap();

        let pos = engine.position(&id).unwrap();
        assert!(pos.is_open());
        assert!(pos.is_long());
        assert!((pos.quantity - 1.0).abs() < f64::EPSILON);
        assert!((pos.entry_price - 100.0).abs() < f64::EPSILON);
        assert_eq!(pos.stop_loss, None);
        assert_eq!(pos.take_profit, None);

        // Balance is untouched at open; only realized P&L moves it.
        assert!((engine.account().balance - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(engine.orders().len(), 1);
        assert!(engine.orders()[0].is_filled());
    }

    #[test]
    fn sell_opens_short() {
        let mut engine = engine();
        let id = engine.sell("BTCUSD", 100.0).unwrap();
        assert_eq!(engine.position(&id).unwrap().side, PositionSide::Short);
    }

    #[test]
    fn percentage_offsets_derive_levels() {
        let mut engine = PaperTradingEngine::new(EngineConfig {
            stop_loss_pct: 2.0,
            take_profit_pct: 4.0,
            ..EngineConfig::default()
        });

        let id = engine.buy("BTCUSD", 100.0).unwrap();
        let pos = engine.position(&id).unwrap();
        assert!((pos.stop_loss.unwrap() - 98.0).abs() < 1e-10);
        assert!((pos.take_profit.unwrap() - 104.0).abs() < 1e-10);

        let id = engine.sell("ETHUSD", 100.0).unwrap();
        let pos = engine.position(&id).unwrap();
        assert!((pos.stop_loss.unwrap() - 102.0).abs() < 1e-10);
        assert!((pos.take_profit.unwrap() - 96.0).abs() < 1e-10);
    }

    #[test]
    fn invalid_price_rejected_and_error_retained() {
        let mut engine = engine();

        assert!(engine.buy("BTCUSD", 0.0).is_err());
        assert!(engine.has_error());
        assert!(engine.last_error().unwrap().contains("invalid price"));
        assert!(engine.open_positions().is_empty());

        engine.clear_error();
        assert!(!engine.has_error());

        assert!(engine.buy("BTCUSD", f64::NAN).is_err());
        assert!(engine.buy("BTCUSD", -10.0).is_err());
    }

    #[test]
    fn invalid_quantity_rejected() {
        let mut engine = PaperTradingEngine::new(EngineConfig {
            default_quantity: 0.0,
            ..EngineConfig::default()
        });
        assert!(matches!(
            engine.buy("BTCUSD", 100.0),
            Err(PapertradeError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn duplicate_position_rejected_in_single_position_mode() {
        let mut engine = engine();
        engine.buy("BTCUSD", 100.0).unwrap();

        let err = engine.buy("BTCUSD", 101.0).unwrap_err();
        assert!(matches!(err, PapertradeError::DuplicatePosition { .. }));

        // Other symbols are unaffected.
        assert!(engine.buy("ETHUSD", 50.0).is_ok());
    }

    #[test]
    fn multiple_positions_allowed_when_mode_disabled() {
        let mut engine = PaperTradingEngine::new(EngineConfig {
            single_position_per_symbol: false,
            ..EngineConfig::default()
        });
        engine.buy("BTCUSD", 100.0).unwrap();
        engine.buy("BTCUSD", 101.0).unwrap();
        assert_eq!(engine.open_positions().len(), 2);
    }

    #[test]
    fn open_from_tool_links_tool_id() {
        let mut engine = engine();
        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 2.0, 98.0, 104.0, "tool-1")
            .unwrap();

        let pos = engine.position(&id).unwrap();
        assert_eq!(pos.tool_id.as_deref(), Some("tool-1"));
        assert_eq!(pos.stop_loss, Some(98.0));
        assert_eq!(pos.take_profit, Some(104.0));
    }

    #[test]
    fn open_from_tool_rejects_bad_level_ordering() {
        let mut engine = engine();

        // Long with stop above entry.
        let err = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 104.0, 98.0, "tool-1")
            .unwrap_err();
        assert!(matches!(err, PapertradeError::InvalidLevels { .. }));
        assert!(engine.open_positions().is_empty());

        // Short with stop below entry.
        assert!(engine
            .open_position_from_tool("BTCUSD", false, 100.0, 1.0, 98.0, 104.0, "tool-2")
            .is_err());

        // Correct short ordering works.
        assert!(engine
            .open_position_from_tool("BTCUSD", false, 100.0, 1.0, 110.0, 90.0, "tool-3")
            .is_ok());
    }

    #[test]
    fn stop_loss_trigger_long() {
        let mut engine = engine();
        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();

        // Neutral tick triggers nothing.
        engine.update_price(&tick("BTCUSD", 100.0, 1));
        assert!(engine.position(&id).unwrap().is_open());

        // Gap through the stop fills at the tick price, not the level.
        engine.update_price(&tick("BTCUSD", 89.0, 2));
        let pos = engine.position(&id).unwrap();
        assert!(!pos.is_open());
        assert_eq!(pos.exit_price, Some(89.0));
        assert!(pos.realized_pnl.unwrap() < 0.0);
        assert!((pos.realized_pnl.unwrap() - (-11.0)).abs() < f64::EPSILON);
        assert!((engine.account().balance - 9_989.0).abs() < f64::EPSILON);
    }

    #[test]
    fn take_profit_trigger_long() {
        let mut engine = engine();
        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();

        engine.update_price(&tick("BTCUSD", 111.0, 1));
        let pos = engine.position(&id).unwrap();
        assert!(!pos.is_open());
        assert_eq!(pos.exit_price, Some(111.0));
        assert!((pos.realized_pnl.unwrap() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_triggers_mirror_long() {
        let mut engine = PaperTradingEngine::new(EngineConfig {
            single_position_per_symbol: false,
            ..EngineConfig::default()
        });

        let stopped = engine
            .open_position_from_tool("BTCUSD", false, 100.0, 1.0, 110.0, 90.0, "t1")
            .unwrap();
        engine.update_price(&tick("BTCUSD", 111.0, 1));
        let pos = engine.position(&stopped).unwrap();
        assert!(!pos.is_open());
        assert!(pos.realized_pnl.unwrap() < 0.0);

        let profited = engine
            .open_position_from_tool("BTCUSD", false, 100.0, 1.0, 110.0, 90.0, "t2")
            .unwrap();
        engine.update_price(&tick("BTCUSD", 89.0, 2));
        let pos = engine.position(&profited).unwrap();
        assert!(!pos.is_open());
        assert!(pos.realized_pnl.unwrap() > 0.0);
    }

    #[test]
    fn tick_for_other_symbol_does_not_trigger() {
        let mut engine = engine();
        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();

        engine.update_price(&tick("ETHUSD", 1.0, 1));
        assert!(engine.position(&id).unwrap().is_open());
    }

    #[test]
    fn malformed_tick_dropped() {
        let mut engine = engine();
        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();

        engine.update_price(&tick("BTCUSD", -5.0, 1));
        engine.update_price(&tick("", 1.0, 1));
        engine.update_price(&tick("BTCUSD", f64::NAN, 1));

        assert!(engine.position(&id).unwrap().is_open());
        // The initial fill seeded the last price; malformed ticks never move it.
        assert_eq!(engine.current_price("BTCUSD"), Some(100.0));
    }

    #[test]
    fn manual_close_uses_last_price() {
        let mut engine = engine();
        let id = engine.buy("BTCUSD", 100.0).unwrap();
        engine.update_price(&tick("BTCUSD", 107.5, 1));

        engine.close_position(&id).unwrap();

        let pos = engine.position(&id).unwrap();
        assert_eq!(pos.exit_price, Some(107.5));
        assert!((pos.realized_pnl.unwrap() - 7.5).abs() < f64::EPSILON);
        assert!((engine.account().balance - 10_007.5).abs() < f64::EPSILON);
        assert!((engine.account().realized_pnl - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn close_is_idempotent_and_balance_changes_once() {
        let mut engine = engine();
        let id = engine.buy("BTCUSD", 100.0).unwrap();
        engine.update_price(&tick("BTCUSD", 110.0, 1));

        engine.close_position(&id).unwrap();
        let balance_after_first = engine.account().balance;

        // Second close is Ok and changes nothing.
        engine.close_position(&id).unwrap();
        assert!((engine.account().balance - balance_after_first).abs() < f64::EPSILON);
        assert_eq!(engine.position(&id).unwrap().exit_price, Some(110.0));
    }

    #[test]
    fn close_unknown_position_errors() {
        let mut engine = engine();
        let err = engine.close_position("nope").unwrap_err();
        assert!(matches!(err, PapertradeError::UnknownPosition { .. }));
        assert!(engine.has_error());
    }

    #[test]
    fn pnl_symmetry_between_unrealized_and_realized() {
        let mut engine = engine();
        let id = engine.sell("BTCUSD", 250.0).unwrap();

        let expected = engine.position(&id).unwrap().unrealized_pnl(242.0);
        engine.update_price(&tick("BTCUSD", 242.0, 1));
        engine.close_position(&id).unwrap();

        let stored = engine.position(&id).unwrap().realized_pnl.unwrap();
        assert!((stored - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn closed_position_result_accessor() {
        let mut engine = engine();
        let id = engine.buy("BTCUSD", 100.0).unwrap();
        assert_eq!(engine.closed_position_result(&id), None);

        engine.update_price(&tick("BTCUSD", 104.0, 1));
        engine.close_position(&id).unwrap();

        let result = engine.closed_position_result(&id).unwrap();
        assert!((result.exit_price - 104.0).abs() < f64::EPSILON);
        assert!((result.pnl - 4.0).abs() < f64::EPSILON);
        assert_eq!(engine.closed_position_result("nope"), None);
    }

    #[test]
    fn notifications_fire_on_trigger_close() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        engine.set_event_sink(Box::new(sink));

        let id = engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();
        engine.update_price(&tick("BTCUSD", 85.0, 1));

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], format!("closed:{id}"));
        assert_eq!(events[1], "remove-tool:tool-1");
    }

    #[test]
    fn notifications_fire_on_manual_close_without_tool() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        engine.set_event_sink(Box::new(sink));

        let id = engine.buy("BTCUSD", 100.0).unwrap();
        engine.close_position(&id).unwrap();

        let events = events.borrow();
        assert_eq!(events.as_slice(), [format!("closed:{id}")]);
    }

    #[test]
    fn reset_restores_balance_and_clears_positions() {
        let mut engine = engine();
        let id = engine.buy("BTCUSD", 100.0).unwrap();
        engine.update_price(&tick("BTCUSD", 90.0, 1));
        engine.close_position(&id).unwrap();
        engine.buy("ETHUSD", 50.0).unwrap();
        assert!(engine.account().balance < 10_000.0);

        engine.reset_account();

        assert!((engine.account().balance - 10_000.0).abs() < f64::EPSILON);
        assert!((engine.account().realized_pnl - 0.0).abs() < f64::EPSILON);
        assert!(engine.open_positions().is_empty());
        assert!(engine.closed_positions().is_empty());
        assert!(engine.orders().is_empty());
        assert!(!engine.has_error());
    }

    #[test]
    fn reset_notifies_linked_tools() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        engine.set_event_sink(Box::new(sink));

        engine
            .open_position_from_tool("BTCUSD", true, 100.0, 1.0, 90.0, 110.0, "tool-1")
            .unwrap();
        engine.reset_account();

        let events = events.borrow();
        assert_eq!(events.as_slice(), ["remove-tool:tool-1".to_string()]);
    }

    #[test]
    fn config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let bad = EngineConfig {
            initial_balance: 0.0,
            ..EngineConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = EngineConfig {
            default_quantity: -1.0,
            ..EngineConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = EngineConfig {
            stop_loss_pct: 100.0,
            ..EngineConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = EngineConfig {
            take_profit_pct: -2.0,
            ..EngineConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn open_position_seeds_last_price() {
        let mut engine = engine();
        engine.buy("BTCUSD", 123.0).unwrap();
        assert_eq!(engine.current_price("BTCUSD"), Some(123.0));
    }
}
