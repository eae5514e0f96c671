//! In-memory record store, for tests and ephemeral sessions.

use crate::domain::account::PaperAccount;
use crate::domain::error::PapertradeError;
use crate::domain::order::PaperOrder;
use crate::domain::position::PaperPosition;
use crate::ports::store_port::RecordStore;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStoreAdapter {
    accounts: HashMap<String, PaperAccount>,
    orders: HashMap<String, PaperOrder>,
    positions: HashMap<String, PaperPosition>,
}

impl MemoryStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStoreAdapter {
    fn save_account(&mut self, account: &PaperAccount) -> Result<(), PapertradeError> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn load_account(&self, id: &str) -> Result<Option<PaperAccount>, PapertradeError> {
        Ok(self.accounts.get(id).cloned())
    }

    fn save_order(&mut self, order: &PaperOrder) -> Result<(), PapertradeError> {
        self.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    fn load_orders(&self) -> Result<Vec<PaperOrder>, PapertradeError> {
        let mut orders: Vec<PaperOrder> = self.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn save_position(&mut self, position: &PaperPosition) -> Result<(), PapertradeError> {
        self.positions.insert(position.id.clone(), position.clone());
        Ok(())
    }

    fn load_position(&self, id: &str) -> Result<Option<PaperPosition>, PapertradeError> {
        Ok(self.positions.get(id).cloned())
    }

    fn load_positions(&self) -> Result<Vec<PaperPosition>, PapertradeError> {
        let mut positions: Vec<PaperPosition> = self.positions.values().cloned().collect();
        positions.sort_by_key(|p| p.opened_at);
        Ok(positions)
    }

    fn clear(&mut self) -> Result<(), PapertradeError> {
        self.accounts.clear();
        self.orders.clear();
        self.positions.clear();
        Ok(())
    }
}
