//! JSON-file record store, for restart recovery.
//!
//! Keeps all records in memory and rewrites the backing file on every
//! mutation; the dataset is one user's session, so whole-file writes stay
//! cheap and the file is always a complete snapshot.

use crate::domain::account::PaperAccount;
use crate::domain::error::PapertradeError;
use crate::domain::order::PaperOrder;
use crate::domain::position::PaperPosition;
use crate::ports::store_port::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    accounts: HashMap<String, PaperAccount>,
    orders: HashMap<String, PaperOrder>,
    positions: HashMap<String, PaperPosition>,
}

pub struct JsonStoreAdapter {
    path: PathBuf,
    state: StoreState,
}

impl JsonStoreAdapter {
    /// Open a store at the given path, loading any existing snapshot.
    pub fn open(path: PathBuf) -> Result<Self, PapertradeError> {
        let state = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| PapertradeError::Store {
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;
            serde_json::from_str(&content).map_err(|e| PapertradeError::Store {
                reason: format!("failed to parse {}: {}", path.display(), e),
            })?
        } else {
            StoreState::default()
        };
        Ok(Self { path, state })
    }

    fn flush(&self) -> Result<(), PapertradeError> {
        let content =
            serde_json::to_string_pretty(&self.state).map_err(|e| PapertradeError::Store {
                reason: format!("failed to serialize store: {}", e),
            })?;
        fs::write(&self.path, content).map_err(|e| PapertradeError::Store {
            reason: format!("failed to write {}: {}", self.path.display(), e),
        })
    }
}

impl RecordStore for JsonStoreAdapter {
    fn save_account(&mut self, account: &PaperAccount) -> Result<(), PapertradeError> {
        self.state
            .accounts
            .insert(account.id.clone(), account.clone());
        self.flush()
    }

    fn load_account(&self, id: &str) -> Result<Option<PaperAccount>, PapertradeError> {
        Ok(self.state.accounts.get(id).cloned())
    }

    fn save_order(&mut self, order: &PaperOrder) -> Result<(), PapertradeError> {
        self.state.orders.insert(order.id.clone(), order.clone());
        self.flush()
    }

    fn load_orders(&self) -> Result<Vec<PaperOrder>, PapertradeError> {
        let mut orders: Vec<PaperOrder> = self.state.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn save_position(&mut self, position: &PaperPosition) -> Result<(), PapertradeError> {
        self.state
            .positions
            .insert(position.id.clone(), position.clone());
        self.flush()
    }

    fn load_position(&self, id: &str) -> Result<Option<PaperPosition>, PapertradeError> {
        Ok(self.state.positions.get(id).cloned())
    }

    fn load_positions(&self) -> Result<Vec<PaperPosition>, PapertradeError> {
        let mut positions: Vec<PaperPosition> = self.state.positions.values().cloned().collect();
        positions.sort_by_key(|p| p.opened_at);
        Ok(positions)
    }

    fn clear(&mut self) -> Result<(), PapertradeError> {
        self.state = StoreState::default();
        self.flush()
    }
}
