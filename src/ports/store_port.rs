//! Record store port trait.

use crate::domain::account::PaperAccount;
use crate::domain::error::PapertradeError;
use crate::domain::order::PaperOrder;
use crate::domain::position::PaperPosition;

/// Durable storage for the engine's records, keyed by id. Any
/// schema-evolving key-value or document store can sit behind this; the
/// engine never assumes a binary layout.
pub trait RecordStore {
    fn save_account(&mut self, account: &PaperAccount) -> Result<(), PapertradeError>;
    fn load_account(&self, id: &str) -> Result<Option<PaperAccount>, PapertradeError>;

    fn save_order(&mut self, order: &PaperOrder) -> Result<(), PapertradeError>;
    fn load_orders(&self) -> Result<Vec<PaperOrder>, PapertradeError>;

    fn save_position(&mut self, position: &PaperPosition) -> Result<(), PapertradeError>;
    fn load_position(&self, id: &str) -> Result<Option<PaperPosition>, PapertradeError>;
    fn load_positions(&self) -> Result<Vec<PaperPosition>, PapertradeError>;

    /// Remove everything. Used by account reset.
    fn clear(&mut self) -> Result<(), PapertradeError>;
}
