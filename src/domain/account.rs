//! Simulated account state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One simulated cash account. Mutated only by the paper trading engine on
/// position close and reset; margin is never locked at open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperAccount {
    pub id: String,
    pub balance: f64,
    pub initial_balance: f64,
    pub realized_pnl: f64,
    pub created_at: DateTime<Utc>,
}

impl PaperAccount {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            balance: initial_balance,
            initial_balance,
            realized_pnl: 0.0,
            created_at: Utc::now(),
        }
    }

    /// (balance - initial) / initial * 100, or 0 for a zero initial balance.
    pub fn total_return_percent(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        (self.balance - self.initial_balance) / self.initial_balance * 100.0
    }

    /// Credit a realized fill to both the cash balance and the cumulative
    /// realized P&L.
    pub fn apply_realized(&mut self, pnl: f64) {
        self.balance += pnl;
        self.realized_pnl += pnl;
    }

    /// Back to the given starting amount with no realized P&L. Id and
    /// creation time survive the reset.
    pub fn reset(&mut self, initial_balance: f64) {
        self.balance = initial_balance;
        self.initial_balance = initial_balance;
        self.realized_pnl = 0.0;
    }
}
