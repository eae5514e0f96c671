//! Position tracking and trigger predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short; the sign of price movement in the
    /// position's favour.
    pub fn direction(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// One simulated trade. Open while `closed_at` is unset; once closed, the
/// exit fields are set together and never change again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperPosition {
    pub id: String,
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub realized_pnl: Option<f64>,
    /// Back-reference to a linked position tool drawing, if any. The two
    /// lifecycles stay independent; this id is the only connection.
    pub tool_id: Option<String>,
}

impl PaperPosition {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        quantity: f64,
        entry_price: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        opened_at: DateTime<Utc>,
        tool_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            stop_loss,
            take_profit,
            opened_at,
            closed_at: None,
            exit_price: None,
            realized_pnl: None,
            tool_id,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// (price - entry) * quantity, sign-flipped for shorts.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.side.direction()
    }

    pub fn should_trigger_stop_loss(&self, price: f64) -> bool {
        let Some(stop_loss) = self.stop_loss else {
            return false;
        };
        if self.is_long() {
            price <= stop_loss
        } else {
            price >= stop_loss
        }
    }

    pub fn should_trigger_take_profit(&self, price: f64) -> bool {
        let Some(take_profit) = self.take_profit else {
            return false;
        };
        if self.is_long() {
            price >= take_profit
        } else {
            price <= take_profit
        }
    }

    /// Commit the closing transition: sets exit price, realized P&L, and the
    /// close time together, returning the realized P&L. Returns `None` if the
    /// position is already closed, enforcing at-most-once closure.
    pub fn close(&mut self, exit_price: f64, closed_at: DateTime<Utc>) -> Option<f64> {
        if self.closed_at.is_some() {
            return None;
        }
        let pnl = self.unrealized_pnl(exit_price);
        self.closed_at = Some(closed_at);
        self.exit_price = Some(exit_price);
        self.realized_pnl = Some(pnl);
        Some(pnl)
    }
}
