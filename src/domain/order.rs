//! Order records and their typed enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Only `Filled` is produced by the engine's synchronous market path; the
/// remaining states exist for stores and future order types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperOrder {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub status: OrderStatus,
    pub filled_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl PaperOrder {
    /// A market order filled synchronously at the quoted price.
    pub fn market_fill(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            status: OrderStatus::Filled,
            filled_price: Some(price),
            created_at: at,
            filled_at: Some(at),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}
