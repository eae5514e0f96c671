//! Position tool drawing: entry/stop-loss/take-profit price levels spanning
//! a time range, promotable into a live paper position.
//!
//! State machine: draft --(link to position id)--> active --(position
//! closes)--> closed. Draft and active tools may also be deleted outright;
//! deletion never touches the linked position.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::drawing::ChartPoint;
use crate::domain::error::PapertradeError;

pub const DEFAULT_STOP_LOSS_PCT: f64 = 2.0;
pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Draft,
    Active,
    Closed,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Draft => write!(f, "draft"),
            ToolStatus::Active => write!(f, "active"),
            ToolStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Edit handle resolved by hit-testing, in priority order stop-loss →
/// take-profit → entry line, then body/right-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolHandle {
    Body,
    RightEdge,
    EntryLine,
    EntryLeft,
    EntryRight,
    StopLossLine,
    StopLossLeft,
    StopLossRight,
    TakeProfitLine,
    TakeProfitLeft,
    TakeProfitRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionToolDrawing {
    pub id: String,
    pub entry: ChartPoint,
    pub end_time: DateTime<Utc>,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub quantity: f64,
    pub is_long: bool,
    pub status: ToolStatus,
    pub linked_position_id: Option<String>,
    pub exit_price: Option<f64>,
    pub realized_pnl: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PositionToolDrawing {
    /// Long tool with SL below entry and TP above, from percentage offsets.
    pub fn create_long_with_offsets(
        entry: ChartPoint,
        end_time: DateTime<Utc>,
        quantity: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Self {
        let stop_loss_price = entry.price * (1.0 - stop_loss_pct / 100.0);
        let take_profit_price = entry.price * (1.0 + take_profit_pct / 100.0);
        Self::new(entry, end_time, quantity, true, stop_loss_price, take_profit_price)
    }

    /// Short tool with SL above entry and TP below, from percentage offsets.
    pub fn create_short_with_offsets(
        entry: ChartPoint,
        end_time: DateTime<Utc>,
        quantity: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Self {
        let stop_loss_price = entry.price * (1.0 + stop_loss_pct / 100.0);
        let take_profit_price = entry.price * (1.0 - take_profit_pct / 100.0);
        Self::new(entry, end_time, quantity, false, stop_loss_price, take_profit_price)
    }

    /// Long tool with the default 2% risk / 4% reward offsets.
    pub fn create_long(entry: ChartPoint, end_time: DateTime<Utc>, quantity: f64) -> Self {
        Self::create_long_with_offsets(
            entry,
            end_time,
            quantity,
            DEFAULT_STOP_LOSS_PCT,
            DEFAULT_TAKE_PROFIT_PCT,
        )
    }

    /// Short tool with the default 2% risk / 4% reward offsets.
    pub fn create_short(entry: ChartPoint, end_time: DateTime<Utc>, quantity: f64) -> Self {
        Self::create_short_with_offsets(
            entry,
            end_time,
            quantity,
            DEFAULT_STOP_LOSS_PCT,
            DEFAULT_TAKE_PROFIT_PCT,
        )
    }

    fn new(
        entry: ChartPoint,
        end_time: DateTime<Utc>,
        quantity: f64,
        is_long: bool,
        stop_loss_price: f64,
        take_profit_price: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            entry,
            end_time,
            stop_loss_price,
            take_profit_price,
            quantity,
            is_long,
            status: ToolStatus::Draft,
            linked_position_id: None,
            exit_price: None,
            realized_pnl: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ── Derived metrics ─────────────────────────────────────────────

    /// Long requires stop < entry < target; short requires target < entry < stop.
    pub fn is_valid(&self) -> bool {
        if self.is_long {
            self.stop_loss_price < self.entry.price && self.entry.price < self.take_profit_price
        } else {
            self.take_profit_price < self.entry.price && self.entry.price < self.stop_loss_price
        }
    }

    pub fn risk_per_share(&self) -> f64 {
        (self.entry.price - self.stop_loss_price).abs()
    }

    pub fn reward_per_share(&self) -> f64 {
        (self.take_profit_price - self.entry.price).abs()
    }

    /// reward / risk, 0 when the risk side is degenerate.
    pub fn risk_reward_ratio(&self) -> f64 {
        let risk = self.risk_per_share();
        if risk == 0.0 {
            return 0.0;
        }
        self.reward_per_share() / risk
    }

    pub fn total_risk(&self) -> f64 {
        self.risk_per_share() * self.quantity
    }

    pub fn total_reward(&self) -> f64 {
        self.reward_per_share() * self.quantity
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.entry.time
    }

    /// Min/max over the three price levels.
    pub fn price_envelope(&self) -> (f64, f64) {
        let min = self
            .entry
            .price
            .min(self.stop_loss_price)
            .min(self.take_profit_price);
        let max = self
            .entry
            .price
            .max(self.stop_loss_price)
            .max(self.take_profit_price);
        (min, max)
    }

    // ── State machine ───────────────────────────────────────────────

    /// Draft → active, linking the backing position id exactly once. Tools
    /// failing level validation never reach active.
    pub fn activate(&mut self, position_id: &str) -> Result<(), PapertradeError> {
        if self.status != ToolStatus::Draft || self.linked_position_id.is_some() {
            return Err(PapertradeError::InvalidToolState {
                id: self.id.clone(),
                action: "activate".into(),
                status: self.status.to_string(),
            });
        }
        if !self.is_valid() {
            return Err(PapertradeError::InvalidTool {
                id: self.id.clone(),
            });
        }
        self.status = ToolStatus::Active;
        self.linked_position_id = Some(position_id.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Active → closed, recording the linked position's exit.
    pub fn mark_closed(&mut self, exit_price: f64, realized_pnl: f64) -> Result<(), PapertradeError> {
        if self.status != ToolStatus::Active {
            return Err(PapertradeError::InvalidToolState {
                id: self.id.clone(),
                action: "close".into(),
                status: self.status.to_string(),
            });
        }
        self.status = ToolStatus::Closed;
        self.exit_price = Some(exit_price);
        self.realized_pnl = Some(realized_pnl);
        self.updated_at = Utc::now();
        Ok(())
    }

    // ── Hit-testing ─────────────────────────────────────────────────

    fn in_time_span(&self, time: DateTime<Utc>) -> bool {
        time >= self.entry.time && time <= self.end_time
    }

    /// Selection test: the query time must fall inside the tool's span and
    /// the price must sit within `tolerance` of one of the three levels or
    /// inside the envelope they span (± tolerance).
    pub fn is_near_point(&self, point: &ChartPoint, tolerance: f64) -> bool {
        if !self.in_time_span(point.time) {
            return false;
        }
        let near_level = (point.price - self.entry.price).abs() <= tolerance
            || (point.price - self.stop_loss_price).abs() <= tolerance
            || (point.price - self.take_profit_price).abs() <= tolerance;
        if near_level {
            return true;
        }
        let (min, max) = self.price_envelope();
        point.price >= min - tolerance && point.price <= max + tolerance
    }

    /// Resolve the edit handle under a query point, or `None`. Price lines
    /// are checked stop-loss → take-profit → entry; a hit near the left or
    /// right time edge selects the edge sub-handle instead of the whole
    /// line. Falls back to body/right-edge hit-testing against the price
    /// envelope.
    pub fn handle_at(
        &self,
        point: &ChartPoint,
        price_tolerance: f64,
        time_tolerance: Duration,
    ) -> Option<ToolHandle> {
        let near_start = (point.time - self.entry.time).abs() <= time_tolerance;
        let near_end = (point.time - self.end_time).abs() <= time_tolerance;
        let in_span = self.in_time_span(point.time);

        let lines = [
            (
                self.stop_loss_price,
                ToolHandle::StopLossLeft,
                ToolHandle::StopLossRight,
                ToolHandle::StopLossLine,
            ),
            (
                self.take_profit_price,
                ToolHandle::TakeProfitLeft,
                ToolHandle::TakeProfitRight,
                ToolHandle::TakeProfitLine,
            ),
            (
                self.entry.price,
                ToolHandle::EntryLeft,
                ToolHandle::EntryRight,
                ToolHandle::EntryLine,
            ),
        ];

        for (level, left, right, line) in lines {
            if (point.price - level).abs() > price_tolerance {
                continue;
            }
            if near_start {
                return Some(left);
            }
            if near_end {
                return Some(right);
            }
            if in_span {
                return Some(line);
            }
        }

        if in_span {
            let (min, max) = self.price_envelope();
            if point.price >= min - price_tolerance && point.price <= max + price_tolerance {
                return Some(if near_end {
                    ToolHandle::RightEdge
                } else {
                    ToolHandle::Body
                });
            }
        }

        None
    }
}
