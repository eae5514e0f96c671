//! Chart-space drawing objects.
//!
//! Drawings live in price/time coordinates, independent of any screen
//! mapping. The drawing kinds form a closed sum type; shared behavior
//! (`id`, `is_near_point`, `anchor_points`) dispatches per variant. The
//! collection owns its drawings and synchronizes position tools with engine
//! events only through stored position ids, never shared references.

pub mod position_tool;

pub use position_tool::{PositionToolDrawing, ToolHandle, ToolStatus};

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One price/time coordinate on the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// A straight segment between two chart points.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendLine {
    pub id: String,
    pub start: ChartPoint,
    pub end: ChartPoint,
}

impl TrendLine {
    pub fn new(start: ChartPoint, end: ChartPoint) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start,
            end,
        }
    }

    /// Price of the segment at the given time, if the time is inside the
    /// segment's span.
    fn price_at(&self, time: DateTime<Utc>) -> Option<f64> {
        let (a, b) = if self.start.time <= self.end.time {
            (&self.start, &self.end)
        } else {
            (&self.end, &self.start)
        };
        if time < a.time || time > b.time {
            return None;
        }
        let span = (b.time - a.time).num_milliseconds();
        if span == 0 {
            return Some(a.price);
        }
        let progress = (time - a.time).num_milliseconds() as f64 / span as f64;
        Some(a.price + (b.price - a.price) * progress)
    }

    pub fn is_near_point(&self, point: &ChartPoint, tolerance: f64) -> bool {
        match self.price_at(point.time) {
            Some(price) => (point.price - price).abs() <= tolerance,
            None => false,
        }
    }
}

/// A horizontal level across all time, anchored where it was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalLine {
    pub id: String,
    pub price: f64,
    pub anchor_time: DateTime<Utc>,
}

impl HorizontalLine {
    pub fn new(price: f64, anchor_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            price,
            anchor_time,
        }
    }

    pub fn is_near_point(&self, point: &ChartPoint, tolerance: f64) -> bool {
        (point.price - self.price).abs() <= tolerance
    }
}

/// Closed set of drawing kinds, each carrying its own payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawing {
    TrendLine(TrendLine),
    HorizontalLine(HorizontalLine),
    PositionTool(PositionToolDrawing),
}

impl Drawing {
    pub fn id(&self) -> &str {
        match self {
            Drawing::TrendLine(line) => &line.id,
            Drawing::HorizontalLine(line) => &line.id,
            Drawing::PositionTool(tool) => &tool.id,
        }
    }

    pub fn is_near_point(&self, point: &ChartPoint, tolerance: f64) -> bool {
        match self {
            Drawing::TrendLine(line) => line.is_near_point(point, tolerance),
            Drawing::HorizontalLine(line) => line.is_near_point(point, tolerance),
            Drawing::PositionTool(tool) => tool.is_near_point(point, tolerance),
        }
    }

    /// Grab points used for selection affordances.
    pub fn anchor_points(&self) -> Vec<ChartPoint> {
        match self {
            Drawing::TrendLine(line) => vec![line.start, line.end],
            Drawing::HorizontalLine(line) => vec![ChartPoint {
                time: line.anchor_time,
                price: line.price,
            }],
            Drawing::PositionTool(tool) => vec![
                tool.entry,
                ChartPoint {
                    time: tool.entry.time,
                    price: tool.stop_loss_price,
                },
                ChartPoint {
                    time: tool.entry.time,
                    price: tool.take_profit_price,
                },
            ],
        }
    }
}

/// Owns all drawings for one chart, keyed by id.
#[derive(Debug, Default)]
pub struct DrawingCollection {
    drawings: HashMap<String, Drawing>,
}

impl DrawingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, drawing: Drawing) -> String {
        let id = drawing.id().to_string();
        self.drawings.insert(id.clone(), drawing);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Drawing> {
        self.drawings.get(id)
    }

    /// Deleting is always allowed and never touches any linked position.
    pub fn remove(&mut self, id: &str) -> Option<Drawing> {
        self.drawings.remove(id)
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawing> {
        self.drawings.values()
    }

    pub fn position_tool(&self, id: &str) -> Option<&PositionToolDrawing> {
        match self.drawings.get(id) {
            Some(Drawing::PositionTool(tool)) => Some(tool),
            _ => None,
        }
    }

    pub fn position_tool_mut(&mut self, id: &str) -> Option<&mut PositionToolDrawing> {
        match self.drawings.get_mut(id) {
            Some(Drawing::PositionTool(tool)) => Some(tool),
            _ => None,
        }
    }

    /// The tool holding a back-reference to the given position, if any.
    pub fn tool_for_position(&self, position_id: &str) -> Option<&PositionToolDrawing> {
        self.drawings.values().find_map(|d| match d {
            Drawing::PositionTool(tool)
                if tool.linked_position_id.as_deref() == Some(position_id) =>
            {
                Some(tool)
            }
            _ => None,
        })
    }

    /// Drawings under the query point, for selection.
    pub fn drawings_near(&self, point: &ChartPoint, tolerance: f64) -> Vec<&Drawing> {
        self.drawings
            .values()
            .filter(|d| d.is_near_point(point, tolerance))
            .collect()
    }

    /// Close the tool linked to a position that just closed. Returns whether
    /// a tool was updated. Safe to call for positions with no linked tool.
    pub fn sync_position_closed(
        &mut self,
        position_id: &str,
        exit_price: f64,
        realized_pnl: f64,
    ) -> bool {
        let tool_id = self
            .tool_for_position(position_id)
            .map(|tool| tool.id.clone());
        let Some(tool_id) = tool_id else {
            return false;
        };
        match self.position_tool_mut(&tool_id) {
            Some(tool) => tool.mark_closed(exit_price, realized_pnl).is_ok(),
            None => false,
        }
    }
}
