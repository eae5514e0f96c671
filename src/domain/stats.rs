//! Trade statistics over closed positions.

use crate::domain::position::PaperPosition;

/// Journal summary numbers computed from realized fills.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl TradeStats {
    /// Compute over the closed subset of the given positions; open positions
    /// are ignored.
    pub fn compute<'a>(positions: impl IntoIterator<Item = &'a PaperPosition>) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for position in positions {
            let Some(pnl) = position.realized_pnl else {
                continue;
            };
            if pnl > 0.0 {
                wins += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                losses += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            } else {
                breakeven += 1;
            }
        }

        let total_trades = wins + losses + breakeven;
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };
        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let avg_win = if wins > 0 { total_wins / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        TradeStats {
            total_trades,
            wins,
            losses,
            breakeven,
            win_rate,
            profit_factor,
            total_pnl: total_wins - total_losses,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}
