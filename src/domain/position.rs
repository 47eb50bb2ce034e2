//! Single-slot position lifecycle for the backtest.
//!
//! A position is entered at the open of its entry bar. Under A-share T+1
//! rules it cannot be sold the same day, so exits are checked from the next
//! bar on, in priority order: stop-loss, take-profit, holding period.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::bar::DailyBar;
use crate::domain::mode_chain::ModeTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    HoldingElapsed,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::HoldingElapsed => "holding_elapsed",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: i64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub holding_days: u32,
}

impl Position {
    /// Stop triggers when the bar trades at or below it; the fill is the
    /// worse of the open and the stop.
    pub fn stop_fill(&self, bar: &DailyBar) -> Option<f64> {
        if self.stop_loss > 0.0 && bar.low <= self.stop_loss {
            Some(bar.open.min(self.stop_loss))
        } else {
            None
        }
    }

    pub fn take_fill(&self, bar: &DailyBar) -> Option<f64> {
        if self.take_profit > 0.0 && bar.high >= self.take_profit {
            Some(bar.open.max(self.take_profit))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitSignal {
    pub date: NaiveDate,
    pub price: f64,
    pub reason: ExitReason,
    /// Bars held after the entry bar.
    pub bars_held: usize,
}

/// Scan `bars` (entry bar first) for the position's exit. Without an exit
/// trigger the position closes at the last bar's close.
pub fn find_exit(position: &Position, bars: &[DailyBar]) -> Option<ExitSignal> {
    let last = bars.last()?;
    for (held, bar) in bars.iter().enumerate().skip(1) {
        if let Some(price) = position.stop_fill(bar) {
            return Some(ExitSignal {
                date: bar.date,
                price,
                reason: ExitReason::StopLoss,
                bars_held: held,
            });
        }
        if let Some(price) = position.take_fill(bar) {
            return Some(ExitSignal {
                date: bar.date,
                price,
                reason: ExitReason::TakeProfit,
                bars_held: held,
            });
        }
        if held >= position.holding_days as usize {
            return Some(ExitSignal {
                date: bar.date,
                price: bar.close,
                reason: ExitReason::HoldingElapsed,
                bars_held: held,
            });
        }
    }
    Some(ExitSignal {
        date: last.date,
        price: last.close,
        reason: ExitReason::EndOfData,
        bars_held: bars.len() - 1,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub decision_date: NaiveDate,
    pub symbol: String,
    pub name: String,
    pub tier: ModeTier,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub quantity: i64,
    pub bars_held: usize,
    pub gross_return: f64,
    pub net_return: f64,
    pub fees: f64,
}
