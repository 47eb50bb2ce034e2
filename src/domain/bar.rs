//! Daily bars, stock listings and per-symbol bar series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
}

impl DailyBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// One row of the stock listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub is_st: bool,
    #[serde(default)]
    pub is_paused: bool,
}

impl StockInfo {
    pub fn new(symbol: &str, name: &str) -> Self {
        StockInfo {
            symbol: symbol.to_string(),
            name: name.to_string(),
            is_st: false,
            is_paused: false,
        }
    }
}

/// Bars for one symbol, ordered by date with no duplicate dates.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    bars: Vec<DailyBar>,
}

impl SymbolSeries {
    pub fn new(symbol: &str, mut bars: Vec<DailyBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        SymbolSeries {
            symbol: symbol.to_string(),
            bars,
        }
    }

    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    /// Bars dated on or before `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[DailyBar] {
        let end = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..end]
    }

    /// Bars dated on or after `date`.
    pub fn from_date(&self, date: NaiveDate) -> &[DailyBar] {
        let start = self.bars.partition_point(|b| b.date < date);
        &self.bars[start..]
    }

    pub fn into_bars(self) -> Vec<DailyBar> {
        self.bars
    }
}
