//! Per-symbol inputs prepared once per evaluation date.

use serde::Serialize;

use crate::domain::bar::{DailyBar, StockInfo};
use crate::domain::indicator::{IndicatorSet, compute_indicators};

/// Listing row, bar count and indicators for one symbol at the signal date.
/// `indicators` is `None` when the series is too short to compute them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSnapshot {
    pub info: StockInfo,
    pub bar_count: usize,
    pub indicators: Option<IndicatorSet>,
}

impl SymbolSnapshot {
    /// `bars` must already be cut at the signal date.
    pub fn build(info: StockInfo, bars: &[DailyBar]) -> Self {
        let indicators = compute_indicators(&info.symbol, bars).ok();
        SymbolSnapshot {
            info,
            bar_count: bars.len(),
            indicators,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }
}
