#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use daypick::domain::bar::{DailyBar, StockInfo};
use daypick::domain::config::EngineConfig;
use daypick::domain::error::DaypickError;
use daypick::ports::data_port::DataPort;
use std::collections::HashMap;

pub const INDEX: &str = "000300";

pub struct MockDataPort {
    pub stocks: Vec<StockInfo>,
    pub bars: HashMap<String, Vec<DailyBar>>,
    pub index: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
    pub calendar_symbol: String,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            stocks: Vec::new(),
            bars: HashMap::new(),
            index: HashMap::new(),
            errors: HashMap::new(),
            calendar_symbol: INDEX.to_string(),
        }
    }

    /// Listed stock with its daily bars.
    pub fn with_stock(mut self, symbol: &str, name: &str, bars: Vec<DailyBar>) -> Self {
        self.stocks.push(StockInfo::new(symbol, name));
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    /// Bars for a symbol that is not in the listing (e.g. a freshness probe).
    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_index(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.index.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn slice(
        source: &HashMap<String, Vec<DailyBar>>,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        let bars = source.get(symbol).ok_or_else(|| DaypickError::NoData {
            symbol: symbol.to_string(),
        })?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect())
    }
}

impl DataPort for MockDataPort {
    fn list_stocks(&self) -> Result<Vec<StockInfo>, DaypickError> {
        Ok(self.stocks.clone())
    }

    fn trade_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, DaypickError> {
        let bars = Self::slice(&self.index, &self.calendar_symbol, start, end)?;
        Ok(bars.into_iter().map(|b| b.date).collect())
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DaypickError::DataSource {
                reason: reason.clone(),
            });
        }
        Self::slice(&self.bars, symbol, start, end)
    }

    fn fetch_index_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        Self::slice(&self.index, symbol, start, end)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn series_start() -> NaiveDate {
    date("2025-01-01")
}

/// One bar per calendar day from 2025-01-01. Daily returns repeat `cycle`;
/// each bar opens at the previous close.
pub fn cycle_bars(count: usize, start_price: f64, cycle: &[f64], volume: f64) -> Vec<DailyBar> {
    let mut prev = start_price;
    (0..count)
        .map(|i| {
            let open = prev;
            let close = open * (1.0 + cycle[i % cycle.len()]);
            prev = close;
            DailyBar {
                date: series_start() + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.005,
                low: open.min(close) * 0.995,
                close,
                volume,
                turnover_rate: None,
            }
        })
        .collect()
}

pub const STRONG_UPTREND: [f64; 3] = [0.02, 0.02, -0.02];
pub const MILD_UPTREND: [f64; 3] = [0.015, 0.015, -0.015];
pub const DOWNTREND: [f64; 3] = [-0.02, -0.02, 0.02];

/// Defaults with the freshness probe off and unrounded prices.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.freshness.enabled = false;
    config.risk_targets.price_tick = 0.0;
    config.reporting.enabled = false;
    config
}

pub fn bars_up_to(bars: &[DailyBar], date: NaiveDate) -> Vec<DailyBar> {
    bars.iter().filter(|b| b.date <= date).cloned().collect()
}
