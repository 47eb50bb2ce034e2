//! Market regime classification from a benchmark index.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::bar::SymbolSeries;
use crate::domain::config::MarketConfig;
use crate::domain::error::DaypickError;
use crate::domain::indicator::stats::{pct_change, trailing_mean};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeState {
    Bull,
    Neutral,
    Bear,
}

impl RegimeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegimeState::Bull => "bull",
            RegimeState::Neutral => "neutral",
            RegimeState::Bear => "bear",
        }
    }

    /// Bear and neutral markets trigger the weak-market tightening.
    pub fn is_weak(&self) -> bool {
        !matches!(self, RegimeState::Bull)
    }
}

impl fmt::Display for RegimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime label with the benchmark readings it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRegime {
    pub date: NaiveDate,
    pub index_symbol: String,
    pub state: RegimeState,
    pub close: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub mom20: f64,
    /// Fractional decline of the close from the window's peak close.
    pub drawdown: f64,
}

/// Classify the market at `date` using benchmark bars dated on or before it.
pub fn classify_regime(
    index: &SymbolSeries,
    date: NaiveDate,
    config: &MarketConfig,
) -> Result<MarketRegime, DaypickError> {
    let index_symbol = index.symbol.as_str();
    let history = index.up_to(date);
    let window = &history[history.len().saturating_sub(config.lookback_days)..];

    let minimum = config.min_bars.max(60);
    if window.len() < minimum {
        return Err(DaypickError::RegimeUndetermined {
            index: index_symbol.to_string(),
            date,
            bars: window.len(),
            minimum,
        });
    }

    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
    let n = closes.len();
    let close = closes[n - 1];
    let undetermined = || DaypickError::RegimeUndetermined {
        index: index_symbol.to_string(),
        date,
        bars: n,
        minimum,
    };
    let ma20 = trailing_mean(&closes, 20).ok_or_else(undetermined)?;
    let ma60 = trailing_mean(&closes, 60).ok_or_else(undetermined)?;
    let mom20 = pct_change(close, closes[n - 21]);
    let peak = closes.iter().copied().fold(f64::MIN, f64::max);
    let drawdown = if peak > 0.0 { (peak - close) / peak } else { 0.0 };

    let state = if drawdown >= config.bear_drawdown || (close < ma20 && mom20 < 0.0) {
        RegimeState::Bear
    } else if close > ma20 && ma20 > ma60 && mom20 > 0.0 {
        RegimeState::Bull
    } else {
        RegimeState::Neutral
    };

    Ok(MarketRegime {
        date,
        index_symbol: index_symbol.to_string(),
        state,
        close,
        ma20,
        ma60,
        mom20,
        drawdown,
    })
}

/// Per-run memo so each date's regime is computed once.
#[derive(Debug, Default)]
pub struct RegimeCache {
    entries: HashMap<NaiveDate, MarketRegime>,
}

impl RegimeCache {
    pub fn get_or_try_insert_with<F>(
        &mut self,
        date: NaiveDate,
        compute: F,
    ) -> Result<MarketRegime, DaypickError>
    where
        F: FnOnce() -> Result<MarketRegime, DaypickError>,
    {
        if let Some(hit) = self.entries.get(&date) {
            return Ok(hit.clone());
        }
        let regime = compute()?;
        self.entries.insert(date, regime.clone());
        Ok(regime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::DailyBar;

    fn make_bars(closes: &[f64]) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
                turnover_rate: None,
            })
            .collect()
    }

    fn index(bars: &[DailyBar]) -> SymbolSeries {
        SymbolSeries::new("000300", bars.to_vec())
    }

    fn last_date(bars: &[DailyBar]) -> NaiveDate {
        bars.last().unwrap().date
    }

    #[test]
    fn steady_uptrend_is_bull() {
        let closes: Vec<f64> = (0..100).map(|i| 3000.0 + 5.0 * i as f64).collect();
        let bars = make_bars(&closes);
        let regime = classify_regime(&index(&bars), last_date(&bars), &MarketConfig::default())
            .unwrap();
        assert_eq!(regime.state, RegimeState::Bull);
        assert!(regime.drawdown.abs() < f64::EPSILON);
    }

    #[test]
    fn steady_downtrend_is_bear() {
        let closes: Vec<f64> = (0..100).map(|i| 4000.0 - 5.0 * i as f64).collect();
        let bars = make_bars(&closes);
        let regime = classify_regime(&index(&bars), last_date(&bars), &MarketConfig::default())
            .unwrap();
        assert_eq!(regime.state, RegimeState::Bear);
    }

    #[test]
    fn deep_drawdown_is_bear_even_when_rebounding() {
        // Crash from 5000 to 3000, then a short rebound above MA20.
        let mut closes: Vec<f64> = vec![5000.0; 40];
        closes.extend((0..40).map(|i| 5000.0 - 50.0 * i as f64));
        closes.extend((0..20).map(|i| 3050.0 + 10.0 * i as f64));
        let bars = make_bars(&closes);
        let regime = classify_regime(&index(&bars), last_date(&bars), &MarketConfig::default())
            .unwrap();
        assert!(regime.drawdown > 0.20);
        assert_eq!(regime.state, RegimeState::Bear);
    }

    #[test]
    fn flat_market_is_neutral() {
        let bars = make_bars(&[3500.0; 100]);
        let regime = classify_regime(&index(&bars), last_date(&bars), &MarketConfig::default())
            .unwrap();
        assert_eq!(regime.state, RegimeState::Neutral);
    }

    #[test]
    fn too_few_bars_is_undetermined() {
        let bars = make_bars(&[3500.0; 50]);
        let err = classify_regime(&index(&bars), last_date(&bars), &MarketConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DaypickError::RegimeUndetermined { bars: 50, .. }
        ));
    }

    #[test]
    fn ignores_bars_after_date() {
        let mut closes: Vec<f64> = (0..100).map(|i| 3000.0 + 5.0 * i as f64).collect();
        closes.extend((0..30).map(|i| 3495.0 - 40.0 * i as f64));
        let bars = make_bars(&closes);
        let date = bars[99].date;
        let regime = classify_regime(&index(&bars), date, &MarketConfig::default()).unwrap();
        assert_eq!(regime.state, RegimeState::Bull);
        assert_eq!(regime.date, date);
    }

    #[test]
    fn cache_computes_once_per_date() {
        let bars = make_bars(&[3500.0; 100]);
        let date = last_date(&bars);
        let mut cache = RegimeCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .get_or_try_insert_with(date, || {
                    calls += 1;
                    classify_regime(&index(&bars), date, &MarketConfig::default())
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
    }
}
