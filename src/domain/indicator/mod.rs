//! Technical indicators evaluated at the latest bar of a series.
//!
//! - `IndicatorSet`: every indicator the filter and scorer consume
//! - `compute_indicators`: builds the set from bars ending at the signal date
//!
//! A series needs at least `MIN_INDICATOR_BARS` bars. The 60-bar moving
//! average is optional and reported as `None` on shorter series.

pub mod atr;
pub mod rsi;
pub mod stats;
pub mod volume;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::bar::DailyBar;
use crate::domain::error::DaypickError;

use stats::{pct_change, sample_std, trailing_mean};

/// Hard minimum history: 20-bar MA plus its value five bars earlier.
pub const MIN_INDICATOR_BARS: usize = 25;

pub const MA_SHORT: usize = 20;
pub const MA_LONG: usize = 60;
pub const SLOPE_LAG: usize = 5;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const VOLATILITY_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub ma20: f64,
    pub ma60: Option<f64>,
    /// ma20 relative to its value five bars earlier.
    pub ma20_slope5: f64,
    pub mom5: f64,
    pub mom20: f64,
    /// Sample std of the last 20 daily returns.
    pub vol20_std: f64,
    pub vol_ratio_5_20: f64,
    pub volume_zscore20: f64,
    pub atr14: f64,
    pub rsi14: f64,
    /// Turnover of the latest bar, when the data source reports it.
    pub turnover_rate: Option<f64>,
}

impl IndicatorSet {
    /// ma60, falling back to ma20 on series too short for the long average.
    pub fn ma60_or_ma20(&self) -> f64 {
        self.ma60.unwrap_or(self.ma20)
    }
}

pub fn compute_indicators(symbol: &str, bars: &[DailyBar]) -> Result<IndicatorSet, DaypickError> {
    let n = bars.len();
    let insufficient = || DaypickError::InsufficientHistory {
        symbol: symbol.to_string(),
        bars: n,
        minimum: MIN_INDICATOR_BARS,
    };
    if n < MIN_INDICATOR_BARS {
        return Err(insufficient());
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let last = &bars[n - 1];

    let ma20 = trailing_mean(&closes, MA_SHORT).ok_or_else(insufficient)?;
    let ma20_prev = trailing_mean(&closes[..n - SLOPE_LAG], MA_SHORT).ok_or_else(insufficient)?;
    let ma60 = trailing_mean(&closes, MA_LONG);

    let returns: Vec<f64> = closes[n - VOLATILITY_WINDOW - 1..]
        .windows(2)
        .map(|pair| pct_change(pair[1], pair[0]))
        .collect();

    Ok(IndicatorSet {
        date: last.date,
        close: last.close,
        volume: last.volume,
        ma20,
        ma60,
        ma20_slope5: pct_change(ma20, ma20_prev),
        mom5: pct_change(last.close, closes[n - 1 - 5]),
        mom20: pct_change(last.close, closes[n - 1 - 20]),
        vol20_std: sample_std(&returns),
        vol_ratio_5_20: volume::volume_ratio(&volumes, 5, 20).ok_or_else(insufficient)?,
        volume_zscore20: volume::volume_zscore(&volumes, 20).ok_or_else(insufficient)?,
        atr14: atr::latest_atr(bars, ATR_PERIOD).ok_or_else(insufficient)?,
        rsi14: rsi::latest_rsi(&closes, RSI_PERIOD).ok_or_else(insufficient)?,
        turnover_rate: last.turnover_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(closes: &[f64]) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
                turnover_rate: None,
            })
            .collect()
    }

    #[test]
    fn rejects_short_history() {
        let bars = make_bars(&[10.0; 24]);
        let err = compute_indicators("600000", &bars).unwrap_err();
        assert!(matches!(
            err,
            DaypickError::InsufficientHistory { bars: 24, minimum: 25, .. }
        ));
    }

    #[test]
    fn ma60_absent_below_sixty_bars() {
        let bars = make_bars(&[10.0; 40]);
        let set = compute_indicators("600000", &bars).unwrap();
        assert!(set.ma60.is_none());
        assert!((set.ma60_or_ma20() - set.ma20).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_series_indicators() {
        let bars = make_bars(&[10.0; 70]);
        let set = compute_indicators("600000", &bars).unwrap();
        assert!((set.ma20 - 10.0).abs() < 1e-12);
        assert!((set.ma60.unwrap() - 10.0).abs() < 1e-12);
        assert!(set.mom5.abs() < 1e-12);
        assert!(set.mom20.abs() < 1e-12);
        assert!(set.vol20_std.abs() < 1e-12);
        assert!((set.vol_ratio_5_20 - 1.0).abs() < 1e-12);
        assert!(set.volume_zscore20.abs() < 1e-12);
        assert!((set.atr14 - 1.0).abs() < 1e-12);
        assert!((set.rsi14 - 50.0).abs() < 1e-12);
        assert_eq!(set.turnover_rate, None);
    }

    #[test]
    fn turnover_comes_from_latest_bar() {
        let mut bars = make_bars(&[10.0; 30]);
        bars[28].turnover_rate = Some(4.0);
        bars[29].turnover_rate = Some(1.5);
        let set = compute_indicators("600000", &bars).unwrap();
        assert_eq!(set.turnover_rate, Some(1.5));
    }

    #[test]
    fn linear_uptrend_momentum_and_slope() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let set = compute_indicators("600000", &make_bars(&closes)).unwrap();
        // close 39, close 5 bars ago 34, 20 bars ago 19
        assert!((set.mom5 - (39.0 / 34.0 - 1.0)).abs() < 1e-12);
        assert!((set.mom20 - (39.0 / 19.0 - 1.0)).abs() < 1e-12);
        // ma20 = mean(20..=39) = 29.5, five bars earlier mean(15..=34) = 24.5
        assert!((set.ma20 - 29.5).abs() < 1e-12);
        assert!((set.ma20_slope5 - (29.5 / 24.5 - 1.0)).abs() < 1e-12);
        assert!((set.rsi14 - 100.0).abs() < f64::EPSILON);
        assert_eq!(set.date, NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
    }
}
