//! Average True Range as the simple mean of the latest `period` true ranges.
//!
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|), so
//! `period + 1` bars are needed.

use crate::domain::bar::DailyBar;

pub fn latest_atr(bars: &[DailyBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let window = &bars[bars.len() - period - 1..];
    let total: f64 = window
        .windows(2)
        .map(|pair| pair[1].true_range(pair[0].close))
        .sum();
    Some(total / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
            turnover_rate: None,
        }
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<DailyBar> = (1..=20).map(|d| make_bar(d, 11.0, 9.0, 10.0)).collect();
        assert!((latest_atr(&bars, 14).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_includes_gaps() {
        // Second bar gaps up: TR = |14 - 10| = 4 instead of high-low = 1
        let bars = vec![
            make_bar(1, 10.5, 9.5, 10.0),
            make_bar(2, 14.0, 13.0, 13.5),
            make_bar(3, 14.0, 13.0, 13.5),
        ];
        // TRs: 4.0, 1.0 → mean 2.5
        assert!((latest_atr(&bars, 2).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_needs_period_plus_one_bars() {
        let bars: Vec<DailyBar> = (1..=14).map(|d| make_bar(d, 11.0, 9.0, 10.0)).collect();
        assert!(latest_atr(&bars, 14).is_none());
        assert!(latest_atr(&bars, 0).is_none());
    }
}
