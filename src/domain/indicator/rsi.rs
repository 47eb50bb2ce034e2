//! RSI (Relative Strength Index) over the latest `period` price changes.
//!
//! Uses a simple rolling mean of gains and losses rather than Wilder's
//! smoothing, so the value depends only on the last `period + 1` closes.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when there were gains, 50 when flat.

/// Latest RSI value; `None` when fewer than `period + 1` closes.
pub fn latest_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let rsi = if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    Some(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_insufficient_closes() {
        assert!(latest_rsi(&[1.0; 14], 14).is_none());
        assert!(latest_rsi(&[1.0; 15], 0).is_none());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 10.0 + i as f64).collect();
        assert!((latest_rsi(&closes, 14).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..15).map(|i| 30.0 - i as f64).collect();
        assert!(latest_rsi(&closes, 14).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_is_50() {
        assert!((latest_rsi(&[10.0; 20], 14).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_balanced_moves() {
        // +2, -1 alternating over 4 changes: avg_gain 1.0, avg_loss 0.5 → RS 2 → 66.67
        let closes = [10.0, 12.0, 11.0, 13.0, 12.0];
        let expected = 100.0 - 100.0 / 3.0;
        assert!((latest_rsi(&closes, 4).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // Early crash outside the window must not matter.
        let mut closes = vec![100.0, 50.0];
        closes.extend((0..15).map(|i| 50.0 + i as f64));
        assert!((latest_rsi(&closes, 14).unwrap() - 100.0).abs() < f64::EPSILON);
    }
}
