//! Volume ratio and volume z-score.

use super::stats::{mean, sample_std};

/// mean(last `short`) / mean(last `long`); 0.0 when the long mean is zero.
pub fn volume_ratio(volumes: &[f64], short: usize, long: usize) -> Option<f64> {
    if short == 0 || long == 0 || volumes.len() < short.max(long) {
        return None;
    }
    let n = volumes.len();
    let short_mean = mean(&volumes[n - short..]);
    let long_mean = mean(&volumes[n - long..]);
    if long_mean > 0.0 {
        Some(short_mean / long_mean)
    } else {
        Some(0.0)
    }
}

/// (latest - mean) / sample_std over the last `window` volumes; 0.0 when the
/// window has no dispersion.
pub fn volume_zscore(volumes: &[f64], window: usize) -> Option<f64> {
    if window < 2 || volumes.len() < window {
        return None;
    }
    let tail = &volumes[volumes.len() - window..];
    let std = sample_std(tail);
    if std > 0.0 {
        let latest = tail[tail.len() - 1];
        Some((latest - mean(tail)) / std)
    } else {
        Some(0.0)
    }
}
