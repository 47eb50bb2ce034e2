//! Composite scoring from indicator outputs.
//!
//! Each sub-score is 0-100 built from normalized features:
//! - trend     = 0.4·close/MA20 + 0.4·MA20/MA60 + 0.2·MA20 slope
//! - momentum  = 0.5·MOM5 + 0.5·MOM20
//! - stability = 1 - volatility
//! - volume    = 0.6·vol_ratio + 0.4·volume z-score
//!
//! The composite is the weighted mean of the four sub-scores.

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::config::{NormalizationConfig, ScoreWeights};
use crate::domain::indicator::IndicatorSet;
use crate::domain::mode_chain::ModeTier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub trend: f64,
    pub momentum: f64,
    pub stability: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub total: f64,
    pub breakdown: ScoreBreakdown,
}

pub fn score_breakdown(ind: &IndicatorSet, norm: &NormalizationConfig) -> ScoreBreakdown {
    let close_vs_ma20 = ratio_minus_one(ind.close, ind.ma20);
    let ma20_vs_ma60 = ratio_minus_one(ind.ma20, ind.ma60_or_ma20());

    let trend = 0.4 * norm.close_vs_ma20.unit(close_vs_ma20)
        + 0.4 * norm.ma20_vs_ma60.unit(ma20_vs_ma60)
        + 0.2 * norm.ma20_slope.unit(ind.ma20_slope5);
    let momentum = 0.5 * norm.mom5.unit(ind.mom5) + 0.5 * norm.mom20.unit(ind.mom20);
    let stability = 1.0 - norm.volatility.unit(ind.vol20_std);
    let volume = 0.6 * norm.vol_ratio.unit(ind.vol_ratio_5_20)
        + 0.4 * norm.volume_zscore.unit(ind.volume_zscore20);

    ScoreBreakdown {
        trend: trend * 100.0,
        momentum: momentum * 100.0,
        stability: stability * 100.0,
        volume: volume * 100.0,
    }
}

/// Weighted mean; negative weights count as zero, all-zero weights as equal.
pub fn composite(breakdown: &ScoreBreakdown, weights: &ScoreWeights) -> f64 {
    let parts = [
        (breakdown.trend, weights.trend),
        (breakdown.momentum, weights.momentum),
        (breakdown.stability, weights.stability),
        (breakdown.volume, weights.volume),
    ];
    let weight_sum: f64 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
    if weight_sum <= 0.0 {
        return parts.iter().map(|(s, _)| s).sum::<f64>() / parts.len() as f64;
    }
    parts.iter().map(|(s, w)| s * w.max(0.0)).sum::<f64>() / weight_sum
}

pub fn score(ind: &IndicatorSet, weights: &ScoreWeights, norm: &NormalizationConfig) -> ScoreCard {
    let breakdown = score_breakdown(ind, norm);
    ScoreCard {
        total: composite(&breakdown, weights),
        breakdown,
    }
}

/// Best-first ordering: higher score, then symbol ascending.
pub fn rank_order(a_score: f64, a_symbol: &str, b_score: f64, b_symbol: &str) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_symbol.cmp(b_symbol))
}

/// Human-readable lines explaining why a candidate was picked.
pub fn build_reasons(ind: &IndicatorSet, card: &ScoreCard, tier: ModeTier) -> Vec<String> {
    let b = &card.breakdown;
    let mut reasons = vec![format!(
        "selected in {tier} mode with score {:.2} (trend {:.1}, momentum {:.1}, stability {:.1}, volume {:.1})",
        card.total, b.trend, b.momentum, b.stability, b.volume
    )];
    if ind.close > ind.ma20 {
        reasons.push(format!(
            "close {:.2} above MA20 {:.2} ({:+.2}%)",
            ind.close,
            ind.ma20,
            ratio_minus_one(ind.close, ind.ma20) * 100.0
        ));
    }
    if let Some(ma60) = ind.ma60
        && ind.ma20 > ma60
    {
        reasons.push(format!("MA20 {:.2} above MA60 {:.2}", ind.ma20, ma60));
    }
    reasons.push(format!(
        "momentum 5d {:+.2}%, 20d {:+.2}%",
        ind.mom5 * 100.0,
        ind.mom20 * 100.0
    ));
    reasons.push(format!(
        "20d volatility {:.2}%, RSI14 {:.1}, volume ratio {:.2}",
        ind.vol20_std * 100.0,
        ind.rsi14,
        ind.vol_ratio_5_20
    ));
    if tier != ModeTier::Normal {
        reasons.push(format!(
            "no symbol passed the stricter tiers; fell back to {tier}"
        ));
    }
    reasons
}

fn ratio_minus_one(a: f64, b: f64) -> f64 {
    if b > 0.0 { a / b - 1.0 } else { 0.0 }
}
