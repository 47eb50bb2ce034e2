//! Per-symbol risk gate, independent of scoring.
//!
//! Every check is recorded so `explain` can show the full picture; the
//! decision only looks at the first failure. Board exclusion runs first and
//! history second; when history is short nothing else can be evaluated.

use std::fmt;

use serde::Serialize;

use crate::domain::config::{ModeConfig, UniverseConfig};
use crate::domain::mode_chain::ModeTier;
use crate::domain::regime::RegimeState;
use crate::domain::snapshot::SymbolSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ExcludedBoard,
    InsufficientHistory,
    BearMarket,
    PriceOutOfRange,
    VolatilityOutOfRange,
    RsiOutOfRange,
    VolumeBelowFloor,
    VolumeRatioBelowFloor,
    TurnoverBelowFloor,
    BelowMa20,
    MaMisaligned,
    WeakMomentum,
    WeakMarketVolatility,
    WeakMarketMomentum,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::ExcludedBoard => "excluded_board",
            RejectReason::InsufficientHistory => "insufficient_history",
            RejectReason::BearMarket => "bear_market",
            RejectReason::PriceOutOfRange => "price_out_of_range",
            RejectReason::VolatilityOutOfRange => "volatility_out_of_range",
            RejectReason::RsiOutOfRange => "rsi_out_of_range",
            RejectReason::VolumeBelowFloor => "volume_below_floor",
            RejectReason::VolumeRatioBelowFloor => "volume_ratio_below_floor",
            RejectReason::TurnoverBelowFloor => "turnover_below_floor",
            RejectReason::BelowMa20 => "below_ma20",
            RejectReason::MaMisaligned => "ma_misaligned",
            RejectReason::WeakMomentum => "weak_momentum",
            RejectReason::WeakMarketVolatility => "weak_market_volatility",
            RejectReason::WeakMarketMomentum => "weak_market_momentum",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub check: RejectReason,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterReport {
    pub checks: Vec<CheckOutcome>,
}

impl FilterReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn first_failure(&self) -> Option<RejectReason> {
        self.checks.iter().find(|c| !c.passed).map(|c| c.check)
    }

    fn record(&mut self, check: RejectReason, passed: bool, detail: String) {
        self.checks.push(CheckOutcome {
            check,
            passed,
            detail,
        });
    }
}

/// Gate applied to every symbol under one tier.
pub trait CandidateFilter {
    fn evaluate(
        &self,
        snapshot: &SymbolSnapshot,
        tier: ModeTier,
        mode: &ModeConfig,
        regime: RegimeState,
    ) -> FilterReport;
}

pub struct RiskFilter {
    universe: UniverseConfig,
}

impl RiskFilter {
    pub fn new(universe: UniverseConfig) -> Self {
        RiskFilter { universe }
    }
}

impl CandidateFilter for RiskFilter {
    fn evaluate(
        &self,
        snapshot: &SymbolSnapshot,
        _tier: ModeTier,
        mode: &ModeConfig,
        regime: RegimeState,
    ) -> FilterReport {
        let mut report = FilterReport::default();

        let excluded = self.universe.excludes_board(snapshot.symbol());
        report.record(
            RejectReason::ExcludedBoard,
            !excluded,
            format!("symbol {}", snapshot.symbol()),
        );

        let ind = match &snapshot.indicators {
            Some(ind) if snapshot.bar_count >= mode.min_bars => ind,
            _ => {
                report.record(
                    RejectReason::InsufficientHistory,
                    false,
                    format!("{} bars < {}", snapshot.bar_count, mode.min_bars),
                );
                return report;
            }
        };
        report.record(
            RejectReason::InsufficientHistory,
            true,
            format!("{} bars >= {}", snapshot.bar_count, mode.min_bars),
        );

        report.record(
            RejectReason::BearMarket,
            !(mode.block_on_bear && regime == RegimeState::Bear),
            format!("regime {regime}, block_on_bear {}", mode.block_on_bear),
        );
        report.record(
            RejectReason::PriceOutOfRange,
            ind.close >= mode.min_price && ind.close <= mode.max_price,
            format!("close {:.2} in [{}, {}]", ind.close, mode.min_price, mode.max_price),
        );
        report.record(
            RejectReason::VolatilityOutOfRange,
            ind.vol20_std >= mode.min_volatility && ind.vol20_std <= mode.max_volatility,
            format!(
                "vol20 {:.4} in [{}, {}]",
                ind.vol20_std, mode.min_volatility, mode.max_volatility
            ),
        );
        report.record(
            RejectReason::RsiOutOfRange,
            ind.rsi14 >= mode.min_rsi && ind.rsi14 <= mode.max_rsi,
            format!("rsi14 {:.1} in [{}, {}]", ind.rsi14, mode.min_rsi, mode.max_rsi),
        );
        report.record(
            RejectReason::VolumeBelowFloor,
            ind.volume >= mode.min_volume,
            format!("volume {:.0} >= {}", ind.volume, mode.min_volume),
        );
        report.record(
            RejectReason::VolumeRatioBelowFloor,
            ind.vol_ratio_5_20 >= mode.min_vol_ratio,
            format!("vol_ratio {:.2} >= {}", ind.vol_ratio_5_20, mode.min_vol_ratio),
        );
        if mode.require_turnover_data {
            let detail = match ind.turnover_rate {
                Some(rate) => format!("turnover {rate:.2} > {}", mode.min_turnover_rate),
                None => "turnover unavailable".to_string(),
            };
            report.record(
                RejectReason::TurnoverBelowFloor,
                ind.turnover_rate.is_some_and(|rate| rate > mode.min_turnover_rate),
                detail,
            );
        }
        if mode.require_above_ma20 {
            report.record(
                RejectReason::BelowMa20,
                ind.close > ind.ma20,
                format!("close {:.2} > ma20 {:.2}", ind.close, ind.ma20),
            );
        }
        if mode.require_ma_alignment {
            let aligned = ind.ma60.is_some_and(|ma60| ind.ma20 > ma60);
            let detail = match ind.ma60 {
                Some(ma60) => format!("ma20 {:.2} > ma60 {:.2}", ind.ma20, ma60),
                None => "ma60 unavailable".to_string(),
            };
            report.record(RejectReason::MaMisaligned, aligned, detail);
        }
        report.record(
            RejectReason::WeakMomentum,
            ind.mom20 > mode.min_mom20,
            format!("mom20 {:.4} > {}", ind.mom20, mode.min_mom20),
        );

        if regime.is_weak() {
            if let Some(cap) = mode.weak_market_max_volatility {
                report.record(
                    RejectReason::WeakMarketVolatility,
                    ind.vol20_std <= cap,
                    format!("{regime} market: vol20 {:.4} <= {cap}", ind.vol20_std),
                );
            }
            if mode.weak_market_require_positive_mom20 {
                report.record(
                    RejectReason::WeakMarketMomentum,
                    ind.mom20 > 0.0,
                    format!("{regime} market: mom20 {:.4} > 0", ind.mom20),
                );
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::StockInfo;
    use crate::domain::indicator::IndicatorSet;
    use chrono::NaiveDate;

    fn healthy_indicators() -> IndicatorSet {
        IndicatorSet {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            close: 12.0,
            volume: 1_000_000.0,
            ma20: 11.5,
            ma60: Some(11.0),
            ma20_slope5: 0.01,
            mom5: 0.02,
            mom20: 0.06,
            vol20_std: 0.02,
            vol_ratio_5_20: 1.1,
            volume_zscore20: 0.3,
            atr14: 0.3,
            rsi14: 58.0,
            turnover_rate: Some(2.5),
        }
    }

    fn snapshot(symbol: &str, indicators: IndicatorSet) -> SymbolSnapshot {
        SymbolSnapshot {
            info: StockInfo::new(symbol, "test"),
            bar_count: 120,
            indicators: Some(indicators),
        }
    }

    fn evaluate(snap: &SymbolSnapshot, tier: ModeTier, regime: RegimeState) -> FilterReport {
        RiskFilter::new(UniverseConfig::default()).evaluate(
            snap,
            tier,
            &ModeConfig::defaults_for(tier),
            regime,
        )
    }

    #[test]
    fn healthy_symbol_passes_normal() {
        let report = evaluate(
            &snapshot("600000", healthy_indicators()),
            ModeTier::Normal,
            RegimeState::Bull,
        );
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.first_failure(), None);
    }

    #[test]
    fn gem_board_rejected_regardless_of_quality() {
        let report = evaluate(
            &snapshot("300750", healthy_indicators()),
            ModeTier::Force,
            RegimeState::Bull,
        );
        assert_eq!(report.first_failure(), Some(RejectReason::ExcludedBoard));
    }

    #[test]
    fn short_history_stops_evaluation() {
        let mut snap = snapshot("600000", healthy_indicators());
        snap.bar_count = 40;
        let report = evaluate(&snap, ModeTier::Normal, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::InsufficientHistory));
        assert_eq!(report.checks.len(), 2);

        // Force only needs 30 bars.
        assert!(evaluate(&snap, ModeTier::Force, RegimeState::Bull).passed());
    }

    #[test]
    fn missing_indicators_is_insufficient_history() {
        let snap = SymbolSnapshot {
            info: StockInfo::new("600000", "test"),
            bar_count: 10,
            indicators: None,
        };
        let report = evaluate(&snap, ModeTier::Force, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::InsufficientHistory));
    }

    #[test]
    fn bear_blocks_normal_only() {
        let snap = snapshot("600000", healthy_indicators());
        let normal = evaluate(&snap, ModeTier::Normal, RegimeState::Bear);
        assert_eq!(normal.first_failure(), Some(RejectReason::BearMarket));
        let relaxed = evaluate(&snap, ModeTier::Relaxed, RegimeState::Bear);
        assert!(relaxed.passed(), "{relaxed:?}");
    }

    #[test]
    fn rsi_bounds() {
        let mut ind = healthy_indicators();
        ind.rsi14 = 78.0;
        let snap = snapshot("600000", ind);
        assert_eq!(
            evaluate(&snap, ModeTier::Normal, RegimeState::Bull).first_failure(),
            Some(RejectReason::RsiOutOfRange)
        );
        assert!(evaluate(&snap, ModeTier::Relaxed, RegimeState::Bull).passed());
    }

    #[test]
    fn turnover_gate_only_when_required() {
        let mut ind = healthy_indicators();
        ind.turnover_rate = None;
        let snap = snapshot("600000", ind);
        let filter = RiskFilter::new(UniverseConfig::default());
        let mut mode = ModeConfig::defaults_for(ModeTier::Normal);

        let report = filter.evaluate(&snap, ModeTier::Normal, &mode, RegimeState::Bull);
        assert!(report.passed(), "{report:?}");
        assert!(report.checks.iter().all(|c| c.check != RejectReason::TurnoverBelowFloor));

        mode.require_turnover_data = true;
        let report = filter.evaluate(&snap, ModeTier::Normal, &mode, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::TurnoverBelowFloor));
    }

    #[test]
    fn turnover_must_exceed_floor() {
        let filter = RiskFilter::new(UniverseConfig::default());
        let mut mode = ModeConfig::defaults_for(ModeTier::Relaxed);
        mode.require_turnover_data = true;
        mode.min_turnover_rate = 2.5;

        // healthy_indicators reports exactly 2.5, and the floor is exclusive.
        let snap = snapshot("600000", healthy_indicators());
        let report = filter.evaluate(&snap, ModeTier::Relaxed, &mode, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::TurnoverBelowFloor));

        mode.min_turnover_rate = 1.0;
        let report = filter.evaluate(&snap, ModeTier::Relaxed, &mode, RegimeState::Bull);
        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn ma_alignment_requires_ma60() {
        let mut ind = healthy_indicators();
        ind.ma60 = None;
        let report = evaluate(&snapshot("600000", ind), ModeTier::Normal, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::MaMisaligned));
    }

    #[test]
    fn weak_market_tightens_volatility() {
        let mut ind = healthy_indicators();
        ind.vol20_std = 0.06;
        let snap = snapshot("600000", ind);
        assert!(evaluate(&snap, ModeTier::Normal, RegimeState::Bull).passed());
        assert_eq!(
            evaluate(&snap, ModeTier::Normal, RegimeState::Neutral).first_failure(),
            Some(RejectReason::WeakMarketVolatility)
        );
        assert!(evaluate(&snap, ModeTier::Force, RegimeState::Neutral).passed());
    }

    #[test]
    fn first_failure_follows_check_order() {
        let mut ind = healthy_indicators();
        ind.close = 1.0;
        ind.rsi14 = 90.0;
        let report = evaluate(&snapshot("600000", ind), ModeTier::Normal, RegimeState::Bull);
        assert_eq!(report.first_failure(), Some(RejectReason::PriceOutOfRange));
        let failed: Vec<_> = report
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.check)
            .collect();
        assert!(failed.contains(&RejectReason::RsiOutOfRange));
    }

    #[test]
    fn downtrend_passes_force_only() {
        let mut ind = healthy_indicators();
        ind.close = 10.0;
        ind.ma20 = 11.0;
        ind.ma60 = Some(12.0);
        ind.mom20 = -0.08;
        ind.rsi14 = 28.0;
        let snap = snapshot("600000", ind);
        assert!(!evaluate(&snap, ModeTier::Normal, RegimeState::Bull).passed());
        assert!(!evaluate(&snap, ModeTier::Relaxed, RegimeState::Bull).passed());
        assert!(evaluate(&snap, ModeTier::Force, RegimeState::Bull).passed());
    }
}
