//! Stop-loss, take-profit and suggested holding period for a chosen candidate.

use serde::Serialize;

use crate::domain::config::{HoldingConfig, HoldingRule, RiskTargetConfig, TargetMethod};
use crate::domain::indicator::IndicatorSet;
use crate::domain::regime::RegimeState;

/// ATR fallback when the series has no measurable range.
const FALLBACK_ATR_PCT: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskTargets {
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub suggested_holding_days: u32,
}

/// floor(value / tick) * tick, tolerant of float error just below a tick.
pub fn floor_to_tick(value: f64, tick: f64) -> f64 {
    if tick <= 0.0 {
        return value;
    }
    (value / tick + 1e-9).floor() * tick
}

/// (stop, take) for an entry reference price `close`.
pub fn stop_take_prices(close: f64, atr: f64, config: &RiskTargetConfig) -> (f64, f64) {
    if close <= 0.0 {
        return (0.0, 0.0);
    }
    let (stop, take) = match config.method {
        TargetMethod::Atr => {
            let atr = if atr > 0.0 { atr } else { close * FALLBACK_ATR_PCT };
            (
                close - config.stop_loss_atr_mult * atr,
                close + config.take_profit_atr_mult * atr,
            )
        }
        TargetMethod::Percent => (
            close * (1.0 - config.stop_loss_pct),
            close * (1.0 + config.take_profit_pct),
        ),
    };
    (
        floor_to_tick(stop.max(0.0), config.price_tick),
        floor_to_tick(take, config.price_tick),
    )
}

fn rule_matches(rule: &HoldingRule, ind: &IndicatorSet) -> bool {
    ind.mom20 >= rule.min_mom20 && ind.vol20_std <= rule.max_volatility && ind.rsi14 <= rule.max_rsi
}

/// Strong trend with low volatility holds longest; bear and neutral markets
/// cap the result. Never below one day.
pub fn suggest_holding_days(ind: &IndicatorSet, regime: RegimeState, config: &HoldingConfig) -> u32 {
    let days = if rule_matches(&config.strong, ind) {
        config.strong.days
    } else if rule_matches(&config.moderate, ind) {
        config.moderate.days
    } else {
        config.base_days
    };
    let capped = match regime {
        RegimeState::Bull => days,
        RegimeState::Neutral => days.min(config.neutral_cap),
        RegimeState::Bear => days.min(config.bear_cap),
    };
    capped.max(1)
}

pub fn compute_targets(
    ind: &IndicatorSet,
    regime: RegimeState,
    targets: &RiskTargetConfig,
    holding: &HoldingConfig,
) -> RiskTargets {
    let (stop_loss_price, take_profit_price) = stop_take_prices(ind.close, ind.atr14, targets);
    RiskTargets {
        stop_loss_price,
        take_profit_price,
        suggested_holding_days: suggest_holding_days(ind, regime, holding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn indicators(mom20: f64, vol: f64, rsi: f64) -> IndicatorSet {
        IndicatorSet {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            close: 10.0,
            volume: 1000.0,
            ma20: 9.5,
            ma60: Some(9.0),
            ma20_slope5: 0.01,
            mom5: 0.02,
            mom20,
            vol20_std: vol,
            vol_ratio_5_20: 1.0,
            volume_zscore20: 0.0,
            atr14: 0.4,
            rsi14: rsi,
            turnover_rate: None,
        }
    }

    fn untick(mut config: RiskTargetConfig) -> RiskTargetConfig {
        config.price_tick = 0.0;
        config
    }

    #[test]
    fn atr_targets() {
        let (stop, take) = stop_take_prices(10.0, 0.4, &untick(RiskTargetConfig::default()));
        assert!((stop - (10.0 - 1.5 * 0.4)).abs() < 1e-12);
        assert!((take - (10.0 + 3.0 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn zero_atr_falls_back_to_two_percent() {
        let (stop, take) = stop_take_prices(10.0, 0.0, &untick(RiskTargetConfig::default()));
        assert!((stop - (10.0 - 1.5 * 0.2)).abs() < 1e-12);
        assert!((take - (10.0 + 3.0 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn percent_targets() {
        let config = RiskTargetConfig {
            method: TargetMethod::Percent,
            ..untick(RiskTargetConfig::default())
        };
        let (stop, take) = stop_take_prices(10.0, 0.4, &config);
        assert!((stop - 9.7).abs() < 1e-12);
        assert!((take - 10.6).abs() < 1e-12);
    }

    #[test]
    fn prices_floor_to_tick() {
        assert!((floor_to_tick(10.237, 0.01) - 10.23).abs() < 1e-9);
        // 10.23 is not exactly representable; must not drop to 10.22
        assert!((floor_to_tick(10.23, 0.01) - 10.23).abs() < 1e-9);
        assert!((floor_to_tick(10.237, 0.0) - 10.237).abs() < f64::EPSILON);

        let (stop, take) = stop_take_prices(10.0, 0.333, &RiskTargetConfig::default());
        // 10 - 0.4995 = 9.5005 → 9.50; 10 + 0.999 = 10.999 → 10.99
        assert!((stop - 9.50).abs() < 1e-9);
        assert!((take - 10.99).abs() < 1e-9);
    }

    #[test]
    fn non_positive_close_yields_zero_targets() {
        assert_eq!(
            stop_take_prices(0.0, 0.4, &RiskTargetConfig::default()),
            (0.0, 0.0)
        );
    }

    #[test]
    fn holding_days_table() {
        let holding = HoldingConfig::default();
        assert_eq!(
            suggest_holding_days(&indicators(0.12, 0.02, 60.0), RegimeState::Bull, &holding),
            5
        );
        assert_eq!(
            suggest_holding_days(&indicators(0.05, 0.04, 75.0), RegimeState::Bull, &holding),
            3
        );
        assert_eq!(
            suggest_holding_days(&indicators(0.01, 0.06, 50.0), RegimeState::Bull, &holding),
            2
        );
    }

    #[test]
    fn holding_days_capped_by_regime() {
        let holding = HoldingConfig::default();
        let strong = indicators(0.12, 0.02, 60.0);
        assert_eq!(suggest_holding_days(&strong, RegimeState::Neutral, &holding), 3);
        assert_eq!(suggest_holding_days(&strong, RegimeState::Bear, &holding), 1);
    }

    #[test]
    fn holding_days_monotonic_in_momentum() {
        let holding = HoldingConfig::default();
        let mut prev = 0;
        for step in 0..30 {
            let mom = -0.05 + step as f64 * 0.01;
            let days = suggest_holding_days(&indicators(mom, 0.02, 60.0), RegimeState::Bull, &holding);
            assert!(days >= prev);
            assert!(days >= 1);
            prev = days;
        }
    }

    #[test]
    fn holding_days_never_zero() {
        let holding = HoldingConfig {
            base_days: 0,
            ..HoldingConfig::default()
        };
        assert_eq!(
            suggest_holding_days(&indicators(-0.2, 0.2, 90.0), RegimeState::Bull, &holding),
            1
        );
    }
}
