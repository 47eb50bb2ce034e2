//! Configuration validation.
//!
//! Runs once at startup over the resolved `EngineConfig`; every violation is
//! a `ConfigInvalid` naming the INI section and key.

use crate::domain::config::{ClipRange, EngineConfig, HoldingConfig, ModeConfig};
use crate::domain::error::DaypickError;
use crate::domain::indicator::MIN_INDICATOR_BARS;
use crate::domain::mode_chain::ModeTier;

/// The regime classifier needs MA60 on the benchmark.
pub const MIN_REGIME_BARS: usize = 60;

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), DaypickError> {
    validate_data(config)?;
    validate_enabled_modes(config)?;
    for tier in ModeTier::ALL {
        validate_mode(tier, config.modes.get(tier), config.data.history_days)?;
    }
    validate_scoring(config)?;
    validate_market(config)?;
    validate_risk_targets(config)?;
    validate_holding(&config.holding)?;
    validate_execution_cost(config)?;
    validate_backtest(config)?;
    validate_freshness(config)?;
    Ok(())
}

fn validate_data(config: &EngineConfig) -> Result<(), DaypickError> {
    if config.data.history_days <= 0 {
        return Err(DaypickError::invalid(
            "data",
            "history_days",
            "history_days must be positive",
        ));
    }
    Ok(())
}

fn validate_enabled_modes(config: &EngineConfig) -> Result<(), DaypickError> {
    if config.enabled_modes.is_empty() {
        return Err(DaypickError::invalid(
            "strategy",
            "enabled_modes",
            "at least one mode must be enabled",
        ));
    }
    Ok(())
}

/// `history_days` is a calendar window, so it bounds the bar count any
/// symbol can reach.
fn validate_mode(tier: ModeTier, mode: &ModeConfig, history_days: i64) -> Result<(), DaypickError> {
    let section = format!("mode.{}", tier.as_str());
    let fail = |key: &str, reason: &str| Err(DaypickError::invalid(&section, key, reason));

    if mode.min_bars < MIN_INDICATOR_BARS {
        return fail(
            "min_bars",
            &format!("min_bars must be at least {MIN_INDICATOR_BARS}"),
        );
    }
    if usize::try_from(history_days).is_ok_and(|days| mode.min_bars > days) {
        return fail(
            "min_bars",
            &format!(
                "min_bars {} exceeds data.history_days {history_days}",
                mode.min_bars
            ),
        );
    }
    if mode.min_price < 0.0 {
        return fail("min_price", "min_price must be non-negative");
    }
    if mode.min_price >= mode.max_price {
        return fail("max_price", "max_price must be greater than min_price");
    }
    if mode.min_rsi < 0.0 || mode.max_rsi > 100.0 || mode.min_rsi > mode.max_rsi {
        return fail("max_rsi", "RSI bounds must satisfy 0 <= min_rsi <= max_rsi <= 100");
    }
    if mode.min_volatility < 0.0 || mode.min_volatility > mode.max_volatility {
        return fail(
            "max_volatility",
            "volatility bounds must satisfy 0 <= min_volatility <= max_volatility",
        );
    }
    if mode.min_volume < 0.0 {
        return fail("min_volume", "min_volume must be non-negative");
    }
    if mode.min_vol_ratio < 0.0 {
        return fail("min_vol_ratio", "min_vol_ratio must be non-negative");
    }
    if mode.min_turnover_rate < 0.0 {
        return fail("min_turnover_rate", "min_turnover_rate must be non-negative");
    }
    if let Some(cap) = mode.weak_market_max_volatility
        && cap <= 0.0
    {
        return fail(
            "weak_market_max_volatility",
            "weak_market_max_volatility must be positive",
        );
    }
    let w = &mode.weights;
    for (key, value) in [
        ("weight_trend", w.trend),
        ("weight_momentum", w.momentum),
        ("weight_stability", w.stability),
        ("weight_volume", w.volume),
    ] {
        if value < 0.0 {
            return fail(key, "weights must be non-negative");
        }
    }
    if w.trend + w.momentum + w.stability + w.volume <= 0.0 {
        return fail("weight_trend", "at least one weight must be positive");
    }
    Ok(())
}

fn validate_scoring(config: &EngineConfig) -> Result<(), DaypickError> {
    let s = &config.scoring;
    let ranges: [(&str, ClipRange); 8] = [
        ("close_vs_ma20", s.close_vs_ma20),
        ("ma20_vs_ma60", s.ma20_vs_ma60),
        ("ma20_slope", s.ma20_slope),
        ("mom5", s.mom5),
        ("mom20", s.mom20),
        ("volatility", s.volatility),
        ("vol_ratio", s.vol_ratio),
        ("volume_zscore", s.volume_zscore),
    ];
    for (key, range) in ranges {
        if range.lo >= range.hi {
            return Err(DaypickError::invalid(
                "scoring",
                key,
                "range lower bound must be below upper bound",
            ));
        }
    }
    Ok(())
}

fn validate_market(config: &EngineConfig) -> Result<(), DaypickError> {
    let market = &config.market;
    if market.index_symbol.trim().is_empty() {
        return Err(DaypickError::ConfigMissing {
            section: "market".to_string(),
            key: "index_symbol".to_string(),
        });
    }
    if market.min_bars < MIN_REGIME_BARS {
        return Err(DaypickError::invalid(
            "market",
            "min_bars",
            format!("min_bars must be at least {MIN_REGIME_BARS}"),
        ));
    }
    if market.lookback_days < market.min_bars {
        return Err(DaypickError::invalid(
            "market",
            "lookback_days",
            "lookback_days must be at least min_bars",
        ));
    }
    if market.bear_drawdown <= 0.0 || market.bear_drawdown > 1.0 {
        return Err(DaypickError::invalid(
            "market",
            "bear_drawdown",
            "bear_drawdown must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_risk_targets(config: &EngineConfig) -> Result<(), DaypickError> {
    let t = &config.risk_targets;
    for (key, value) in [
        ("stop_loss_atr_mult", t.stop_loss_atr_mult),
        ("take_profit_atr_mult", t.take_profit_atr_mult),
        ("price_tick", t.price_tick),
    ] {
        if value < 0.0 {
            return Err(DaypickError::invalid(
                "risk_targets",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    for (key, value) in [
        ("stop_loss_pct", t.stop_loss_pct),
        ("take_profit_pct", t.take_profit_pct),
    ] {
        if !(0.0..1.0).contains(&value) {
            return Err(DaypickError::invalid(
                "risk_targets",
                key,
                format!("{key} must be in [0, 1)"),
            ));
        }
    }
    Ok(())
}

fn validate_holding(holding: &HoldingConfig) -> Result<(), DaypickError> {
    if holding.base_days == 0 {
        return Err(DaypickError::invalid(
            "holding",
            "base_days",
            "base_days must be at least 1",
        ));
    }
    if holding.moderate.days < holding.base_days {
        return Err(DaypickError::invalid(
            "holding",
            "moderate_days",
            "moderate_days must be at least base_days",
        ));
    }
    if holding.strong.days < holding.moderate.days {
        return Err(DaypickError::invalid(
            "holding",
            "strong_days",
            "strong_days must be at least moderate_days",
        ));
    }
    if holding.strong.min_mom20 < holding.moderate.min_mom20
        || holding.strong.max_volatility > holding.moderate.max_volatility
    {
        return Err(DaypickError::invalid(
            "holding",
            "strong_min_mom20",
            "strong rule must be at least as strict as the moderate rule",
        ));
    }
    if holding.neutral_cap == 0 || holding.bear_cap == 0 {
        return Err(DaypickError::invalid(
            "holding",
            "bear_cap",
            "regime caps must be at least 1",
        ));
    }
    if holding.bear_cap > holding.neutral_cap {
        return Err(DaypickError::invalid(
            "holding",
            "bear_cap",
            "bear_cap must not exceed neutral_cap",
        ));
    }
    Ok(())
}

fn validate_execution_cost(config: &EngineConfig) -> Result<(), DaypickError> {
    let c = &config.execution_cost;
    for (key, value) in [
        ("commission_rate", c.commission_rate),
        ("stamp_duty_rate", c.stamp_duty_rate),
    ] {
        if !(0.0..1.0).contains(&value) {
            return Err(DaypickError::invalid(
                "execution_cost",
                key,
                format!("{key} must be in [0, 1)"),
            ));
        }
    }
    if c.min_commission < 0.0 {
        return Err(DaypickError::invalid(
            "execution_cost",
            "min_commission",
            "min_commission must be non-negative",
        ));
    }
    if !(0.0..10_000.0).contains(&c.slippage_bps) {
        return Err(DaypickError::invalid(
            "execution_cost",
            "slippage_bps",
            "slippage_bps must be in [0, 10000)",
        ));
    }
    Ok(())
}

fn validate_backtest(config: &EngineConfig) -> Result<(), DaypickError> {
    if config.backtest.capital <= 0.0 {
        return Err(DaypickError::invalid(
            "backtest",
            "capital",
            "capital must be positive",
        ));
    }
    if config.backtest.lot_size == 0 {
        return Err(DaypickError::invalid(
            "backtest",
            "lot_size",
            "lot_size must be at least 1",
        ));
    }
    Ok(())
}

fn validate_freshness(config: &EngineConfig) -> Result<(), DaypickError> {
    let f = &config.freshness;
    if f.enabled && f.probe_symbol.trim().is_empty() {
        return Err(DaypickError::ConfigMissing {
            section: "freshness".to_string(),
            key: "probe_symbol".to_string(),
        });
    }
    if f.lookback_days <= 0 {
        return Err(DaypickError::invalid(
            "freshness",
            "lookback_days",
            "lookback_days must be positive",
        ));
    }
    Ok(())
}
