//! Typed engine configuration resolved from a `ConfigPort`.
//!
//! Every section has documented defaults; `EngineConfig::load` only
//! overrides keys that are present, and fails with `ConfigInvalid` on values
//! that do not parse. Range checks live in `config_validation`.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::error::DaypickError;
use crate::domain::mode_chain::ModeTier;
use crate::ports::config_port::ConfigPort;

/// Linear normalization window; values are clamped into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipRange {
    pub lo: f64,
    pub hi: f64,
}

impl ClipRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        ClipRange { lo, hi }
    }

    /// clamp((v - lo) / (hi - lo), 0, 1); 0.0 for a degenerate range or NaN input.
    pub fn unit(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span <= 0.0 || value.is_nan() {
            return 0.0;
        }
        ((value - self.lo) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    pub trend: f64,
    pub momentum: f64,
    pub stability: f64,
    pub volume: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            trend: 0.35,
            momentum: 0.35,
            stability: 0.15,
            volume: 0.15,
        }
    }
}

/// Filter thresholds and scoring weights for one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeConfig {
    pub min_bars: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub min_rsi: f64,
    pub max_rsi: f64,
    pub min_volatility: f64,
    pub max_volatility: f64,
    pub min_volume: f64,
    pub min_vol_ratio: f64,
    /// When set, turnover must be reported and strictly above `min_turnover_rate`.
    pub require_turnover_data: bool,
    pub min_turnover_rate: f64,
    pub require_above_ma20: bool,
    pub require_ma_alignment: bool,
    /// MOM20 must be strictly greater than this.
    pub min_mom20: f64,
    pub block_on_bear: bool,
    /// Extra volatility cap applied in bear and neutral markets.
    pub weak_market_max_volatility: Option<f64>,
    pub weak_market_require_positive_mom20: bool,
    pub weights: ScoreWeights,
}

impl ModeConfig {
    pub fn defaults_for(tier: ModeTier) -> Self {
        match tier {
            ModeTier::Normal => ModeConfig {
                min_bars: 70,
                min_price: 2.0,
                max_price: 200.0,
                min_rsi: 35.0,
                max_rsi: 75.0,
                min_volatility: 0.0,
                max_volatility: 0.07,
                min_volume: 0.0,
                min_vol_ratio: 0.6,
                require_turnover_data: false,
                min_turnover_rate: 0.0,
                require_above_ma20: true,
                require_ma_alignment: true,
                min_mom20: 0.0,
                block_on_bear: true,
                weak_market_max_volatility: Some(0.05),
                weak_market_require_positive_mom20: true,
                weights: ScoreWeights::default(),
            },
            ModeTier::Relaxed => ModeConfig {
                min_bars: 70,
                min_price: 2.0,
                max_price: 200.0,
                min_rsi: 30.0,
                max_rsi: 80.0,
                min_volatility: 0.0,
                max_volatility: 0.07,
                min_volume: 0.0,
                min_vol_ratio: 0.6,
                require_turnover_data: false,
                min_turnover_rate: 0.0,
                require_above_ma20: true,
                require_ma_alignment: false,
                min_mom20: -0.01,
                block_on_bear: false,
                weak_market_max_volatility: Some(0.05),
                weak_market_require_positive_mom20: false,
                weights: ScoreWeights::default(),
            },
            ModeTier::Force => ModeConfig {
                min_bars: 30,
                min_price: 0.0,
                max_price: 10_000.0,
                min_rsi: 0.0,
                max_rsi: 100.0,
                min_volatility: 0.0,
                max_volatility: 1.0,
                min_volume: 0.0,
                min_vol_ratio: 0.0,
                require_turnover_data: false,
                min_turnover_rate: 0.0,
                require_above_ma20: false,
                require_ma_alignment: false,
                min_mom20: -1.0,
                block_on_bear: false,
                weak_market_max_volatility: None,
                weak_market_require_positive_mom20: false,
                weights: ScoreWeights::default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeTable {
    pub normal: ModeConfig,
    pub relaxed: ModeConfig,
    pub force: ModeConfig,
}

impl ModeTable {
    pub fn get(&self, tier: ModeTier) -> &ModeConfig {
        match tier {
            ModeTier::Normal => &self.normal,
            ModeTier::Relaxed => &self.relaxed,
            ModeTier::Force => &self.force,
        }
    }

    pub fn get_mut(&mut self, tier: ModeTier) -> &mut ModeConfig {
        match tier {
            ModeTier::Normal => &mut self.normal,
            ModeTier::Relaxed => &mut self.relaxed,
            ModeTier::Force => &mut self.force,
        }
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        ModeTable {
            normal: ModeConfig::defaults_for(ModeTier::Normal),
            relaxed: ModeConfig::defaults_for(ModeTier::Relaxed),
            force: ModeConfig::defaults_for(ModeTier::Force),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationConfig {
    pub close_vs_ma20: ClipRange,
    pub ma20_vs_ma60: ClipRange,
    pub ma20_slope: ClipRange,
    pub mom5: ClipRange,
    pub mom20: ClipRange,
    pub volatility: ClipRange,
    pub vol_ratio: ClipRange,
    pub volume_zscore: ClipRange,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        NormalizationConfig {
            close_vs_ma20: ClipRange::new(-0.03, 0.08),
            ma20_vs_ma60: ClipRange::new(-0.03, 0.08),
            ma20_slope: ClipRange::new(-0.02, 0.04),
            mom5: ClipRange::new(-0.08, 0.12),
            mom20: ClipRange::new(-0.15, 0.25),
            volatility: ClipRange::new(0.01, 0.08),
            vol_ratio: ClipRange::new(0.8, 2.0),
            volume_zscore: ClipRange::new(-0.5, 2.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniverseConfig {
    pub exclude_st: bool,
    pub exclude_paused: bool,
    pub exclude_gem_board: bool,
    pub exclude_star_board: bool,
    pub exclude_bj_board: bool,
    /// Maximum symbols scanned per run; 0 means no cap.
    pub limit: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        UniverseConfig {
            exclude_st: true,
            exclude_paused: true,
            exclude_gem_board: true,
            exclude_star_board: true,
            exclude_bj_board: true,
            limit: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketConfig {
    pub index_symbol: String,
    pub lookback_days: usize,
    pub min_bars: usize,
    pub bear_drawdown: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            index_symbol: "000300".to_string(),
            lookback_days: 120,
            min_bars: 60,
            bear_drawdown: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMethod {
    Atr,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskTargetConfig {
    pub method: TargetMethod,
    pub stop_loss_atr_mult: f64,
    pub take_profit_atr_mult: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Prices are floored to this tick; 0 disables rounding.
    pub price_tick: f64,
}

impl Default for RiskTargetConfig {
    fn default() -> Self {
        RiskTargetConfig {
            method: TargetMethod::Atr,
            stop_loss_atr_mult: 1.5,
            take_profit_atr_mult: 3.0,
            stop_loss_pct: 0.03,
            take_profit_pct: 0.06,
            price_tick: 0.01,
        }
    }
}

/// One row of the holding-days table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoldingRule {
    pub min_mom20: f64,
    pub max_volatility: f64,
    pub max_rsi: f64,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingConfig {
    pub strong: HoldingRule,
    pub moderate: HoldingRule,
    pub base_days: u32,
    pub neutral_cap: u32,
    pub bear_cap: u32,
}

impl Default for HoldingConfig {
    fn default() -> Self {
        HoldingConfig {
            strong: HoldingRule {
                min_mom20: 0.10,
                max_volatility: 0.03,
                max_rsi: 70.0,
                days: 5,
            },
            moderate: HoldingRule {
                min_mom20: 0.04,
                max_volatility: 0.05,
                max_rsi: 78.0,
                days: 3,
            },
            base_days: 2,
            neutral_cap: 3,
            bear_cap: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionCostConfig {
    pub enabled: bool,
    pub commission_rate: f64,
    /// Per-side minimum commission in currency units.
    pub min_commission: f64,
    pub stamp_duty_rate: f64,
    pub slippage_bps: f64,
}

impl Default for ExecutionCostConfig {
    fn default() -> Self {
        ExecutionCostConfig {
            enabled: true,
            commission_rate: 0.0002,
            min_commission: 0.0,
            stamp_duty_rate: 0.0005,
            slippage_bps: 5.0,
        }
    }
}

impl ExecutionCostConfig {
    pub fn zero() -> Self {
        ExecutionCostConfig {
            enabled: true,
            commission_rate: 0.0,
            min_commission: 0.0,
            stamp_duty_rate: 0.0,
            slippage_bps: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub capital: f64,
    pub lot_size: u32,
    pub max_error_examples: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            capital: 100_000.0,
            lot_size: 100,
            max_error_examples: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Calendar days of history fetched before the signal date.
    pub history_days: i64,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dir: PathBuf::from("data"),
            history_days: 220,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessConfig {
    pub enabled: bool,
    pub probe_symbol: String,
    pub lookback_days: i64,
    pub stop_on_stale: bool,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        FreshnessConfig {
            enabled: true,
            probe_symbol: "000001".to_string(),
            lookback_days: 10,
            stop_on_stale: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportingConfig {
    pub enabled: bool,
    pub recommendation_csv: PathBuf,
    pub recommendation_md: PathBuf,
    pub backtest_csv: PathBuf,
    pub backtest_md: PathBuf,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfig {
            enabled: true,
            recommendation_csv: PathBuf::from("reports/recommendations.csv"),
            recommendation_md: PathBuf::from("reports/recommendations.md"),
            backtest_csv: PathBuf::from("reports/backtests.csv"),
            backtest_md: PathBuf::from("reports/backtests.md"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub data: DataConfig,
    pub universe: UniverseConfig,
    pub enabled_modes: Vec<ModeTier>,
    pub modes: ModeTable,
    pub scoring: NormalizationConfig,
    pub market: MarketConfig,
    pub risk_targets: RiskTargetConfig,
    pub holding: HoldingConfig,
    pub execution_cost: ExecutionCostConfig,
    pub backtest: BacktestConfig,
    pub freshness: FreshnessConfig,
    pub reporting: ReportingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data: DataConfig::default(),
            universe: UniverseConfig::default(),
            enabled_modes: ModeTier::ALL.to_vec(),
            modes: ModeTable::default(),
            scoring: NormalizationConfig::default(),
            market: MarketConfig::default(),
            risk_targets: RiskTargetConfig::default(),
            holding: HoldingConfig::default(),
            execution_cost: ExecutionCostConfig::default(),
            backtest: BacktestConfig::default(),
            freshness: FreshnessConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Resolve every section from `port`, keeping defaults for absent keys.
    pub fn load(port: &dyn ConfigPort) -> Result<Self, DaypickError> {
        let mut config = EngineConfig::default();
        let reader = Reader { port };

        let data = &mut config.data;
        if let Some(dir) = reader.string("data", "dir") {
            data.dir = PathBuf::from(dir);
        }
        data.history_days = reader.int("data", "history_days", data.history_days)?;

        let universe = &mut config.universe;
        universe.exclude_st = reader.bool("universe", "exclude_st", universe.exclude_st)?;
        universe.exclude_paused =
            reader.bool("universe", "exclude_paused", universe.exclude_paused)?;
        universe.exclude_gem_board =
            reader.bool("universe", "exclude_gem_board", universe.exclude_gem_board)?;
        universe.exclude_star_board =
            reader.bool("universe", "exclude_star_board", universe.exclude_star_board)?;
        universe.exclude_bj_board =
            reader.bool("universe", "exclude_bj_board", universe.exclude_bj_board)?;
        universe.limit = reader.usize("universe", "limit", universe.limit)?;

        if let Some(raw) = reader.string("strategy", "enabled_modes") {
            config.enabled_modes = parse_enabled_modes(&raw)?;
        }

        for tier in ModeTier::ALL {
            load_mode(&reader, tier, config.modes.get_mut(tier))?;
        }

        let scoring = &mut config.scoring;
        scoring.close_vs_ma20 = reader.range("scoring", "close_vs_ma20", scoring.close_vs_ma20)?;
        scoring.ma20_vs_ma60 = reader.range("scoring", "ma20_vs_ma60", scoring.ma20_vs_ma60)?;
        scoring.ma20_slope = reader.range("scoring", "ma20_slope", scoring.ma20_slope)?;
        scoring.mom5 = reader.range("scoring", "mom5", scoring.mom5)?;
        scoring.mom20 = reader.range("scoring", "mom20", scoring.mom20)?;
        scoring.volatility = reader.range("scoring", "volatility", scoring.volatility)?;
        scoring.vol_ratio = reader.range("scoring", "vol_ratio", scoring.vol_ratio)?;
        scoring.volume_zscore = reader.range("scoring", "volume_zscore", scoring.volume_zscore)?;

        let market = &mut config.market;
        if let Some(symbol) = reader.string("market", "index_symbol") {
            market.index_symbol = symbol;
        }
        market.lookback_days = reader.usize("market", "lookback_days", market.lookback_days)?;
        market.min_bars = reader.usize("market", "min_bars", market.min_bars)?;
        market.bear_drawdown = reader.f64("market", "bear_drawdown", market.bear_drawdown)?;

        let targets = &mut config.risk_targets;
        if let Some(method) = reader.string("risk_targets", "method") {
            targets.method = match method.to_lowercase().as_str() {
                "atr" => TargetMethod::Atr,
                "percent" | "pct" => TargetMethod::Percent,
                other => {
                    return Err(DaypickError::invalid(
                        "risk_targets",
                        "method",
                        format!("unknown method '{other}', expected atr or percent"),
                    ));
                }
            };
        }
        targets.stop_loss_atr_mult =
            reader.f64("risk_targets", "stop_loss_atr_mult", targets.stop_loss_atr_mult)?;
        targets.take_profit_atr_mult =
            reader.f64("risk_targets", "take_profit_atr_mult", targets.take_profit_atr_mult)?;
        targets.stop_loss_pct = reader.f64("risk_targets", "stop_loss_pct", targets.stop_loss_pct)?;
        targets.take_profit_pct =
            reader.f64("risk_targets", "take_profit_pct", targets.take_profit_pct)?;
        targets.price_tick = reader.f64("risk_targets", "price_tick", targets.price_tick)?;

        let holding = &mut config.holding;
        load_holding_rule(&reader, "strong", &mut holding.strong)?;
        load_holding_rule(&reader, "moderate", &mut holding.moderate)?;
        holding.base_days = reader.days("holding", "base_days", holding.base_days)?;
        holding.neutral_cap = reader.days("holding", "neutral_cap", holding.neutral_cap)?;
        holding.bear_cap = reader.days("holding", "bear_cap", holding.bear_cap)?;

        let cost = &mut config.execution_cost;
        cost.enabled = reader.bool("execution_cost", "enabled", cost.enabled)?;
        cost.commission_rate =
            reader.f64("execution_cost", "commission_rate", cost.commission_rate)?;
        cost.min_commission = reader.f64("execution_cost", "min_commission", cost.min_commission)?;
        cost.stamp_duty_rate =
            reader.f64("execution_cost", "stamp_duty_rate", cost.stamp_duty_rate)?;
        cost.slippage_bps = reader.f64("execution_cost", "slippage_bps", cost.slippage_bps)?;

        let backtest = &mut config.backtest;
        backtest.capital = reader.f64("backtest", "capital", backtest.capital)?;
        backtest.lot_size = reader.days("backtest", "lot_size", backtest.lot_size)?;
        backtest.max_error_examples =
            reader.usize("backtest", "max_error_examples", backtest.max_error_examples)?;

        let freshness = &mut config.freshness;
        freshness.enabled = reader.bool("freshness", "enabled", freshness.enabled)?;
        if let Some(symbol) = reader.string("freshness", "probe_symbol") {
            freshness.probe_symbol = symbol;
        }
        freshness.lookback_days =
            reader.int("freshness", "lookback_days", freshness.lookback_days)?;
        freshness.stop_on_stale =
            reader.bool("freshness", "stop_on_stale", freshness.stop_on_stale)?;

        let reporting = &mut config.reporting;
        reporting.enabled = reader.bool("reporting", "enabled", reporting.enabled)?;
        for (key, slot) in [
            ("recommendation_csv", &mut reporting.recommendation_csv),
            ("recommendation_md", &mut reporting.recommendation_md),
            ("backtest_csv", &mut reporting.backtest_csv),
            ("backtest_md", &mut reporting.backtest_md),
        ] {
            if let Some(path) = reader.string("reporting", key) {
                *slot = PathBuf::from(path);
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DaypickError> {
        crate::domain::config_validation::validate_engine_config(self)
    }
}

/// Parses "normal,relaxed,force"; duplicates keep their first position.
pub fn parse_enabled_modes(raw: &str) -> Result<Vec<ModeTier>, DaypickError> {
    let mut modes = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let tier: ModeTier = token
            .parse()
            .map_err(|e: String| DaypickError::invalid("strategy", "enabled_modes", e))?;
        if !modes.contains(&tier) {
            modes.push(tier);
        }
    }
    if modes.is_empty() {
        return Err(DaypickError::invalid(
            "strategy",
            "enabled_modes",
            "at least one mode must be enabled",
        ));
    }
    Ok(modes)
}

fn load_mode(reader: &Reader<'_>, tier: ModeTier, mode: &mut ModeConfig) -> Result<(), DaypickError> {
    let section = format!("mode.{}", tier.as_str());
    let s = section.as_str();
    mode.min_bars = reader.usize(s, "min_bars", mode.min_bars)?;
    mode.min_price = reader.f64(s, "min_price", mode.min_price)?;
    mode.max_price = reader.f64(s, "max_price", mode.max_price)?;
    mode.min_rsi = reader.f64(s, "min_rsi", mode.min_rsi)?;
    mode.max_rsi = reader.f64(s, "max_rsi", mode.max_rsi)?;
    mode.min_volatility = reader.f64(s, "min_volatility", mode.min_volatility)?;
    mode.max_volatility = reader.f64(s, "max_volatility", mode.max_volatility)?;
    mode.min_volume = reader.f64(s, "min_volume", mode.min_volume)?;
    mode.min_vol_ratio = reader.f64(s, "min_vol_ratio", mode.min_vol_ratio)?;
    mode.require_turnover_data =
        reader.bool(s, "require_turnover_data", mode.require_turnover_data)?;
    mode.min_turnover_rate = reader.f64(s, "min_turnover_rate", mode.min_turnover_rate)?;
    mode.require_above_ma20 = reader.bool(s, "require_above_ma20", mode.require_above_ma20)?;
    mode.require_ma_alignment =
        reader.bool(s, "require_ma_alignment", mode.require_ma_alignment)?;
    mode.min_mom20 = reader.f64(s, "min_mom20", mode.min_mom20)?;
    mode.block_on_bear = reader.bool(s, "block_on_bear", mode.block_on_bear)?;
    mode.weak_market_max_volatility = reader.optional_f64(
        s,
        "weak_market_max_volatility",
        mode.weak_market_max_volatility,
    )?;
    mode.weak_market_require_positive_mom20 = reader.bool(
        s,
        "weak_market_require_positive_mom20",
        mode.weak_market_require_positive_mom20,
    )?;
    mode.weights.trend = reader.f64(s, "weight_trend", mode.weights.trend)?;
    mode.weights.momentum = reader.f64(s, "weight_momentum", mode.weights.momentum)?;
    mode.weights.stability = reader.f64(s, "weight_stability", mode.weights.stability)?;
    mode.weights.volume = reader.f64(s, "weight_volume", mode.weights.volume)?;
    Ok(())
}

fn load_holding_rule(
    reader: &Reader<'_>,
    prefix: &str,
    rule: &mut HoldingRule,
) -> Result<(), DaypickError> {
    rule.min_mom20 = reader.f64("holding", &format!("{prefix}_min_mom20"), rule.min_mom20)?;
    rule.max_volatility =
        reader.f64("holding", &format!("{prefix}_max_volatility"), rule.max_volatility)?;
    rule.max_rsi = reader.f64("holding", &format!("{prefix}_max_rsi"), rule.max_rsi)?;
    rule.days = reader.days("holding", &format!("{prefix}_days"), rule.days)?;
    Ok(())
}

/// Strict typed lookups over a `ConfigPort`: absent keys keep the default,
/// malformed values are errors.
struct Reader<'a> {
    port: &'a dyn ConfigPort,
}

impl Reader<'_> {
    fn string(&self, section: &str, key: &str) -> Option<String> {
        self.port
            .get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: std::str::FromStr>(
        &self,
        section: &str,
        key: &str,
        expected: &str,
    ) -> Result<Option<T>, DaypickError> {
        match self.string(section, key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                DaypickError::invalid(section, key, format!("'{raw}' is not {expected}"))
            }),
        }
    }

    fn f64(&self, section: &str, key: &str, default: f64) -> Result<f64, DaypickError> {
        match self.parsed::<f64>(section, key, "a number")? {
            Some(v) if !v.is_finite() => Err(DaypickError::invalid(
                section,
                key,
                "must be a finite number",
            )),
            Some(v) => Ok(v),
            None => Ok(default),
        }
    }

    /// "none" or "off" clears the value.
    fn optional_f64(
        &self,
        section: &str,
        key: &str,
        default: Option<f64>,
    ) -> Result<Option<f64>, DaypickError> {
        match self.string(section, key) {
            Some(raw) if matches!(raw.to_lowercase().as_str(), "none" | "off") => Ok(None),
            Some(_) => self.f64(section, key, 0.0).map(Some),
            None => Ok(default),
        }
    }

    fn int(&self, section: &str, key: &str, default: i64) -> Result<i64, DaypickError> {
        Ok(self
            .parsed::<i64>(section, key, "an integer")?
            .unwrap_or(default))
    }

    fn usize(&self, section: &str, key: &str, default: usize) -> Result<usize, DaypickError> {
        Ok(self
            .parsed::<usize>(section, key, "a non-negative integer")?
            .unwrap_or(default))
    }

    fn days(&self, section: &str, key: &str, default: u32) -> Result<u32, DaypickError> {
        Ok(self
            .parsed::<u32>(section, key, "a non-negative integer")?
            .unwrap_or(default))
    }

    fn bool(&self, section: &str, key: &str, default: bool) -> Result<bool, DaypickError> {
        match self.string(section, key) {
            None => Ok(default),
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(true),
                "false" | "no" | "0" | "off" => Ok(false),
                _ => Err(DaypickError::invalid(
                    section,
                    key,
                    format!("'{raw}' is not a boolean"),
                )),
            },
        }
    }

    /// "lo,hi"
    fn range(&self, section: &str, key: &str, default: ClipRange) -> Result<ClipRange, DaypickError> {
        let Some(raw) = self.string(section, key) else {
            return Ok(default);
        };
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let bad = || DaypickError::invalid(section, key, format!("'{raw}' is not 'lo,hi'"));
        if parts.len() != 2 {
            return Err(bad());
        }
        let lo: f64 = parts[0].parse().map_err(|_| bad())?;
        let hi: f64 = parts[1].parse().map_err(|_| bad())?;
        Ok(ClipRange::new(lo, hi))
    }
}
