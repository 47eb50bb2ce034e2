//! Recommendation orchestrator: one decision per target date.
//!
//! Flow for a target date:
//! 1. Resolve the T-1 signal date from the trading calendar
//! 2. Optionally probe data freshness
//! 3. Classify the market regime once for the signal date
//! 4. Select the universe, fetch bars, compute indicators (in parallel)
//! 5. Run the mode chain and attach risk targets to the winner

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::bar::{StockInfo, SymbolSeries};
use crate::domain::config::EngineConfig;
use crate::domain::error::DaypickError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::mode_chain::{ModeTier, TierStats, evaluate_tier, run_chain};
use crate::domain::regime::{MarketRegime, RegimeCache, classify_regime};
use crate::domain::risk_filter::{CandidateFilter, FilterReport, RiskFilter};
use crate::domain::risk_targets::{RiskTargets, compute_targets};
use crate::domain::scoring::{ScoreCard, build_reasons, score};
use crate::domain::snapshot::SymbolSnapshot;
use crate::domain::universe::filter_universe;
use crate::ports::data_port::DataPort;

/// Calendar days searched backwards for the signal date.
const SIGNAL_LOOKBACK_DAYS: i64 = 30;
/// Minimum calendar-day window fetched for the benchmark.
const MIN_INDEX_FETCH_DAYS: i64 = 180;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    pub listed: usize,
    pub excluded_st: usize,
    pub excluded_paused: usize,
    pub excluded_board: usize,
    pub truncated: usize,
    pub selected: usize,
    pub fetch_failed: usize,
    pub no_bars: usize,
    pub short_history: usize,
    pub evaluated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub target_date: NaiveDate,
    pub signal_date: NaiveDate,
    pub symbol: String,
    pub name: String,
    pub tier: ModeTier,
    pub score: ScoreCard,
    pub indicators: IndicatorSet,
    pub regime: MarketRegime,
    pub targets: RiskTargets,
    pub reasons: Vec<String>,
    pub tier_stats: Vec<TierStats>,
    pub scan: ScanStats,
}

/// Single-symbol, single-tier diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub target_date: NaiveDate,
    pub signal_date: NaiveDate,
    pub symbol: String,
    pub name: String,
    pub tier: ModeTier,
    pub regime: MarketRegime,
    pub bar_count: usize,
    pub indicators: Option<IndicatorSet>,
    pub filter: FilterReport,
    pub passed: bool,
    pub score: Option<ScoreCard>,
    pub targets: Option<RiskTargets>,
}

pub struct Recommender<'a> {
    data: &'a dyn DataPort,
    config: &'a EngineConfig,
    filter: Box<dyn CandidateFilter + 'a>,
    regimes: RegimeCache,
}

impl<'a> Recommender<'a> {
    pub fn new(data: &'a dyn DataPort, config: &'a EngineConfig) -> Self {
        Recommender {
            data,
            config,
            filter: Box::new(RiskFilter::new(config.universe.clone())),
            regimes: RegimeCache::default(),
        }
    }

    /// Replace the risk gate, e.g. to instrument tier evaluation.
    pub fn with_filter(mut self, filter: Box<dyn CandidateFilter + 'a>) -> Self {
        self.filter = filter;
        self
    }

    pub fn data_port(&self) -> &'a dyn DataPort {
        self.data
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn recommend(&mut self, target_date: NaiveDate) -> Result<Recommendation, DaypickError> {
        let signal_date = self.resolve_signal_date(target_date)?;
        info!(%target_date, %signal_date, "recommending");

        self.check_freshness(signal_date)?;
        let regime = self.regime_for(signal_date)?;
        info!(
            regime = %regime.state,
            index = %regime.index_symbol,
            drawdown = regime.drawdown,
            "market regime"
        );

        let listing = self.data.list_stocks()?;
        let selection = filter_universe(&listing, &self.config.universe);
        let mut scan = ScanStats {
            listed: selection.listed,
            excluded_st: selection.excluded_st,
            excluded_paused: selection.excluded_paused,
            excluded_board: selection.excluded_board,
            truncated: selection.truncated,
            selected: selection.stocks.len(),
            ..ScanStats::default()
        };

        let snapshots = self.load_snapshots(&selection.stocks, signal_date, &mut scan);
        info!(
            selected = scan.selected,
            evaluated = scan.evaluated,
            fetch_failed = scan.fetch_failed,
            short_history = scan.short_history,
            "universe loaded"
        );

        let config = self.config;
        let filter = self.filter.as_ref();
        let chain = run_chain(&config.enabled_modes, |tier| {
            evaluate_tier(
                tier,
                config.modes.get(tier),
                &snapshots,
                regime.state,
                filter,
                &config.scoring,
            )
        });

        let outcome = match chain {
            Ok(outcome) => outcome,
            Err(exhausted) => {
                for stats in &exhausted.tier_stats {
                    info!(
                        tier = %stats.tier,
                        scanned = stats.scanned,
                        rejected = %stats.rejection_summary(),
                        "tier produced no candidate"
                    );
                }
                return Err(DaypickError::NoCandidate {
                    date: target_date,
                    modes: exhausted.tried_label(),
                });
            }
        };
        for stats in &outcome.tier_stats {
            info!(
                tier = %stats.tier,
                scanned = stats.scanned,
                passed = stats.passed,
                rejected = %stats.rejection_summary(),
                "tier stats"
            );
        }

        let winner = outcome.winner;
        let targets = compute_targets(
            &winner.indicators,
            regime.state,
            &config.risk_targets,
            &config.holding,
        );
        let mut reasons = build_reasons(&winner.indicators, &winner.score, winner.tier);
        reasons.push(format!(
            "market {} (index {} close {:.2}, MA20 {:.2}, MA60 {:.2})",
            regime.state, regime.index_symbol, regime.close, regime.ma20, regime.ma60
        ));

        info!(
            symbol = %winner.symbol,
            tier = %winner.tier,
            score = winner.score.total,
            "selected"
        );

        Ok(Recommendation {
            target_date,
            signal_date,
            symbol: winner.symbol,
            name: winner.name,
            tier: winner.tier,
            score: winner.score,
            indicators: winner.indicators,
            regime,
            targets,
            reasons,
            tier_stats: outcome.tier_stats,
            scan,
        })
    }

    /// Evaluate one symbol under exactly one tier and report every check.
    pub fn explain(
        &mut self,
        symbol: &str,
        target_date: NaiveDate,
        tier: ModeTier,
    ) -> Result<Explanation, DaypickError> {
        let signal_date = self.resolve_signal_date(target_date)?;
        let regime = self.regime_for(signal_date)?;

        let name = match self.data.list_stocks() {
            Ok(listing) => listing
                .into_iter()
                .find(|s| s.symbol == symbol)
                .map(|s| s.name)
                .unwrap_or_else(|| symbol.to_string()),
            Err(e) => {
                warn!(error = %e, "stock listing unavailable; using symbol as name");
                symbol.to_string()
            }
        };

        let series = self.fetch_symbol_bars(symbol, signal_date)?;
        let bars = series.up_to(signal_date);
        if bars.is_empty() {
            return Err(DaypickError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let snapshot = SymbolSnapshot::build(StockInfo::new(symbol, &name), bars);

        let mode = self.config.modes.get(tier);
        let report = self.filter.evaluate(&snapshot, tier, mode, regime.state);
        let score = snapshot
            .indicators
            .as_ref()
            .map(|ind| score(ind, &mode.weights, &self.config.scoring));
        let targets = snapshot.indicators.as_ref().map(|ind| {
            compute_targets(
                ind,
                regime.state,
                &self.config.risk_targets,
                &self.config.holding,
            )
        });

        Ok(Explanation {
            target_date,
            signal_date,
            symbol: symbol.to_string(),
            name,
            tier,
            regime,
            bar_count: snapshot.bar_count,
            passed: report.passed(),
            indicators: snapshot.indicators,
            filter: report,
            score,
            targets,
        })
    }

    /// Previous trading day when the target is itself a trading day,
    /// otherwise the last trading day before it.
    pub fn resolve_signal_date(&self, target_date: NaiveDate) -> Result<NaiveDate, DaypickError> {
        let start = target_date - Duration::days(SIGNAL_LOOKBACK_DAYS);
        let dates = self.data.trade_dates(start, target_date)?;
        if dates.len() < 2 {
            return Err(DaypickError::NoSignalDate {
                target: target_date,
            });
        }
        let last = dates[dates.len() - 1];
        if last == target_date {
            Ok(dates[dates.len() - 2])
        } else {
            Ok(last)
        }
    }

    fn check_freshness(&self, signal_date: NaiveDate) -> Result<(), DaypickError> {
        let fresh = &self.config.freshness;
        if !fresh.enabled {
            return Ok(());
        }
        let start = signal_date - Duration::days(fresh.lookback_days);
        let reason = match self.data.fetch_daily_bars(&fresh.probe_symbol, start, signal_date) {
            Ok(bars) => match SymbolSeries::new(&fresh.probe_symbol, bars).last() {
                Some(last) if last.date >= signal_date => return Ok(()),
                Some(last) => format!(
                    "probe {} latest bar {} is before signal date {}",
                    fresh.probe_symbol, last.date, signal_date
                ),
                None => format!(
                    "probe {} has no bars between {} and {}",
                    fresh.probe_symbol, start, signal_date
                ),
            },
            Err(e) => format!("probe {} failed: {}", fresh.probe_symbol, e),
        };

        warn!(%reason, "data may be stale");
        if fresh.stop_on_stale {
            Err(DaypickError::StaleData { reason })
        } else {
            Ok(())
        }
    }

    fn regime_for(&mut self, signal_date: NaiveDate) -> Result<MarketRegime, DaypickError> {
        let data = self.data;
        let market = &self.config.market;
        self.regimes.get_or_try_insert_with(signal_date, || {
            let days = (market.lookback_days as i64 * 2).max(MIN_INDEX_FETCH_DAYS);
            let start = signal_date - Duration::days(days);
            let bars = data.fetch_index_bars(&market.index_symbol, start, signal_date)?;
            classify_regime(
                &SymbolSeries::new(&market.index_symbol, bars),
                signal_date,
                market,
            )
        })
    }

    fn fetch_symbol_bars(
        &self,
        symbol: &str,
        signal_date: NaiveDate,
    ) -> Result<SymbolSeries, DaypickError> {
        let start = signal_date - Duration::days(self.config.data.history_days);
        let bars = self.data.fetch_daily_bars(symbol, start, signal_date)?;
        Ok(SymbolSeries::new(symbol, bars))
    }

    /// Fetch sequentially, skipping symbols whose data fails, then compute
    /// indicators in parallel. Result is sorted by symbol.
    fn load_snapshots(
        &self,
        stocks: &[StockInfo],
        signal_date: NaiveDate,
        scan: &mut ScanStats,
    ) -> Vec<SymbolSnapshot> {
        let mut fetched = Vec::with_capacity(stocks.len());
        for stock in stocks {
            match self.fetch_symbol_bars(&stock.symbol, signal_date) {
                Ok(series) if series.up_to(signal_date).is_empty() => {
                    debug!(symbol = %stock.symbol, "no bars up to signal date");
                    scan.no_bars += 1;
                }
                Ok(series) => fetched.push((stock.clone(), series)),
                Err(e) => {
                    warn!(symbol = %stock.symbol, error = %e, "skipping symbol");
                    scan.fetch_failed += 1;
                }
            }
        }

        let mut snapshots: Vec<SymbolSnapshot> = fetched
            .into_par_iter()
            .map(|(info, series)| SymbolSnapshot::build(info, series.up_to(signal_date)))
            .collect();
        snapshots.sort_by(|a, b| a.info.symbol.cmp(&b.info.symbol));

        scan.short_history = snapshots.iter().filter(|s| s.indicators.is_none()).count();
        scan.evaluated = snapshots.len();
        snapshots
    }
}
