//! Walk-forward backtest over a date range.
//!
//! Each trading date in the range is handed to the [`Recommender`] as a
//! target date. One position slot: a decision opens a trade at the target
//! date's open only when no earlier trade is still open. Per-day failures are
//! recorded and never stop the run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::bar::SymbolSeries;
use crate::domain::error::DaypickError;
use crate::domain::execution::{lot_quantity, round_trip};
use crate::domain::metrics::TradeStats;
use crate::domain::mode_chain::ModeTier;
use crate::domain::position::{ExitReason, Position, Trade, find_exit};
use crate::domain::recommender::{Recommendation, Recommender};

pub const MIN_TRADING_DAYS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DayOutcome {
    /// Decision opened a trade.
    Traded { symbol: String, tier: ModeTier },
    /// Decision made while a position was open.
    Held { symbol: String, tier: ModeTier },
    /// Decision made but no trade was possible: no bar on the target date,
    /// or no later bar in range to sell on.
    NotTraded {
        symbol: String,
        tier: ModeTier,
        reason: String,
    },
    Error { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: DayOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorExample {
    pub date: NaiveDate,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub attempted_days: usize,
    pub decided_days: usize,
    pub skipped_days: usize,
    pub trades: Vec<Trade>,
    pub days: Vec<DayRecord>,
    pub stats: TradeStats,
    pub mode_counts: BTreeMap<ModeTier, usize>,
    pub exit_counts: BTreeMap<ExitReason, usize>,
    pub error_counts: BTreeMap<String, usize>,
    pub error_examples: Vec<ErrorExample>,
}

impl BacktestReport {
    fn new(start: NaiveDate, end: NaiveDate) -> Self {
        BacktestReport {
            start,
            end,
            attempted_days: 0,
            decided_days: 0,
            skipped_days: 0,
            trades: Vec::new(),
            days: Vec::new(),
            stats: TradeStats::default(),
            mode_counts: BTreeMap::new(),
            exit_counts: BTreeMap::new(),
            error_counts: BTreeMap::new(),
            error_examples: Vec::new(),
        }
    }

    fn note_error(&mut self, date: NaiveDate, err: &DaypickError, max_examples: usize) {
        *self.error_counts.entry(err.kind().to_string()).or_insert(0) += 1;
        if self.error_examples.len() < max_examples {
            self.error_examples.push(ErrorExample {
                date,
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
        }
    }

    /// Day without a decision.
    fn record_error(&mut self, date: NaiveDate, err: &DaypickError, max_examples: usize) {
        self.note_error(date, err, max_examples);
        let kind = err.kind().to_string();
        let message = err.to_string();
        self.skipped_days += 1;
        self.days.push(DayRecord {
            date,
            outcome: DayOutcome::Error { kind, message },
        });
    }
}

pub struct BacktestRunner<'a> {
    recommender: Recommender<'a>,
}

impl<'a> BacktestRunner<'a> {
    pub fn new(recommender: Recommender<'a>) -> Self {
        BacktestRunner { recommender }
    }

    pub fn run(&mut self, start: NaiveDate, end: NaiveDate) -> Result<BacktestReport, DaypickError> {
        let data = self.recommender.data_port();
        let config = self.recommender.config();

        let dates = data.trade_dates(start, end)?;
        if dates.len() < MIN_TRADING_DAYS {
            return Err(DaypickError::InsufficientTradingDays {
                found: dates.len(),
                minimum: MIN_TRADING_DAYS,
            });
        }
        info!(%start, %end, days = dates.len(), "backtest started");

        let mut report = BacktestReport::new(start, end);
        let mut busy_until: Option<NaiveDate> = None;

        for &date in &dates {
            report.attempted_days += 1;
            let rec = match self.recommender.recommend(date) {
                Ok(rec) => rec,
                Err(e) => {
                    warn!(%date, kind = e.kind(), error = %e, "no decision");
                    report.record_error(date, &e, config.backtest.max_error_examples);
                    continue;
                }
            };
            report.decided_days += 1;
            *report.mode_counts.entry(rec.tier).or_insert(0) += 1;

            if let Some(until) = busy_until
                && date <= until
            {
                debug!(%date, symbol = %rec.symbol, %until, "position open; decision not traded");
                report.days.push(DayRecord {
                    date,
                    outcome: DayOutcome::Held {
                        symbol: rec.symbol,
                        tier: rec.tier,
                    },
                });
                continue;
            }

            match self.open_trade(&rec, end) {
                Ok(Ok(trade)) => {
                    info!(
                        %date,
                        symbol = %trade.symbol,
                        exit = %trade.exit_reason,
                        net_return = trade.net_return,
                        "trade closed"
                    );
                    busy_until = Some(trade.exit_date);
                    *report.exit_counts.entry(trade.exit_reason).or_insert(0) += 1;
                    report.days.push(DayRecord {
                        date,
                        outcome: DayOutcome::Traded {
                            symbol: trade.symbol.clone(),
                            tier: trade.tier,
                        },
                    });
                    report.trades.push(trade);
                }
                Ok(Err(reason)) => {
                    warn!(%date, symbol = %rec.symbol, %reason, "not traded");
                    report.days.push(DayRecord {
                        date,
                        outcome: DayOutcome::NotTraded {
                            symbol: rec.symbol,
                            tier: rec.tier,
                            reason,
                        },
                    });
                }
                Err(e) => {
                    warn!(%date, symbol = %rec.symbol, error = %e, "trade simulation failed");
                    report.note_error(date, &e, config.backtest.max_error_examples);
                    report.days.push(DayRecord {
                        date,
                        outcome: DayOutcome::NotTraded {
                            symbol: rec.symbol,
                            tier: rec.tier,
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        report.stats = TradeStats::compute(&report.trades);
        info!(
            attempted = report.attempted_days,
            skipped = report.skipped_days,
            trades = report.stats.trades,
            win_rate_net = report.stats.win_rate_net,
            "backtest finished"
        );
        Ok(report)
    }

    /// Enter at the target date's open and walk forward to the exit. The
    /// inner `Err` names why no trade could be opened.
    fn open_trade(
        &self,
        rec: &Recommendation,
        end: NaiveDate,
    ) -> Result<Result<Trade, String>, DaypickError> {
        let config = self.recommender.config();
        let fetched = self
            .recommender
            .data_port()
            .fetch_daily_bars(&rec.symbol, rec.target_date, end)?;
        let series = SymbolSeries::new(&rec.symbol, fetched);
        let bars = series.from_date(rec.target_date);
        let Some(entry_bar) = bars.first().filter(|b| b.date == rec.target_date) else {
            return Ok(Err(format!("no bar on {}", rec.target_date)));
        };
        // T+1: the entry bar itself can never be the exit.
        if bars.len() < 2 {
            return Ok(Err(format!("no bar after {} up to {}", rec.target_date, end)));
        }

        let entry_price = entry_bar.open;
        let position = Position {
            symbol: rec.symbol.clone(),
            entry_date: entry_bar.date,
            entry_price,
            quantity: lot_quantity(
                config.backtest.capital,
                entry_price,
                config.backtest.lot_size,
            ),
            stop_loss: rec.targets.stop_loss_price,
            take_profit: rec.targets.take_profit_price,
            holding_days: rec.targets.suggested_holding_days,
        };
        let Some(exit) = find_exit(&position, bars) else {
            return Ok(Err(format!("no exit found for {}", rec.symbol)));
        };

        let rt = round_trip(
            entry_price,
            exit.price,
            position.quantity,
            &config.execution_cost,
        );
        Ok(Ok(Trade {
            decision_date: rec.target_date,
            symbol: rec.symbol.clone(),
            name: rec.name.clone(),
            tier: rec.tier,
            entry_date: position.entry_date,
            entry_price,
            exit_date: exit.date,
            exit_price: exit.price,
            exit_reason: exit.reason,
            quantity: position.quantity,
            bars_held: exit.bars_held,
            gross_return: rt.gross_return,
            net_return: rt.net_return,
            fees: rt.total_fees(),
        }))
    }
}
