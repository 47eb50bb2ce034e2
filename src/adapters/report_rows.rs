//! Flat report rows shared by the CSV and Markdown report adapters.

use chrono::Local;
use serde::Serialize;

use crate::domain::backtest::BacktestReport;
use crate::domain::recommender::Recommendation;

fn run_time() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub run_time: String,
    pub target_date: String,
    pub signal_date: String,
    pub symbol: String,
    pub name: String,
    pub mode: String,
    pub regime: String,
    pub score: String,
    pub close: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub holding_days: u32,
    pub reasons: String,
}

impl RecommendationRow {
    pub const HEADERS: [&'static str; 13] = [
        "run_time",
        "target_date",
        "signal_date",
        "symbol",
        "name",
        "mode",
        "regime",
        "score",
        "close",
        "stop_loss",
        "take_profit",
        "holding_days",
        "reasons",
    ];

    pub fn from_recommendation(rec: &Recommendation) -> Self {
        RecommendationRow {
            run_time: run_time(),
            target_date: rec.target_date.to_string(),
            signal_date: rec.signal_date.to_string(),
            symbol: rec.symbol.clone(),
            name: rec.name.clone(),
            mode: rec.tier.to_string(),
            regime: rec.regime.state.to_string(),
            score: format!("{:.2}", rec.score.total),
            close: format!("{:.2}", rec.indicators.close),
            stop_loss: format!("{:.2}", rec.targets.stop_loss_price),
            take_profit: format!("{:.2}", rec.targets.take_profit_price),
            holding_days: rec.targets.suggested_holding_days,
            reasons: rec.reasons.join("; "),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.run_time.clone(),
            self.target_date.clone(),
            self.signal_date.clone(),
            self.symbol.clone(),
            self.name.clone(),
            self.mode.clone(),
            self.regime.clone(),
            self.score.clone(),
            self.close.clone(),
            self.stop_loss.clone(),
            self.take_profit.clone(),
            self.holding_days.to_string(),
            self.reasons.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRow {
    pub run_time: String,
    pub start: String,
    pub end: String,
    pub attempted_days: usize,
    pub skipped_days: usize,
    pub trades: usize,
    pub win_rate_gross: String,
    pub win_rate_net: String,
    pub avg_return_gross: String,
    pub avg_return_net: String,
    pub total_return_net: String,
    pub max_drawdown: String,
    pub modes: String,
    pub exits: String,
    pub errors: String,
}

fn join_counts<K: std::fmt::Display>(counts: &std::collections::BTreeMap<K, usize>) -> String {
    counts
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl BacktestRow {
    pub const HEADERS: [&'static str; 15] = [
        "run_time",
        "start",
        "end",
        "attempted_days",
        "skipped_days",
        "trades",
        "win_rate_gross",
        "win_rate_net",
        "avg_return_gross",
        "avg_return_net",
        "total_return_net",
        "max_drawdown",
        "modes",
        "exits",
        "errors",
    ];

    pub fn from_report(report: &BacktestReport) -> Self {
        let stats = &report.stats;
        BacktestRow {
            run_time: run_time(),
            start: report.start.to_string(),
            end: report.end.to_string(),
            attempted_days: report.attempted_days,
            skipped_days: report.skipped_days,
            trades: stats.trades,
            win_rate_gross: pct(stats.win_rate_gross),
            win_rate_net: pct(stats.win_rate_net),
            avg_return_gross: pct(stats.avg_return_gross),
            avg_return_net: pct(stats.avg_return_net),
            total_return_net: pct(stats.total_return_net),
            max_drawdown: pct(stats.max_drawdown),
            modes: join_counts(&report.mode_counts),
            exits: join_counts(&report.exit_counts),
            errors: join_counts(&report.error_counts),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.run_time.clone(),
            self.start.clone(),
            self.end.clone(),
            self.attempted_days.to_string(),
            self.skipped_days.to_string(),
            self.trades.to_string(),
            self.win_rate_gross.clone(),
            self.win_rate_net.clone(),
            self.avg_return_gross.clone(),
            self.avg_return_net.clone(),
            self.total_return_net.clone(),
            self.max_drawdown.clone(),
            self.modes.clone(),
            self.exits.clone(),
            self.errors.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn join_counts_formats_pairs() {
        let mut counts = BTreeMap::new();
        counts.insert("no_candidate".to_string(), 3);
        counts.insert("data_source".to_string(), 1);
        assert_eq!(join_counts(&counts), "data_source=1 no_candidate=3");
        assert_eq!(join_counts(&BTreeMap::<String, usize>::new()), "");
    }

    #[test]
    fn pct_formats_two_decimals() {
        assert_eq!(pct(0.12345), "12.35%");
        assert_eq!(pct(-0.01), "-1.00%");
    }
}
