//! Trade statistics for a backtest run.
//!
//! The equity curve compounds each trade's net return from 1.0; drawdown is
//! measured on that curve, with the starting value as the first peak.

use serde::Serialize;

use super::position::Trade;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub trades: usize,
    pub wins_gross: usize,
    pub wins_net: usize,
    pub win_rate_gross: f64,
    pub win_rate_net: f64,
    pub avg_return_gross: f64,
    pub avg_return_net: f64,
    /// Compounded net return over all trades.
    pub total_return_net: f64,
    pub max_drawdown: f64,
    /// Longest run of trades spent below the previous equity peak.
    pub max_drawdown_trades: usize,
    pub largest_win_net: f64,
    pub largest_loss_net: f64,
    pub profit_factor_net: f64,
    pub avg_bars_held: f64,
    pub total_fees: f64,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return TradeStats::default();
        }
        let n = trades.len() as f64;

        let wins_gross = trades.iter().filter(|t| t.gross_return > 0.0).count();
        let wins_net = trades.iter().filter(|t| t.net_return > 0.0).count();

        let mut largest_win_net = 0.0_f64;
        let mut largest_loss_net = 0.0_f64;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        for t in trades {
            if t.net_return > 0.0 {
                total_wins += t.net_return;
                largest_win_net = largest_win_net.max(t.net_return);
            } else if t.net_return < 0.0 {
                total_losses += t.net_return.abs();
                largest_loss_net = largest_loss_net.max(t.net_return.abs());
            }
        }
        let profit_factor_net = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let curve = equity_curve(trades);
        let (max_drawdown, max_drawdown_trades) = compute_drawdown(&curve);
        let final_equity = curve.last().copied().unwrap_or(1.0);

        TradeStats {
            trades: trades.len(),
            wins_gross,
            wins_net,
            win_rate_gross: wins_gross as f64 / n,
            win_rate_net: wins_net as f64 / n,
            avg_return_gross: trades.iter().map(|t| t.gross_return).sum::<f64>() / n,
            avg_return_net: trades.iter().map(|t| t.net_return).sum::<f64>() / n,
            total_return_net: final_equity - 1.0,
            max_drawdown,
            max_drawdown_trades,
            largest_win_net,
            largest_loss_net,
            profit_factor_net,
            avg_bars_held: trades.iter().map(|t| t.bars_held as f64).sum::<f64>() / n,
            total_fees: trades.iter().map(|t| t.fees).sum(),
        }
    }
}

/// Compounded net equity starting at 1.0, one point per trade plus the start.
pub fn equity_curve(trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = 1.0;
    curve.push(equity);
    for t in trades {
        equity *= 1.0 + t.net_return;
        curve.push(equity);
    }
    curve
}

fn compute_drawdown(curve: &[f64]) -> (f64, usize) {
    let Some(&first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for &equity in curve {
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode_chain::ModeTier;
    use crate::domain::position::ExitReason;
    use chrono::NaiveDate;

    fn make_trade(gross: f64, net: f64) -> Trade {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        Trade {
            decision_date: date,
            symbol: "600000".into(),
            name: "test".into(),
            tier: ModeTier::Normal,
            entry_date: date,
            entry_price: 10.0,
            exit_date: date + chrono::Duration::days(2),
            exit_price: 10.0 * (1.0 + gross),
            exit_reason: ExitReason::HoldingElapsed,
            quantity: 100,
            bars_held: 2,
            gross_return: gross,
            net_return: net,
            fees: 1.0,
        }
    }

    #[test]
    fn empty_trades() {
        let stats = TradeStats::compute(&[]);
        assert_eq!(stats.trades, 0);
        assert!(stats.max_drawdown.abs() < f64::EPSILON);
    }

    #[test]
    fn win_rates_and_averages() {
        let trades = vec![
            make_trade(0.05, 0.048),
            make_trade(0.001, -0.001),
            make_trade(-0.02, -0.022),
        ];
        let stats = TradeStats::compute(&trades);
        assert_eq!(stats.trades, 3);
        assert_eq!(stats.wins_gross, 2);
        assert_eq!(stats.wins_net, 1);
        assert!((stats.win_rate_gross - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.win_rate_net - 1.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_return_gross - 0.031 / 3.0).abs() < 1e-12);
        assert!((stats.avg_return_net - 0.025 / 3.0).abs() < 1e-12);
        assert!((stats.total_fees - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compounded_total_return() {
        let trades = vec![make_trade(0.1, 0.1), make_trade(0.1, 0.1)];
        let stats = TradeStats::compute(&trades);
        assert!((stats.total_return_net - 0.21).abs() < 1e-12);
    }

    #[test]
    fn drawdown_on_compounded_curve() {
        // 1.0 → 1.1 → 0.88 → 0.968
        let trades = vec![
            make_trade(0.1, 0.1),
            make_trade(-0.2, -0.2),
            make_trade(0.1, 0.1),
        ];
        let stats = TradeStats::compute(&trades);
        assert!((stats.max_drawdown - 0.2).abs() < 1e-12);
        assert_eq!(stats.max_drawdown_trades, 2);
    }

    #[test]
    fn first_trade_loss_counts_from_start() {
        let stats = TradeStats::compute(&[make_trade(-0.05, -0.05)]);
        assert!((stats.max_drawdown - 0.05).abs() < 1e-12);
    }

    #[test]
    fn profit_factor() {
        let trades = vec![make_trade(0.06, 0.06), make_trade(-0.03, -0.03)];
        let stats = TradeStats::compute(&trades);
        assert!((stats.profit_factor_net - 2.0).abs() < 1e-12);
        assert!((stats.largest_win_net - 0.06).abs() < f64::EPSILON);
        assert!((stats.largest_loss_net - 0.03).abs() < f64::EPSILON);
    }
}
