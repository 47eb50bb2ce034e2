//! Execution cost model: slippage, commission and stamp duty.
//!
//! Pure functions; the backtest runner is the only caller. Slippage always
//! moves the fill against the trader (buys fill higher, sells lower),
//! commission is charged on both sides with a per-side minimum, and stamp
//! duty is charged on the sell side only.

use serde::Serialize;

use crate::domain::config::ExecutionCostConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Buy: price * (1 + bps / 10000). Sell: price * (1 - bps / 10000).
pub fn apply_slippage(market_price: f64, side: Side, slippage_bps: f64) -> f64 {
    let frac = slippage_bps / 10_000.0;
    match side {
        Side::Buy => market_price * (1.0 + frac),
        Side::Sell => market_price * (1.0 - frac),
    }
}

/// max(notional * rate, min_commission); nothing on an empty trade.
pub fn calculate_commission(notional: f64, config: &ExecutionCostConfig) -> f64 {
    if notional <= 0.0 {
        return 0.0;
    }
    (notional * config.commission_rate).max(config.min_commission)
}

pub fn calculate_stamp_duty(notional: f64, side: Side, config: &ExecutionCostConfig) -> f64 {
    match side {
        Side::Sell if notional > 0.0 => notional * config.stamp_duty_rate,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fill {
    pub side: Side,
    pub market_price: f64,
    pub fill_price: f64,
    pub quantity: i64,
    pub notional: f64,
    pub commission: f64,
    pub stamp_duty: f64,
}

impl Fill {
    pub fn fees(&self) -> f64 {
        self.commission + self.stamp_duty
    }
}

/// Simulate one side of a trade. A disabled model fills at market with no fees.
pub fn simulate_fill(
    market_price: f64,
    quantity: i64,
    side: Side,
    config: &ExecutionCostConfig,
) -> Fill {
    if !config.enabled {
        return Fill {
            side,
            market_price,
            fill_price: market_price,
            quantity,
            notional: market_price * quantity as f64,
            commission: 0.0,
            stamp_duty: 0.0,
        };
    }
    let fill_price = apply_slippage(market_price, side, config.slippage_bps);
    let notional = fill_price * quantity as f64;
    Fill {
        side,
        market_price,
        fill_price,
        quantity,
        notional,
        commission: calculate_commission(notional, config),
        stamp_duty: calculate_stamp_duty(notional, side, config),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundTrip {
    pub entry: Fill,
    pub exit: Fill,
    pub gross_return: f64,
    pub net_return: f64,
}

impl RoundTrip {
    pub fn total_fees(&self) -> f64 {
        self.entry.fees() + self.exit.fees()
    }
}

/// Buy at `entry_price`, sell at `exit_price`.
///
/// Net return is per share: fees are spread over the quantity, so with zero
/// costs the net return equals the gross return exactly.
pub fn round_trip(
    entry_price: f64,
    exit_price: f64,
    quantity: i64,
    config: &ExecutionCostConfig,
) -> RoundTrip {
    let entry = simulate_fill(entry_price, quantity, Side::Buy, config);
    let exit = simulate_fill(exit_price, quantity, Side::Sell, config);

    let gross_return = if entry_price > 0.0 {
        exit_price / entry_price - 1.0
    } else {
        0.0
    };

    let q = quantity.max(1) as f64;
    let cost_basis = entry.fill_price + entry.fees() / q;
    let proceeds = exit.fill_price - exit.fees() / q;
    let net_return = if cost_basis > 0.0 {
        proceeds / cost_basis - 1.0
    } else {
        0.0
    };

    RoundTrip {
        entry,
        exit,
        gross_return,
        net_return,
    }
}

/// Whole lots affordable with `capital` at `price`; at least one lot.
pub fn lot_quantity(capital: f64, price: f64, lot_size: u32) -> i64 {
    let lot = lot_size.max(1) as i64;
    if price <= 0.0 || capital <= 0.0 {
        return lot;
    }
    let lots = (capital / (price * lot as f64)).floor() as i64;
    lots.max(1) * lot
}
