//! Universe selection: board classification and listing-level exclusions.
//!
//! ST and suspended stocks, plus excluded boards, are dropped before any bars
//! are fetched. The risk filter re-checks the board so that a symbol handed
//! in directly (e.g. via `explain`) is still rejected.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::bar::StockInfo;
use crate::domain::config::UniverseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Board {
    Main,
    /// ChiNext, codes starting with 300.
    Gem,
    /// STAR market, codes starting with 688.
    Star,
    /// Beijing exchange, codes starting with 4 or 8.
    Beijing,
}

impl Board {
    pub fn of(symbol: &str) -> Board {
        if symbol.starts_with("300") {
            Board::Gem
        } else if symbol.starts_with("688") {
            Board::Star
        } else if symbol.starts_with('4') || symbol.starts_with('8') {
            Board::Beijing
        } else {
            Board::Main
        }
    }
}

impl UniverseConfig {
    pub fn excludes_board(&self, symbol: &str) -> bool {
        match Board::of(symbol) {
            Board::Main => false,
            Board::Gem => self.exclude_gem_board,
            Board::Star => self.exclude_star_board,
            Board::Beijing => self.exclude_bj_board,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UniverseSelection {
    pub stocks: Vec<StockInfo>,
    pub listed: usize,
    pub excluded_st: usize,
    pub excluded_paused: usize,
    pub excluded_board: usize,
    pub truncated: usize,
}

/// Deduplicates by symbol, applies exclusions, sorts by symbol, then caps at
/// `config.limit` when non-zero.
pub fn filter_universe(listing: &[StockInfo], config: &UniverseConfig) -> UniverseSelection {
    let mut selection = UniverseSelection {
        listed: listing.len(),
        ..UniverseSelection::default()
    };
    let mut seen = HashSet::new();

    for stock in listing {
        if !seen.insert(stock.symbol.as_str()) {
            continue;
        }
        if config.exclude_st && stock.is_st {
            selection.excluded_st += 1;
        } else if config.exclude_paused && stock.is_paused {
            selection.excluded_paused += 1;
        } else if config.excludes_board(&stock.symbol) {
            selection.excluded_board += 1;
        } else {
            selection.stocks.push(stock.clone());
        }
    }

    selection.stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    if config.limit > 0 && selection.stocks.len() > config.limit {
        selection.truncated = selection.stocks.len() - config.limit;
        selection.stocks.truncate(config.limit);
    }
    selection
}
