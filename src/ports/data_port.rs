//! Market data access port trait.

use crate::domain::bar::{DailyBar, StockInfo};
use crate::domain::error::DaypickError;
use chrono::NaiveDate;

/// Source of listings, the trading calendar and daily bars.
///
/// Bar ranges are inclusive on both ends. Implementations return bars sorted
/// by date without duplicates; `NoData` when the symbol is unknown and
/// `DataSource` for transport or parse failures.
pub trait DataPort {
    fn list_stocks(&self) -> Result<Vec<StockInfo>, DaypickError>;

    fn trade_dates(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DaypickError>;

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError>;

    fn fetch_index_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError>;
}
