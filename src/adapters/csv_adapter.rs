//! CSV directory data adapter.
//!
//! Layout under the base directory:
//! - `stocks.csv`: `symbol,name[,is_st,is_paused]`
//! - `bars/<symbol>.csv`: `date,open,high,low,close,volume[,turnover_rate]`
//! - `index/<symbol>.csv`: same columns as `bars/`
//!
//! The trading calendar is the date column of the calendar index file.

use crate::domain::bar::{DailyBar, StockInfo, SymbolSeries};
use crate::domain::error::DaypickError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
    calendar_symbol: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, calendar_symbol: &str) -> Self {
        Self {
            base_path,
            calendar_symbol: calendar_symbol.to_string(),
        }
    }

    fn bars_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("bars").join(format!("{symbol}.csv"))
    }

    fn index_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("index").join(format!("{symbol}.csv"))
    }

    fn read_bars(
        path: &Path,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DaypickError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => {
                return Err(DaypickError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.deserialize::<DailyBar>() {
            let bar = result.map_err(|e| DaypickError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            if bar.date >= start_date && bar.date <= end_date {
                bars.push(bar);
            }
        }

        Ok(SymbolSeries::new(symbol, bars).into_bars())
    }
}

impl DataPort for CsvAdapter {
    fn list_stocks(&self) -> Result<Vec<StockInfo>, DaypickError> {
        let path = self.base_path.join("stocks.csv");
        let content = fs::read_to_string(&path).map_err(|e| DaypickError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut stocks = Vec::new();
        for result in rdr.deserialize::<StockInfo>() {
            let stock = result.map_err(|e| DaypickError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            stocks.push(stock);
        }
        Ok(stocks)
    }

    fn trade_dates(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DaypickError> {
        let bars = Self::read_bars(
            &self.index_path(&self.calendar_symbol),
            &self.calendar_symbol,
            start_date,
            end_date,
        )?;
        Ok(bars.into_iter().map(|b| b.date).collect())
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        Self::read_bars(&self.bars_path(symbol), symbol, start_date, end_date)
    }

    fn fetch_index_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, DaypickError> {
        Self::read_bars(&self.index_path(symbol), symbol, start_date, end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::create_dir_all(path.join("bars")).unwrap();
        fs::create_dir_all(path.join("index")).unwrap();

        fs::write(
            path.join("stocks.csv"),
            "symbol,name,is_st,is_paused\n\
             000001,Ping An Bank,false,false\n\
             600001,ST Sample,true,false\n",
        )
        .unwrap();

        // Out of order with a duplicate date; turnover column partly empty.
        fs::write(
            path.join("bars").join("000001.csv"),
            "date,open,high,low,close,volume,turnover_rate\n\
             2024-01-16,10.5,11.5,10.0,11.0,60000,1.5\n\
             2024-01-15,10.0,11.0,9.0,10.5,50000,\n\
             2024-01-17,11.0,12.0,10.5,11.5,55000,1.2\n\
             2024-01-16,99.0,99.0,99.0,99.0,1,\n",
        )
        .unwrap();

        fs::write(
            path.join("index").join("000300.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,3500,3520,3480,3510,1000000\n\
             2024-01-16,3510,3530,3500,3525,1100000\n\
             2024-01-17,3525,3540,3515,3530,1050000\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_daily_bars_sorted_and_deduped() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path, "000300");

        let bars = adapter.fetch_daily_bars("000001", d(15), d(17)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, d(15));
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].turnover_rate, None);
        assert_eq!(bars[1].close, 11.0);
        assert_eq!(bars[1].turnover_rate, Some(1.5));
        assert_eq!(bars[2].volume, 55000.0);
    }

    #[test]
    fn fetch_daily_bars_filters_range() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path, "000300");
        let bars = adapter.fetch_daily_bars("000001", d(16), d(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d(16));
    }

    #[test]
    fn missing_symbol_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path, "000300");
        let err = adapter.fetch_daily_bars("600519", d(15), d(17)).unwrap_err();
        assert!(matches!(err, DaypickError::NoData { symbol } if symbol == "600519"));
    }

    #[test]
    fn malformed_row_is_data_source_error() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("bars").join("600000.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path, "000300");
        let err = adapter.fetch_daily_bars("600000", d(15), d(17)).unwrap_err();
        assert!(matches!(err, DaypickError::DataSource { .. }));
    }

    #[test]
    fn list_stocks_keeps_leading_zeros() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path, "000300");
        let stocks = adapter.list_stocks().unwrap();
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].symbol, "000001");
        assert!(!stocks[0].is_st);
        assert!(stocks[1].is_st);
    }

    #[test]
    fn trade_dates_from_calendar_index() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path, "000300");
        assert_eq!(adapter.trade_dates(d(16), d(31)).unwrap(), vec![d(16), d(17)]);
        let index = adapter.fetch_index_bars("000300", d(1), d(31)).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn missing_listing_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf(), "000300");
        assert!(matches!(
            adapter.list_stocks(),
            Err(DaypickError::DataSource { .. })
        ));
    }
}
