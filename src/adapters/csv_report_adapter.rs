//! CSV report adapter: one appended row per recommendation or backtest run.

use std::fs::{self, OpenOptions};
use std::path::Path;

use serde::Serialize;

use crate::adapters::report_rows::{BacktestRow, RecommendationRow};
use crate::domain::backtest::BacktestReport;
use crate::domain::error::DaypickError;
use crate::domain::recommender::Recommendation;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn append_row<T: Serialize>(row: &T, path: &Path) -> Result<(), DaypickError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn append_recommendation(
        &self,
        recommendation: &Recommendation,
        path: &Path,
    ) -> Result<(), DaypickError> {
        Self::append_row(&RecommendationRow::from_recommendation(recommendation), path)
    }

    fn append_backtest(&self, report: &BacktestReport, path: &Path) -> Result<(), DaypickError> {
        Self::append_row(&BacktestRow::from_report(report), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Row {
        symbol: &'static str,
        score: f64,
    }

    #[test]
    fn header_written_once_and_rows_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        CsvReportAdapter::append_row(&Row { symbol: "600000", score: 71.5 }, &path).unwrap();
        CsvReportAdapter::append_row(&Row { symbol: "000001", score: 64.0 }, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["symbol,score", "600000,71.5", "000001,64.0"]);
    }

    #[test]
    fn empty_existing_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "").unwrap();

        CsvReportAdapter::append_row(&Row { symbol: "600000", score: 1.0 }, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("symbol,score\n"));
    }
}
