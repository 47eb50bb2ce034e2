//! Markdown report adapter: appends rows to a pipe table.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::adapters::report_rows::{BacktestRow, RecommendationRow};
use crate::domain::backtest::BacktestReport;
use crate::domain::error::DaypickError;
use crate::domain::recommender::Recommendation;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct MarkdownReportAdapter;

impl MarkdownReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn append_row(
        title: &str,
        headers: &[&str],
        cells: &[String],
        path: &Path,
    ) -> Result<(), DaypickError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let mut out = String::new();
        if is_new {
            out.push_str(&format!("# {title}\n\n"));
            out.push_str(&table_line(headers.iter().map(|h| h.to_string())));
            out.push_str(&table_line(headers.iter().map(|_| "---".to_string())));
        }
        out.push_str(&table_line(cells.iter().map(|c| escape_cell(c))));

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

fn table_line(cells: impl Iterator<Item = String>) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(&cell);
        line.push_str(" |");
    }
    line.push('\n');
    line
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

impl ReportPort for MarkdownReportAdapter {
    fn append_recommendation(
        &self,
        recommendation: &Recommendation,
        path: &Path,
    ) -> Result<(), DaypickError> {
        let row = RecommendationRow::from_recommendation(recommendation);
        Self::append_row(
            "Daily recommendations",
            &RecommendationRow::HEADERS,
            &row.cells(),
            path,
        )
    }

    fn append_backtest(&self, report: &BacktestReport, path: &Path) -> Result<(), DaypickError> {
        let row = BacktestRow::from_report(report);
        Self::append_row("Backtest runs", &BacktestRow::HEADERS, &row.cells(), path)
    }
}
