//! Report writing port trait.

use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::DaypickError;
use crate::domain::recommender::Recommendation;

/// Appends one row per recommendation or backtest run to a report file,
/// creating the file (and its header) on first use.
pub trait ReportPort {
    fn append_recommendation(
        &self,
        recommendation: &Recommendation,
        path: &Path,
    ) -> Result<(), DaypickError>;

    fn append_backtest(&self, report: &BacktestReport, path: &Path) -> Result<(), DaypickError>;
}
