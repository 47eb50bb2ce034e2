//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for daypick.
#[derive(Debug, thiserror::Error)]
pub enum DaypickError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(
        "market regime undetermined on {date}: benchmark {index} has {bars} bars, need {minimum}"
    )]
    RegimeUndetermined {
        index: String,
        date: NaiveDate,
        bars: usize,
        minimum: usize,
    },

    #[error("no trading day before {target} to use as signal date")]
    NoSignalDate { target: NaiveDate },

    #[error("stale data: {reason}")]
    StaleData { reason: String },

    #[error("no candidate for {date} after modes [{modes}]")]
    NoCandidate { date: NaiveDate, modes: String },

    #[error("insufficient trading days: found {found}, need at least {minimum}")]
    InsufficientTradingDays { found: usize, minimum: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("formatting output failed")]
    Fmt(#[from] std::fmt::Error),
}

impl DaypickError {
    /// Stable snake_case tag used to bucket errors in backtest summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            DaypickError::DataSource { .. } => "data_source",
            DaypickError::NoData { .. } => "no_data",
            DaypickError::InsufficientHistory { .. } => "insufficient_history",
            DaypickError::RegimeUndetermined { .. } => "regime_undetermined",
            DaypickError::NoSignalDate { .. } => "no_signal_date",
            DaypickError::StaleData { .. } => "stale_data",
            DaypickError::NoCandidate { .. } => "no_candidate",
            DaypickError::InsufficientTradingDays { .. } => "insufficient_trading_days",
            DaypickError::ConfigParse { .. } => "config_parse",
            DaypickError::ConfigMissing { .. } => "config_missing",
            DaypickError::ConfigInvalid { .. } => "config_invalid",
            DaypickError::Csv(_) => "csv",
            DaypickError::Json(_) => "json",
            DaypickError::Io(_) => "io",
            DaypickError::Fmt(_) => "fmt",
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        DaypickError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&DaypickError> for std::process::ExitCode {
    fn from(err: &DaypickError) -> Self {
        let code: u8 = match err {
            DaypickError::Io(_)
            | DaypickError::Csv(_)
            | DaypickError::Json(_)
            | DaypickError::Fmt(_) => 1,
            DaypickError::ConfigParse { .. }
            | DaypickError::ConfigMissing { .. }
            | DaypickError::ConfigInvalid { .. } => 2,
            DaypickError::DataSource { .. } | DaypickError::StaleData { .. } => 3,
            DaypickError::NoCandidate { .. } | DaypickError::InsufficientTradingDays { .. } => 4,
            DaypickError::NoData { .. }
            | DaypickError::InsufficientHistory { .. }
            | DaypickError::RegimeUndetermined { .. }
            | DaypickError::NoSignalDate { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
