//! CLI definition and dispatch.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report_adapter::MarkdownReportAdapter;
use crate::domain::backtest::{BacktestReport, BacktestRunner};
use crate::domain::config::EngineConfig;
use crate::domain::error::DaypickError;
use crate::domain::mode_chain::{ModeTier, TierStats};
use crate::domain::recommender::{Explanation, Recommendation, Recommender};
use crate::domain::scoring::ScoreCard;
use crate::logging;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "daypick", about = "One A-share pick per trading day", version)]
pub struct Cli {
    /// Debug-level logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend one stock for a target date
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
        /// Target trading date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Show every filter check and sub-score for one symbol under one mode
    Explain {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "normal")]
        mode: ModeTier,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Replay daily recommendations over a date range
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init(cli.verbose);

    let result = match cli.command {
        Command::Recommend {
            config,
            date,
            output,
        } => run_recommend(&config, date, output),
        Command::Explain {
            config,
            symbol,
            date,
            mode,
            output,
        } => run_explain(&config, &symbol, date, mode, output),
        Command::Backtest {
            config,
            start,
            end,
            output,
        } => run_backtest(&config, start, end, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Parse, resolve and validate the INI file at `path`.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, DaypickError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = EngineConfig::load(&adapter)?;
    config.validate()?;
    Ok(config)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run_recommend(
    config_path: &Path,
    date: Option<NaiveDate>,
    output: OutputFormat,
) -> Result<(), DaypickError> {
    let config = load_engine_config(config_path)?;
    let data = CsvAdapter::new(config.data.dir.clone(), &config.market.index_symbol);
    let mut recommender = Recommender::new(&data, &config);

    let rec = recommender.recommend(date.unwrap_or_else(today))?;
    emit(output, &rec, render_recommendation)?;

    if config.reporting.enabled {
        CsvReportAdapter::new().append_recommendation(&rec, &config.reporting.recommendation_csv)?;
        MarkdownReportAdapter::new()
            .append_recommendation(&rec, &config.reporting.recommendation_md)?;
    }
    Ok(())
}

fn run_explain(
    config_path: &Path,
    symbol: &str,
    date: Option<NaiveDate>,
    mode: ModeTier,
    output: OutputFormat,
) -> Result<(), DaypickError> {
    let config = load_engine_config(config_path)?;
    let data = CsvAdapter::new(config.data.dir.clone(), &config.market.index_symbol);
    let mut recommender = Recommender::new(&data, &config);

    let explanation = recommender.explain(symbol, date.unwrap_or_else(today), mode)?;
    emit(output, &explanation, render_explanation)
}

fn run_backtest(
    config_path: &Path,
    start: NaiveDate,
    end: NaiveDate,
    output: OutputFormat,
) -> Result<(), DaypickError> {
    if start > end {
        return Err(DaypickError::invalid(
            "backtest",
            "start",
            format!("start {start} is after end {end}"),
        ));
    }
    let config = load_engine_config(config_path)?;
    let data = CsvAdapter::new(config.data.dir.clone(), &config.market.index_symbol);
    let mut runner = BacktestRunner::new(Recommender::new(&data, &config));

    let report = runner.run(start, end)?;
    emit(output, &report, render_backtest)?;

    if config.reporting.enabled {
        CsvReportAdapter::new().append_backtest(&report, &config.reporting.backtest_csv)?;
        MarkdownReportAdapter::new().append_backtest(&report, &config.reporting.backtest_md)?;
    }
    Ok(())
}

fn emit<T: Serialize>(
    output: OutputFormat,
    value: &T,
    render: fn(&T) -> Result<String, fmt::Error>,
) -> Result<(), DaypickError> {
    match output {
        OutputFormat::Table => print!("{}", render(value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn score_line(score: &ScoreCard) -> String {
    let b = &score.breakdown;
    format!(
        "{:.2} (trend {:.1}, momentum {:.1}, stability {:.1}, volume {:.1})",
        score.total, b.trend, b.momentum, b.stability, b.volume
    )
}

fn tier_line(stats: &TierStats) -> String {
    format!(
        "{}: scanned {}, passed {}, rejected {}",
        stats.tier,
        stats.scanned,
        stats.passed,
        stats.rejection_summary()
    )
}

pub fn render_recommendation(rec: &Recommendation) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Recommendation for {} (signal date {})",
        rec.target_date, rec.signal_date
    )?;
    writeln!(out, "  Symbol:        {} {}", rec.symbol, rec.name)?;
    writeln!(out, "  Mode:          {}", rec.tier)?;
    writeln!(
        out,
        "  Market:        {} ({} drawdown {:.2}%)",
        rec.regime.state,
        rec.regime.index_symbol,
        rec.regime.drawdown * 100.0
    )?;
    writeln!(out, "  Score:         {}", score_line(&rec.score))?;
    writeln!(out, "  Close:         {:.2}", rec.indicators.close)?;
    writeln!(
        out,
        "  Turnover:      {}",
        turnover_label(rec.indicators.turnover_rate)
    )?;
    writeln!(out, "  Stop loss:     {:.2}", rec.targets.stop_loss_price)?;
    writeln!(out, "  Take profit:   {:.2}", rec.targets.take_profit_price)?;
    writeln!(
        out,
        "  Holding days:  {}",
        rec.targets.suggested_holding_days
    )?;
    out.push_str("Reasons:\n");
    for reason in &rec.reasons {
        writeln!(out, "  - {reason}")?;
    }
    out.push_str("Modes:\n");
    for stats in &rec.tier_stats {
        writeln!(out, "  {}", tier_line(stats))?;
    }
    writeln!(
        out,
        "Universe: {} listed, {} evaluated, {} skipped on data errors",
        rec.scan.listed, rec.scan.evaluated, rec.scan.fetch_failed
    )?;
    Ok(out)
}

pub fn render_explanation(ex: &Explanation) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{} {} under {} for {} (signal date {})",
        ex.symbol, ex.name, ex.tier, ex.target_date, ex.signal_date
    )?;
    writeln!(
        out,
        "  Market:   {} ({})",
        ex.regime.state, ex.regime.index_symbol
    )?;
    writeln!(out, "  Bars:     {}", ex.bar_count)?;
    writeln!(
        out,
        "  Verdict:  {}",
        if ex.passed { "PASS" } else { "FAIL" }
    )?;
    out.push_str("Checks:\n");
    for check in &ex.filter.checks {
        writeln!(
            out,
            "  [{}] {:<24} {}",
            if check.passed { "ok" } else { "xx" },
            check.check.code(),
            check.detail
        )?;
    }
    if let Some(ind) = &ex.indicators {
        out.push_str("Indicators:\n");
        writeln!(
            out,
            "  close {:.2}  ma20 {:.2}  ma60 {}  rsi14 {:.1}  atr14 {:.3}",
            ind.close,
            ind.ma20,
            ind.ma60.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}")),
            ind.rsi14,
            ind.atr14
        )?;
        writeln!(
            out,
            "  mom5 {:.2}%  mom20 {:.2}%  vol20 {:.2}%  vol_ratio {:.2}  volume_z {:.2}  turnover {}",
            ind.mom5 * 100.0,
            ind.mom20 * 100.0,
            ind.vol20_std * 100.0,
            ind.vol_ratio_5_20,
            ind.volume_zscore20,
            turnover_label(ind.turnover_rate)
        )?;
    }
    if let Some(score) = &ex.score {
        writeln!(out, "Score: {}", score_line(score))?;
    }
    if let Some(t) = &ex.targets {
        writeln!(
            out,
            "Targets: stop {:.2}, take {:.2}, hold {} days",
            t.stop_loss_price, t.take_profit_price, t.suggested_holding_days
        )?;
    }
    Ok(out)
}

pub fn render_backtest(report: &BacktestReport) -> Result<String, fmt::Error> {
    let s = &report.stats;
    let mut out = String::new();
    writeln!(out, "Backtest {} to {}", report.start, report.end)?;
    writeln!(
        out,
        "  Days:          {} attempted, {} decided, {} skipped",
        report.attempted_days, report.decided_days, report.skipped_days
    )?;
    writeln!(out, "  Trades:        {}", s.trades)?;
    writeln!(
        out,
        "  Win rate:      {:.2}% gross, {:.2}% net",
        s.win_rate_gross * 100.0,
        s.win_rate_net * 100.0
    )?;
    writeln!(
        out,
        "  Avg return:    {:.3}% gross, {:.3}% net",
        s.avg_return_gross * 100.0,
        s.avg_return_net * 100.0
    )?;
    writeln!(
        out,
        "  Total return:  {:.2}% net",
        s.total_return_net * 100.0
    )?;
    writeln!(
        out,
        "  Max drawdown:  {:.2}% over {} trades",
        s.max_drawdown * 100.0,
        s.max_drawdown_trades
    )?;
    writeln!(out, "  Fees:          {:.2}", s.total_fees)?;

    for (label, line) in [
        ("Modes", counts_line(report.mode_counts.iter())),
        ("Exits", counts_line(report.exit_counts.iter())),
        ("Errors", counts_line(report.error_counts.iter())),
    ] {
        writeln!(out, "  {:<14} {}", format!("{label}:"), line)?;
    }

    if !report.trades.is_empty() {
        out.push_str("Trades:\n");
        writeln!(
            out,
            "  {:<10} {:<8} {:<8} {:>9} {:<10} {:>9} {:<16} {:>8} {:>8}",
            "entry", "symbol", "mode", "price", "exit", "price", "reason", "gross", "net"
        )?;
        for t in &report.trades {
            writeln!(
                out,
                "  {:<10} {:<8} {:<8} {:>9.2} {:<10} {:>9.2} {:<16} {:>7.2}% {:>7.2}%",
                t.entry_date,
                t.symbol,
                t.tier.as_str(),
                t.entry_price,
                t.exit_date,
                t.exit_price,
                t.exit_reason.as_str(),
                t.gross_return * 100.0,
                t.net_return * 100.0
            )?;
        }
    }
    if !report.error_examples.is_empty() {
        out.push_str("Error examples:\n");
        for ex in &report.error_examples {
            writeln!(out, "  {} [{}] {}", ex.date, ex.kind, ex.message)?;
        }
    }
    Ok(out)
}

fn turnover_label(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}%"))
}

fn counts_line<'a, K: fmt::Display + 'a>(
    counts: impl Iterator<Item = (&'a K, &'a usize)>,
) -> String {
    let parts: Vec<String> = counts.map(|(k, v)| format!("{k}={v}")).collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}
