use anyhow::{Context, bail};
use backtester::{Pipeline, PipelineReport};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{BacktestParams, Config, DataRequest, Interval, StrategyParams};
use core_types::{PriceSeries, align};
use data_handler::{load_pair, load_price_table};
use optimizer::{Optimizer, SweepReport};
use rust_decimal::Decimal;
use serde::Serialize;
use statistics::{CointegrationTester, adf_test};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// The main entry point for the pairs research tool.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => configuration::parse_config("").context("Failed to build default configuration")?,
    };

    // The guard flushes the file logger on drop, so it lives until `main` returns.
    let _log_guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Sweep(args) => handle_sweep(args, &config),
        Commands::CheckData(args) => handle_check_data(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Statistical-arbitrage research for cointegrated price pairs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on one pair and report its performance.
    Backtest(BacktestArgs),
    /// Backtest every combination of the configured parameter grid.
    Sweep(SweepArgs),
    /// Summarise a price file and, optionally, test one pair for cointegration.
    CheckData(CheckDataArgs),
}

/// Where the prices come from and which window of them to use.
#[derive(Args)]
struct DataArgs {
    /// CSV file with a timestamp column followed by one column per symbol.
    #[arg(long)]
    data: PathBuf,

    /// First date to include (format: YYYY-MM-DD). Overrides the `[data]` section.
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Exclusive last date (format: YYYY-MM-DD).
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Sampling interval of the file (default 1d). Only meaningful with `--from`/`--to`.
    #[arg(long, value_enum, requires = "from")]
    interval: Option<Interval>,
}

#[derive(Args)]
struct PairArgs {
    /// Column holding the prices of leg A.
    #[arg(long)]
    a: String,

    /// Column holding the prices of leg B.
    #[arg(long)]
    b: String,
}

#[derive(Args)]
struct BacktestArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    pair: PairArgs,

    /// Rolling z-score window.
    #[arg(long)]
    lookback: Option<usize>,

    /// Absolute z-score at which a position is opened.
    #[arg(long, allow_negative_numbers = true)]
    entry: Option<f64>,

    /// Absolute z-score inside which a position is closed.
    #[arg(long, allow_negative_numbers = true)]
    exit: Option<f64>,

    /// Starting capital.
    #[arg(long)]
    capital: Option<Decimal>,

    /// Cost per unit of signal change, as a fraction.
    #[arg(long)]
    cost: Option<Decimal>,

    /// Write the full report (series included) as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SweepArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    pair: PairArgs,

    /// Number of ranked runs to print.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Write every ranked run as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CheckDataArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Column of leg A for a cointegration check.
    #[arg(long, requires = "b")]
    a: Option<String>,

    /// Column of leg B for a cointegration check.
    #[arg(long, requires = "a")]
    b: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let strategy = strategy_params(&args, &config.strategy)?;
    let backtest = backtest_params(&args, &config.backtest)?;
    let (a, b) = load_legs(&args.data, &args.pair, config)?;

    let pipeline = Pipeline::new(strategy, backtest);
    let report = pipeline.run(&a, &b).context("Backtest failed")?;

    print_backtest(&args.pair, &report);

    if let Some(path) = &args.output {
        write_json(path, &report)?;
        info!(path = %path.display(), "Report written");
    }
    Ok(())
}

fn handle_sweep(args: SweepArgs, config: &Config) -> anyhow::Result<()> {
    let Some(sweep) = config.sweep.clone() else {
        bail!("The sweep command needs a [sweep] section in the configuration file");
    };
    let (a, b) = load_legs(&args.data, &args.pair, config)?;

    let optimizer = Optimizer::new(sweep, config.strategy.clone(), config.backtest.clone()).with_progress(true);
    let report = optimizer.run(&a, &b).context("Parameter sweep failed")?;

    print_sweep(&report, args.top);

    if let Some(path) = &args.output {
        write_json(path, &report)?;
        info!(path = %path.display(), "Sweep results written");
    }
    Ok(())
}

fn handle_check_data(args: CheckDataArgs, config: &Config) -> anyhow::Result<()> {
    let request = data_request(&args.data, config)?;
    let table = load_price_table(&args.data.data, request.as_ref())
        .with_context(|| format!("Failed to read {}", args.data.data.display()))?;

    let mut summary = new_table(vec!["Column", "Points", "Missing", "First", "Last", "ADF p-value"]);
    for column in table.columns() {
        let first = column.series.first().map(|(ts, _)| ts.date_naive().to_string());
        let last = column.series.last().map(|(ts, _)| ts.date_naive().to_string());
        let adf = adf_test(&column.series.to_values())
            .map(|r| format!("{:.4}", r.p_value))
            .unwrap_or_else(|e| format!("n/a ({e})"));
        summary.add_row(vec![
            column.name.clone(),
            column.series.len().to_string(),
            column.missing.to_string(),
            first.unwrap_or_else(|| "-".to_string()),
            last.unwrap_or_else(|| "-".to_string()),
            adf,
        ]);
    }
    println!("{} rows kept\n{summary}", table.rows());

    if let (Some(name_a), Some(name_b)) = (&args.a, &args.b) {
        let pair = align(table.series(name_a)?, table.series(name_b)?);
        let result = CointegrationTester::from_params(&config.strategy)
            .test_aligned(&pair)
            .with_context(|| format!("Cointegration test of {name_a}/{name_b} failed"))?;

        let mut verdict = new_table(vec!["Pair", "Aligned", "Statistic", "p-value", "Hedge ratio", "Cointegrated"]);
        verdict.add_row(vec![
            format!("{name_a}/{name_b}"),
            pair.len().to_string(),
            format!("{:.4}", result.statistic),
            format!("{:.4}", result.p_value),
            format!("{:.4}", result.hedge_ratio),
            result.is_cointegrated.to_string(),
        ]);
        println!("{verdict}");
    }
    Ok(())
}

// ==============================================================================
// Helpers
// ==============================================================================

fn strategy_params(args: &BacktestArgs, base: &StrategyParams) -> anyhow::Result<StrategyParams> {
    let params = StrategyParams::new(
        args.lookback.unwrap_or(base.lookback_period()),
        args.entry.unwrap_or(base.entry_threshold()),
        args.exit.unwrap_or(base.exit_threshold()),
    )
    .and_then(|p| p.with_significance_level(base.significance_level()))
    .and_then(|p| p.with_min_observations(base.min_observations()))
    .context("Invalid strategy parameters")?;
    Ok(params)
}

fn backtest_params(args: &BacktestArgs, base: &BacktestParams) -> anyhow::Result<BacktestParams> {
    let params = BacktestParams::new(
        args.capital.unwrap_or(base.initial_capital()),
        args.cost.unwrap_or(base.transaction_cost()),
        base.max_position_size(),
    )
    .context("Invalid backtest parameters")?;
    Ok(params)
}

/// Command-line dates win over the `[data]` section of the configuration.
fn data_request(args: &DataArgs, config: &Config) -> anyhow::Result<Option<DataRequest>> {
    match (args.from, args.to) {
        (Some(from), Some(to)) => {
            let interval = args.interval.unwrap_or(Interval::OneDay);
            let request = DataRequest::new(from, to, interval).context("Invalid date range")?;
            Ok(Some(request))
        }
        _ => Ok(config.data.clone()),
    }
}

fn load_legs(data: &DataArgs, pair: &PairArgs, config: &Config) -> anyhow::Result<(PriceSeries, PriceSeries)> {
    let request = data_request(data, config)?;
    let legs = load_pair(&data.data, &pair.a, &pair.b, request.as_ref())
        .with_context(|| format!("Failed to load {}/{} from {}", pair.a, pair.b, data.data.display()))?;
    Ok(legs)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_backtest(pair: &PairArgs, report: &PipelineReport) {
    let coint = &report.cointegration;
    let metrics = &report.metrics;
    let signals = &report.signal_summary;

    let mut table = new_table(vec!["Metric", "Value"]);
    let rows = [
        ("Pair", format!("{}/{}", pair.a, pair.b)),
        ("Aligned observations", report.prices.len().to_string()),
        ("Cointegrated", format!("{} (p = {:.4})", coint.is_cointegrated, coint.p_value)),
        ("Hedge ratio", format!("{:.4}", report.hedge_ratio)),
        ("Long / short / flat periods", format!(
            "{} / {} / {}",
            signals.long_periods, signals.short_periods, signals.flat_periods
        )),
        ("Trades", report.backtest.trade_count().to_string()),
        ("Final equity", format!("{:.2}", report.backtest.final_equity())),
        ("Total return", format!("{:.2}%", metrics.total_return * 100.0)),
        ("Annual return", format!("{:.2}%", metrics.annual_return * 100.0)),
        ("Annual volatility", format!("{:.2}%", metrics.annual_volatility * 100.0)),
        ("Sharpe ratio", format!("{:.3}", metrics.sharpe_ratio)),
        ("Max drawdown", format!("{:.2}%", metrics.max_drawdown * 100.0)),
        ("Calmar ratio", format!("{:.3}", metrics.calmar_ratio)),
        ("Win rate", format!("{:.2}%", metrics.win_rate * 100.0)),
        ("Profit factor", format!("{:.3}", metrics.profit_factor)),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    println!("{table}");
}

fn print_sweep(report: &SweepReport, top: usize) {
    println!(
        "Hedge ratio {:.4}: {} runs evaluated, {} failed, {} filtered out",
        report.hedge_ratio, report.evaluated, report.failed, report.rejected
    );
    if report.ranked.is_empty() {
        println!("No run passed the filters.");
        return;
    }

    let mut table = new_table(vec![
        "Rank", "Lookback", "Entry", "Exit", "Trades", "Sharpe", "Calmar", "Total return", "Max drawdown",
    ]);
    for (rank, run) in report.ranked.iter().take(top).enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            run.lookback_period.to_string(),
            format!("{:.2}", run.entry_threshold),
            format!("{:.2}", run.exit_threshold),
            run.trades.to_string(),
            format!("{:.3}", run.metrics.sharpe_ratio),
            format!("{:.3}", run.metrics.calmar_ratio),
            format!("{:.2}%", run.metrics.total_return * 100.0),
            format!("{:.2}%", run.metrics.max_drawdown * 100.0),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_without_dates_is_rejected() {
        let result = Cli::try_parse_from([
            "pairwise", "check-data", "--data", "prices.csv", "--interval", "1h",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn interval_applies_to_command_line_dates() {
        let cli = Cli::try_parse_from([
            "pairwise", "check-data", "--data", "prices.csv", "--from", "2024-01-02", "--to", "2024-01-20",
            "--interval", "1h",
        ])
        .unwrap();
        let Commands::CheckData(args) = cli.command else {
            panic!("expected check-data");
        };

        let config = configuration::parse_config("").unwrap();
        let request = data_request(&args.data, &config).unwrap().unwrap();
        assert_eq!(request.interval(), Interval::OneHour);
    }

    #[test]
    fn dates_default_to_daily_interval() {
        let cli = Cli::try_parse_from([
            "pairwise", "check-data", "--data", "prices.csv", "--from", "2024-01-02", "--to", "2024-03-01",
        ])
        .unwrap();
        let Commands::CheckData(args) = cli.command else {
            panic!("expected check-data");
        };

        let config = configuration::parse_config("").unwrap();
        let request = data_request(&args.data, &config).unwrap().unwrap();
        assert_eq!(request.interval(), Interval::OneDay);
    }
}
