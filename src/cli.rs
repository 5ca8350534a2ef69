//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvSource;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_adapter::SyntheticSource;
use crate::domain::backtest::{BacktestConfig, BatchResult, run_batch};
use crate::domain::config_validation::{parse_date, parse_symbols, validate_config};
use crate::domain::error::TradingError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::IndicatorParams;
use crate::domain::metrics::{PortfolioSummary, SymbolMetrics};
use crate::domain::signal::SignalRules;
use crate::ports::config_port::ConfigPort;
use crate::ports::indicator_port::IndicatorSource;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_SYMBOLS: [&str; 3] = ["RELIANCE.NS", "TCS.NS", "INFY.NS"];
pub const DEFAULT_SYNTHETIC_START: &str = "2024-01-01";

#[derive(Parser, Debug)]
#[command(name = "algotrader", about = "RSI/moving-average equity backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over every configured symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Use generated price series instead of CSV files
        #[arg(long)]
        synthetic: bool,
        /// Report directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Cli {
    pub fn config_path(&self) -> &Path {
        match &self.command {
            Command::Backtest { config, .. } | Command::Validate { config } => config.as_path(),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the config file's
/// `[logging] level`, which wins over `info`.
pub fn init_tracing(config_path: &Path) {
    let configured = FileConfigAdapter::from_file(config_path)
        .ok()
        .and_then(|c| c.get_string("logging", "level"))
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbols,
            synthetic,
            output,
        } => run_backtest(&config, symbols.as_deref(), synthetic, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: TradingError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradingError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradingError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TradingError> {
    validate_config(adapter)?;
    let defaults = BacktestConfig::default();
    let rules = SignalRules::default();

    Ok(BacktestConfig {
        initial_capital: adapter.get_decimal(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        ),
        execution: ExecutionConfig {
            cost_rate: adapter.get_decimal("backtest", "cost_rate", defaults.execution.cost_rate),
            max_allocation: adapter.get_decimal(
                "backtest",
                "max_allocation",
                defaults.execution.max_allocation,
            ),
        },
        rules: SignalRules {
            rsi_oversold: adapter.get_double("strategy", "rsi_oversold", rules.rsi_oversold),
            rsi_exit: adapter.get_double("strategy", "rsi_exit", rules.rsi_exit),
            max_hold_days: adapter.get_int("strategy", "max_hold_days", rules.max_hold_days),
        },
    })
}

pub fn build_indicator_params(adapter: &dyn ConfigPort) -> IndicatorParams {
    let defaults = IndicatorParams::default();
    let period = |key: &str, default: usize| {
        usize::try_from(adapter.get_int("indicators", key, default as i64)).unwrap_or(default)
    };
    IndicatorParams {
        rsi_period: period("rsi_period", defaults.rsi_period),
        ma_fast: period("ma_fast", defaults.ma_fast),
        ma_slow: period("ma_slow", defaults.ma_slow),
    }
}

/// `--symbols` wins over `[backtest] symbols`, which wins over the defaults.
pub fn resolve_symbols(
    override_list: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<Vec<String>, TradingError> {
    match override_list.map(str::to_string).or_else(|| adapter.get_string("backtest", "symbols")) {
        Some(list) => parse_symbols(&list),
        None => Ok(DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()),
    }
}

/// `[ml]` accuracies keyed by upper-case symbol. Unparsable entries are
/// rejected earlier by validation.
pub fn ml_accuracies(adapter: &dyn ConfigPort) -> HashMap<String, f64> {
    adapter
        .get_section("ml")
        .into_iter()
        .filter_map(|(symbol, value)| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .map(|accuracy| (symbol.to_uppercase(), accuracy))
        })
        .collect()
}

pub fn build_source(
    adapter: &dyn ConfigPort,
    force_synthetic: bool,
) -> Result<Box<dyn IndicatorSource>, TradingError> {
    let params = build_indicator_params(adapter);
    let source = adapter
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    if force_synthetic || source == "synthetic" {
        let days = usize::try_from(adapter.get_int("data", "synthetic_days", 126)).unwrap_or(126);
        let start = parse_date(
            &adapter
                .get_string("data", "synthetic_start")
                .unwrap_or_else(|| DEFAULT_SYNTHETIC_START.to_string()),
            "data",
            "synthetic_start",
        )?;
        return Ok(Box::new(SyntheticSource::new(days, start, params)));
    }

    let dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    Ok(Box::new(CsvSource::new(PathBuf::from(dir), params)))
}

/// Run the batch, reduce it and hand both to the report sink.
pub fn run_backtest_pipeline(
    source: &dyn IndicatorSource,
    report: &dyn ReportPort,
    config: &BacktestConfig,
    symbols: &[String],
    ml_accuracy: &HashMap<String, f64>,
) -> Result<(BatchResult, PortfolioSummary), TradingError> {
    let batch = run_batch(source, symbols, config)?;
    let summary = PortfolioSummary::compute(
        &batch.results,
        &batch.failures,
        ml_accuracy,
        Local::now().naive_local(),
    );
    report.write(&batch.results, &summary)?;
    Ok((batch, summary))
}

fn run_backtest(
    config_path: &Path,
    symbols_override: Option<&str>,
    synthetic: bool,
    output_override: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(symbols_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let source = match build_source(&adapter, synthetic) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let output_dir = output_override.cloned().unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "report".to_string()),
        )
    });
    let report = CsvReportAdapter::new(output_dir);

    eprintln!(
        "Running backtest: {} symbols from {} source",
        symbols.len(),
        source.name()
    );

    let (batch, summary) = match run_backtest_pipeline(
        source.as_ref(),
        &report,
        &bt_config,
        &symbols,
        &ml_accuracies(&adapter),
    ) {
        Ok(outcome) => outcome,
        Err(e) => return fail(e),
    };

    print_summary(&batch, &summary);
    eprintln!("\nReport written to: {}", report.output_dir().display());

    if batch.results.is_empty() && !batch.failures.is_empty() {
        eprintln!("error: no symbol produced a result");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn print_summary(batch: &BatchResult, summary: &PortfolioSummary) {
    eprintln!("\n=== Portfolio Summary ===");
    eprintln!("Symbols Analyzed: {}", summary.symbols_analyzed);
    eprintln!("Avg Return:       {:.2}%", summary.avg_return);
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    match summary.avg_ml_accuracy {
        Some(acc) => eprintln!("Avg ML Accuracy:  {:.1}%", acc),
        None => eprintln!("Avg ML Accuracy:  n/a"),
    }
    if let Some(best) = &summary.best_symbol {
        eprintln!("Best Performer:   {}", best);
    }
    if let Some(worst) = &summary.worst_symbol {
        eprintln!("Worst Performer:  {}", worst);
    }

    if !batch.results.is_empty() {
        eprintln!("\n=== Per-Symbol Summary ===");
        for result in &batch.results {
            let m = SymbolMetrics::compute(result);
            let open = if m.unrealized { " (open position)" } else { "" };
            eprintln!(
                "  {}:  {:.2}% return, {} trades, {:.1}% win rate, -{:.1}% max drawdown{}",
                m.symbol,
                m.return_pct,
                m.num_trades,
                m.win_rate * 100.0,
                m.max_drawdown * 100.0,
                open,
            );
        }
    }

    for failed in &summary.failed_symbols {
        eprintln!("warning: skipped {} ({})", failed.symbol, failed.reason);
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(None, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let source = match build_source(&adapter, false) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let params = build_indicator_params(&adapter);

    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {}", bt_config.initial_capital);
    eprintln!("  cost_rate:       {}", bt_config.execution.cost_rate);
    eprintln!("  max_allocation:  {}", bt_config.execution.max_allocation);
    eprintln!("  symbols:         {}", symbols.join(", "));
    eprintln!("\nStrategy:");
    eprintln!("  buy when rsi < {} and ma_fast > ma_slow", bt_config.rules.rsi_oversold);
    eprintln!(
        "  sell when rsi > {}, ma_fast < ma_slow or held >= {} days",
        bt_config.rules.rsi_exit, bt_config.rules.max_hold_days
    );
    eprintln!("\nIndicators:");
    eprintln!(
        "  rsi({}), sma({}), sma({}); warm-up {} rows",
        params.rsi_period,
        params.ma_fast,
        params.ma_slow,
        params.warmup()
    );
    eprintln!("\nData source: {}", source.name());

    info!(config = %config_path.display(), "configuration is valid");
    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
