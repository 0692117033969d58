//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{recent_signals, run_backtest, DEFAULT_RECENT_SIGNALS};
use crate::domain::backtest::BacktestResult;
use crate::domain::candle::Candle;
use crate::domain::config_validation::{load_app_config, AppConfig};
use crate::domain::error::TraderError;
use crate::domain::labeler::build_dataset;
use crate::domain::metrics::Metrics;
use crate::domain::signal::SignalRow;

#[derive(Parser, Debug)]
#[command(name = "klinetrader", about = "Kline signals, datasets and backtests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the signal rules over a CSV candle file
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        /// Also print every fill
        #[arg(long)]
        trades: bool,
    },
    /// Print the most recent signal rows for a CSV candle file
    Signals {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long, default_value_t = DEFAULT_RECENT_SIGNALS)]
        last: usize,
    },
    /// Write the labeled training dataset as CSV
    Dataset {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
    /// Download recent klines from Binance into a CSV candle file
    #[cfg(feature = "binance")]
    Fetch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Stream live klines from Binance and print the latest signal
    #[cfg(feature = "binance")]
    Watch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        /// Seconds between signal prints
        #[arg(long, default_value_t = 10)]
        every: u64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatch a parsed command.
pub fn execute(cli: Cli) -> Result<(), TraderError> {
    match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            interval,
            trades,
        } => load_with_overrides(config.as_deref(), symbol, interval)
            .and_then(|app| run_backtest_command(&app, &data, trades)),
        Command::Signals {
            config,
            data,
            symbol,
            interval,
            last,
        } => load_with_overrides(config.as_deref(), symbol, interval)
            .and_then(|app| run_signals_command(&app, &data, last)),
        Command::Dataset {
            config,
            data,
            output,
            symbol,
            interval,
        } => load_with_overrides(config.as_deref(), symbol, interval)
            .and_then(|app| run_dataset_command(&app, &data, &output)),
        #[cfg(feature = "binance")]
        Command::Fetch {
            config,
            output,
            symbol,
            interval,
            limit,
        } => load_with_overrides(config.as_deref(), symbol, interval)
            .and_then(|app| live::run_fetch(&app, &output, limit)),
        #[cfg(feature = "binance")]
        Command::Watch {
            config,
            symbol,
            interval,
            every,
        } => load_with_overrides(config.as_deref(), symbol, interval)
            .and_then(|app| live::run_watch(&app, every)),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Load and validate a config file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, TraderError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            load_app_config(&adapter)
        }
        None => load_app_config(&FileConfigAdapter::empty()),
    }
}

fn load_with_overrides(
    path: Option<&Path>,
    symbol: Option<String>,
    interval: Option<String>,
) -> Result<AppConfig, TraderError> {
    let mut app = load_config(path)?;
    if let Some(symbol) = symbol {
        app.stream.symbol = symbol.trim().to_uppercase();
    }
    if let Some(interval) = interval {
        app.stream.interval = interval.trim().to_string();
    }
    Ok(app)
}

pub fn load_candles(app: &AppConfig, data_dir: &Path) -> Result<Vec<Candle>, TraderError> {
    let adapter = CsvAdapter::new(data_dir);
    let candles = adapter.load(&app.stream.symbol, &app.stream.interval)?;
    eprintln!(
        "Loaded {} candles from {}",
        candles.len(),
        adapter
            .csv_path(&app.stream.symbol, &app.stream.interval)
            .display()
    );
    Ok(candles)
}

fn run_backtest_command(app: &AppConfig, data_dir: &Path, show_trades: bool) -> Result<(), TraderError> {
    let candles = load_candles(app, data_dir)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_backtest_pipeline(&candles, app, show_trades, &mut out)?;
    Ok(())
}

/// Pipeline → signals → simulator, with the summary written to `out`.
pub fn run_backtest_pipeline(
    candles: &[Candle],
    app: &AppConfig,
    show_trades: bool,
    out: &mut dyn Write,
) -> Result<BacktestResult, TraderError> {
    let result = run_backtest(candles, &app.indicators, &app.backtest);
    if result.equity_curve.is_empty() {
        eprintln!(
            "warning: not enough history for indicators ({} candles, longest window {})",
            candles.len(),
            app.indicators.max_window()
        );
    }
    let metrics = Metrics::compute(&result, &app.backtest);
    write_summary(out, app, &result, &metrics)?;
    if show_trades {
        write_trades(out, &result)?;
    }
    Ok(result)
}

fn write_summary(
    out: &mut dyn Write,
    app: &AppConfig,
    result: &BacktestResult,
    metrics: &Metrics,
) -> Result<(), TraderError> {
    writeln!(out, "=== Backtest {} {} ===", app.stream.symbol, app.stream.interval)?;
    writeln!(out, "Bars Simulated:   {}", result.equity_curve.len())?;
    writeln!(out, "Initial Balance:  {:.2}", result.initial_balance)?;
    writeln!(out, "Final Value:      {:.2}", result.final_value)?;
    writeln!(out, "Total Return:     {:.2}%", metrics.total_return * 100.0)?;
    writeln!(out, "Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0)?;
    writeln!(out, "Total Trades:     {}", result.trade_count())?;
    writeln!(out, "Round Trips:      {}", metrics.round_trips)?;
    writeln!(out, "Win Rate:         {:.1}%", metrics.win_rate * 100.0)?;
    Ok(())
}

fn write_trades(out: &mut dyn Write, result: &BacktestResult) -> Result<(), TraderError> {
    writeln!(out, "\n=== Trades ===")?;
    for trade in &result.trades {
        writeln!(
            out,
            "{}  {:<4}  {:>14.6}  @ {:.4}",
            format_timestamp(trade.timestamp),
            trade.side.to_string(),
            trade.quantity,
            trade.price
        )?;
    }
    Ok(())
}

fn run_signals_command(app: &AppConfig, data_dir: &Path, last: usize) -> Result<(), TraderError> {
    let candles = load_candles(app, data_dir)?;
    let rows = recent_signals(&candles, &app.indicators, last);
    if rows.is_empty() {
        eprintln!("warning: not enough history to produce signals");
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_signal_rows(&mut out, &rows)
}

pub fn write_signal_rows(out: &mut dyn Write, rows: &[SignalRow]) -> Result<(), TraderError> {
    writeln!(
        out,
        "{:<20}  {:>12}  {:>7}  {:<6}  {:>10}  {:>4}",
        "time", "close", "rsi", "action", "confidence", "risk"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<20}  {:>12.4}  {:>7.2}  {:<6}  {:>10.3}  {:>4.2}",
            format_timestamp(row.features.timestamp()),
            row.features.close(),
            row.features.rsi,
            row.signal.action.to_string(),
            row.signal.confidence,
            row.signal.risk
        )?;
    }
    Ok(())
}

fn run_dataset_command(app: &AppConfig, data_dir: &Path, output: &Path) -> Result<(), TraderError> {
    let candles = load_candles(app, data_dir)?;
    let dataset = build_dataset(&candles, &app.indicators);
    if dataset.is_empty() {
        return Err(TraderError::InsufficientHistory {
            have: candles.len(),
            need: app.indicators.max_window() + 1,
        });
    }
    let file = File::create(output)?;
    dataset.write_csv(BufWriter::new(file))?;
    eprintln!("Wrote {} rows to {}", dataset.len(), output.display());
    Ok(())
}

fn run_validate(config: &Path) -> Result<(), TraderError> {
    let app = load_config(Some(config))?;
    eprintln!(
        "Stream:     {} {} (capacity {}, seed {})",
        app.stream.symbol, app.stream.interval, app.stream.capacity, app.stream.seed_limit
    );
    eprintln!(
        "Indicators: ema {}/{}, sma {}, rsi {}, atr {}, volume {}",
        app.indicators.ema_short(),
        app.indicators.ema_long(),
        app.indicators.sma(),
        app.indicators.rsi(),
        app.indicators.atr(),
        app.indicators.volume_window()
    );
    eprintln!(
        "Backtest:   balance {}, fee {}, slippage {}",
        app.backtest.initial_balance(),
        app.backtest.fee(),
        app.backtest.slippage()
    );
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(feature = "binance")]
mod live {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use tracing::info;

    use crate::adapters::binance_rest::{BinanceRestAdapter, MAX_LIMIT};
    use crate::adapters::binance_ws::BinanceWsAdapter;
    use crate::adapters::csv_adapter::CsvAdapter;
    use crate::domain::analysis::latest_signal;
    use crate::domain::config_validation::AppConfig;
    use crate::domain::error::TraderError;
    use crate::feed::{LiveFeed, StreamSettings};
    use crate::ports::history_port::HistoryPort;

    fn runtime() -> Result<tokio::runtime::Runtime, TraderError> {
        Ok(tokio::runtime::Runtime::new()?)
    }

    fn rest_adapter(app: &AppConfig) -> Result<BinanceRestAdapter, TraderError> {
        BinanceRestAdapter::new(
            app.stream.rest_url.as_str(),
            Duration::from_secs(app.stream.timeout_secs),
        )
    }

    pub fn run_fetch(app: &AppConfig, output: &Path, limit: Option<usize>) -> Result<(), TraderError> {
        let limit = limit.unwrap_or(MAX_LIMIT);
        let rest = rest_adapter(app)?;
        let mut candles = runtime()?.block_on(rest.fetch_klines(
            &app.stream.symbol,
            &app.stream.interval,
            limit,
        ))?;
        // the file format has no closed flag; keep only finished bars
        candles.retain(|c| c.is_closed);
        let path = CsvAdapter::new(output).save(&app.stream.symbol, &app.stream.interval, &candles)?;
        eprintln!("Wrote {} candles to {}", candles.len(), path.display());
        Ok(())
    }

    pub fn run_watch(app: &AppConfig, every: u64) -> Result<(), TraderError> {
        let every = Duration::from_secs(every.max(1));
        let mut settings = StreamSettings::from_config(&app.stream)?;
        settings.seed_limit = settings.seed_limit.min(MAX_LIMIT);
        let rest = rest_adapter(app)?;
        let ws = Arc::new(BinanceWsAdapter::new(
            app.stream.ws_url.as_str(),
            Duration::from_secs(app.stream.timeout_secs),
        ));
        let params = app.indicators;

        runtime()?.block_on(async move {
            let (feed, status) = LiveFeed::start(settings, &rest, ws).await?;
            eprintln!("Stream started: {status}");

            let mut ticker = tokio::time::interval(every);
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    _ = &mut ctrl_c => {
                        info!("interrupt received");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !feed.is_running() {
                            eprintln!("Stream closed.");
                            break;
                        }
                        let snapshot = feed.store().snapshot();
                        match latest_signal(&snapshot, &params) {
                            Some(row) => println!(
                                "{}  close {:.4}  {}  confidence {:.3}  risk {:.2}",
                                super::format_timestamp(row.features.timestamp()),
                                row.features.close(),
                                row.signal.action,
                                row.signal.confidence,
                                row.signal.risk
                            ),
                            None => eprintln!(
                                "waiting for history ({} of {} candles)",
                                snapshot.len(),
                                params.max_window()
                            ),
                        }
                    }
                }
            }

            feed.stop();
            feed.join().await;
            Ok(())
        })
    }
}
