//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading from real INI files on disk
//! - Candle loading from CSV files
//! - Backtest pipeline output
//! - Error kinds for failing commands

mod common;

use clap::Parser;
use common::*;
use klinetrader::adapters::csv_adapter::CsvAdapter;
use klinetrader::cli::{self, Cli};
use klinetrader::domain::candle::Candle;
use klinetrader::domain::config_validation::AppConfig;
use klinetrader::domain::error::TraderError;
use std::io::Write;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn data_dir(symbol: &str, interval: &str, candles: &[Candle]) -> TempDir {
    let dir = TempDir::new().unwrap();
    CsvAdapter::new(dir.path())
        .save(symbol, interval, candles)
        .unwrap();
    dir
}

fn run(args: &[&str]) -> Result<(), TraderError> {
    let mut argv = vec!["klinetrader"];
    argv.extend_from_slice(args);
    cli::execute(Cli::try_parse_from(argv).unwrap())
}

const VALID_INI: &str = r#"
[stream]
symbol = ETHUSDT
interval = 5m
capacity = 600

[indicators]
ema_short = 9
ema_long = 21

[backtest]
initial_balance = 5000
fee = 0.001
slippage = 0.0005
"#;

mod config_loading {
    use super::*;

    #[test]
    fn load_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let app = cli::load_config(Some(file.path())).unwrap();
        assert_eq!(app.stream.symbol, "ETHUSDT");
        assert_eq!(app.stream.interval, "5m");
        assert_eq!(app.stream.capacity, 600);
        assert_eq!(app.stream.seed_limit, 600);
        assert_eq!(app.backtest.initial_balance(), 5000.0);
        assert_eq!(app.backtest.fee(), 0.001);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        assert_eq!(cli::load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = cli::load_config(Some("/nonexistent/klinetrader.ini".as_ref())).unwrap_err();
        assert!(matches!(err, TraderError::ConfigParse { .. }));
    }

    #[test]
    fn invalid_value_fails_fast() {
        let file = write_temp_ini("[backtest]\nslippage = 1.5\n");
        let err = cli::load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("slippage"));
    }
}

mod candle_loading {
    use super::*;

    #[test]
    fn load_candles_uses_symbol_and_interval() {
        let candles = candles_from_closes(&sine_closes(20), 300);
        let dir = data_dir("ETHUSDT", "5m", &candles);
        let file = write_temp_ini(VALID_INI);
        let app = cli::load_config(Some(file.path())).unwrap();

        assert_eq!(cli::load_candles(&app, dir.path()).unwrap(), candles);
    }

    #[test]
    fn missing_data_file_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let err = cli::load_candles(&AppConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, TraderError::DataSource { .. }));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn backtest_summary_and_trades() {
        let candles = candles_from_closes(&rising_with_pullbacks(150, 100.0), 60);
        let mut out = Vec::new();
        let result =
            cli::run_backtest_pipeline(&candles, &AppConfig::default(), true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("=== Backtest BTCUSDT 1m ==="));
        assert!(text.contains(&format!("Final Value:      {:.2}", result.final_value)));
        assert!(text.contains(&format!("Total Trades:     {}", result.trade_count())));
        assert!(text.contains("=== Trades ==="));
        assert!(text.contains("BUY"));
    }

    #[test]
    fn backtest_with_short_history_reports_initial_balance() {
        let candles = candles_from_closes(&sine_closes(10), 60);
        let mut out = Vec::new();
        let result =
            cli::run_backtest_pipeline(&candles, &AppConfig::default(), false, &mut out).unwrap();
        assert_eq!(result.final_value, 1000.0);
        assert_eq!(result.trade_count(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("=== Trades ==="));
    }

    #[test]
    fn signal_rows_table() {
        use klinetrader::domain::analysis::recent_signals;
        use klinetrader::domain::indicator::IndicatorParams;

        let candles = candles_from_closes(&sine_closes(120), 60);
        let rows = recent_signals(&candles, &IndicatorParams::default(), 5);
        let mut out = Vec::new();
        cli::write_signal_rows(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().next().unwrap().contains("confidence"));
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_succeeds_for_valid_config() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        assert!(run(&["validate", "--config", path]).is_ok());
    }

    #[test]
    fn validate_fails_with_config_error() {
        let file = write_temp_ini("[stream]\ncapacity = 0\n");
        let path = file.path().to_str().unwrap();
        let err = run(&["validate", "--config", path]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn backtest_missing_data_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().to_str().unwrap();
        let err = run(&["backtest", "--data", data]).unwrap_err();
        assert!(matches!(err, TraderError::DataSource { .. }));
    }

    #[test]
    fn dataset_writes_labeled_csv() {
        let candles = candles_from_closes(&sine_closes(120), 60);
        let dir = data_dir("BTCUSDT", "1m", &candles);
        let output = dir.path().join("dataset.csv");

        run(&[
            "dataset",
            "--data",
            dir.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with(",target"));
        assert_eq!(lines.count(), 120 - 49 - 1);
    }

    #[test]
    fn dataset_with_short_history_is_insufficient() {
        let candles = candles_from_closes(&sine_closes(30), 60);
        let dir = data_dir("BTCUSDT", "1m", &candles);
        let output = dir.path().join("dataset.csv");

        let err = run(&[
            "dataset",
            "--data",
            dir.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, TraderError::InsufficientHistory { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn symbol_override_selects_file() {
        let candles = candles_from_closes(&sine_closes(80), 60);
        let dir = data_dir("SOLUSDT", "1m", &candles);
        let result = run(&[
            "signals",
            "--data",
            dir.path().to_str().unwrap(),
            "--symbol",
            "solusdt",
            "--last",
            "3",
        ]);
        assert!(result.is_ok());
    }
}
