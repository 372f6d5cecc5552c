use chrono::{Duration, NaiveDate};
use indicator_backtest::analysis::run_analysis;
use indicator_backtest::commands::{compute_indicators, snapshot};
use indicator_backtest::config::EngineSettings;
use indicator_backtest::context::AppContext;
use indicator_backtest::data_context::MarketData;
use indicator_backtest::error::EngineError;
use indicator_backtest::models::{AnalysisRequest, PriceBar};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::PathBuf;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

fn trading_bars(count: usize) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 80.0 + (t * 0.17).sin() * 9.0 + t * 0.04;
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open: close - 0.2,
                high: close + 1.1,
                low: close - 1.3,
                close,
                volume: 50_000 + (i as i64 % 11) * 1_000,
            }
        })
        .collect()
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!(
        "indicator-backtest-it-{}-{}",
        test,
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_json_bars(path: &PathBuf, symbol: &str, bars: &[PriceBar]) {
    let body = serde_json::json!({ "symbol": symbol, "bars": bars });
    fs::write(path, serde_json::to_vec_pretty(&body).unwrap()).unwrap();
}

#[test]
fn analysis_from_a_json_file() {
    init_logging();
    let dir = scratch_dir("analysis");
    let path = dir.join("nvda.json");
    write_json_bars(&path, "nvda", &trading_bars(200));

    let market_data = MarketData::load_from_file(&path).unwrap();
    let request = AnalysisRequest {
        symbol: market_data.symbol().to_string(),
        start_date: start_date() + Duration::days(20),
        end_date: start_date() + Duration::days(179),
        indicators: vec![
            "sma_50".to_string(),
            "rsi".to_string(),
            "macd".to_string(),
            "bollinger_bands".to_string(),
            "fibonacci".to_string(),
        ],
        include_series: false,
    };
    let report = run_analysis(market_data.series(), &request, &EngineSettings::default()).unwrap();

    assert_eq!(report.summary.stock, "NVDA");
    assert_eq!(report.summary.data_points, 160);
    assert_eq!(report.summary.indicators_analyzed, 4);
    assert_eq!(report.summary.period, "2022-01-23 to 2022-07-01");
    assert!(report.results.iter().all(|r| r.timeframe == "159 days"));

    let json = serde_json::to_value(&report).unwrap();
    let first = &json["results"][0];
    for key in [
        "stock_symbol",
        "indicator_name",
        "timeframe",
        "success_rate",
        "avg_return",
        "total_signals",
        "max_drawdown",
        "sharpe_ratio",
        "date_calculated",
    ] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("backtests").is_none());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn short_history_is_reported_as_insufficient() {
    init_logging();
    let data = MarketData::new("ko", trading_bars(40)).unwrap();
    let request = AnalysisRequest {
        symbol: "ko".to_string(),
        start_date: start_date(),
        end_date: start_date() + Duration::days(39),
        indicators: vec!["rsi".to_string()],
        include_series: false,
    };

    let err = run_analysis(data.series(), &request, &EngineSettings::default()).unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::InsufficientData {
            required,
            available,
            ..
        }) => {
            assert_eq!(*required, 50);
            assert_eq!(*available, 40);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn snapshot_command_converts_json() {
    init_logging();
    let dir = scratch_dir("snapshot");
    let input = dir.join("xom.json");
    let output = dir.join("nested").join("xom.bin");
    let bars = trading_bars(75);
    write_json_bars(&input, "xom", &bars);

    let app = AppContext::with_settings(EngineSettings::default());
    snapshot::run(&app, &input, &output).unwrap();

    let loaded = MarketData::load_from_file(&output).unwrap();
    assert_eq!(loaded.symbol(), "XOM");
    assert_eq!(loaded.series().bars(), bars.as_slice());

    assert!(snapshot::run(&app, &dir.join("missing.json"), &output).is_err());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn stock_data_view_marks_warm_up_as_null() {
    init_logging();
    let data = MarketData::new("amd", trading_bars(60)).unwrap();
    let view = compute_indicators::build_view(data.symbol(), data.series(), None, None).unwrap();
    let json: Value = serde_json::to_value(&view).unwrap();

    let sma = json["series"]["columns"]["sma_20"].as_array().unwrap();
    assert_eq!(sma.len(), 60);
    assert!(sma[..19].iter().all(Value::is_null));
    assert!(sma[19..].iter().all(Value::is_number));

    let obv = json["series"]["columns"]["obv"].as_array().unwrap();
    assert_eq!(obv[0], Value::from(0.0));
    assert_eq!(json["indicators"].as_array().unwrap().len(), 14);
}
