use crate::analysis::run_analysis;
use crate::commands::market_data_snapshot::ensure_market_data_file;
use crate::commands::output::write_json;
use crate::context::AppContext;
use crate::models::AnalysisRequest;
use crate::strategy::IndicatorKind;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::path::Path;

pub struct AnalyzeArgs<'a> {
    pub data_file: &'a Path,
    pub symbol: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub indicators: Vec<String>,
    pub include_series: bool,
    pub output: Option<&'a Path>,
}

pub fn run(app: &AppContext, args: AnalyzeArgs<'_>) -> Result<()> {
    ensure_market_data_file(args.data_file)?;
    let market_data = app.load_market_data(args.data_file)?;

    let indicators = if args.indicators.is_empty() {
        IndicatorKind::ALL
            .iter()
            .map(|kind| kind.identifier().to_string())
            .collect()
    } else {
        args.indicators
    };
    let request = AnalysisRequest {
        symbol: args
            .symbol
            .unwrap_or_else(|| market_data.symbol().to_string()),
        start_date: args.start_date,
        end_date: args.end_date,
        indicators,
        include_series: args.include_series,
    };

    info!(
        "Analyzing {} from {} to {} with {}",
        request.symbol,
        request.start_date,
        request.end_date,
        request.indicators.join(", ")
    );
    let report = run_analysis(market_data.series(), &request, app.settings())
        .with_context(|| format!("Analysis failed for {}", request.symbol))?;

    if let Some(best) = report.results.first() {
        info!(
            "Best indicator for {}: {} ({:.2}% success, Sharpe {:.2})",
            report.summary.stock, best.indicator_name, best.success_rate, best.sharpe_ratio
        );
    }
    write_json(&report, args.output)
}
