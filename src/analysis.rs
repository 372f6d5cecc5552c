use crate::backtester::BacktestEngine;
use crate::config::EngineSettings;
use crate::error::EngineError;
use crate::models::{AnalysisReport, AnalysisRequest, AnalysisSummary, IndicatorResult, PriceSeries};
use crate::strategy::IndicatorKind;
use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{info, warn};
use std::cmp::Ordering;

/// Uppercased, trimmed ticker. Empty input is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, EngineError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(EngineError::invalid("stock symbol must not be empty"));
    }
    Ok(symbol)
}

/// Parses the requested identifiers in order, skipping unknown ones and
/// repeats.
pub fn resolve_indicators(identifiers: &[String]) -> Vec<IndicatorKind> {
    let mut kinds: Vec<IndicatorKind> = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        match IndicatorKind::from_identifier(identifier) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => warn!("Skipping unknown indicator '{}'", identifier),
        }
    }
    kinds
}

/// Backtests every requested indicator over the bars of `series` that fall
/// inside the request's date range.
pub fn run_analysis(
    series: &PriceSeries,
    request: &AnalysisRequest,
    settings: &EngineSettings,
) -> Result<AnalysisReport> {
    if request.start_date >= request.end_date {
        return Err(EngineError::invalid(format!(
            "start date {} must be before end date {}",
            request.start_date, request.end_date
        ))
        .into());
    }
    let days = (request.end_date - request.start_date).num_days();
    if days > settings.max_analysis_range_days {
        return Err(EngineError::invalid(format!(
            "date range of {} days exceeds the maximum of {} days",
            days, settings.max_analysis_range_days
        ))
        .into());
    }
    let symbol = normalize_symbol(&request.symbol)?;

    let mut window = series.restrict_to_range(request.start_date, request.end_date);
    if window.len() < settings.min_analysis_bars {
        return Err(EngineError::insufficient(
            "analysis",
            settings.min_analysis_bars,
            window.len(),
        )
        .into());
    }

    let requested = resolve_indicators(&request.indicators);
    if requested.is_empty() {
        return Err(anyhow!(
            "no recognised indicators in request for {}",
            symbol
        ));
    }

    let mut kinds = Vec::with_capacity(requested.len());
    for kind in requested {
        match kind.prepare(&mut window) {
            Ok(()) => kinds.push(kind),
            Err(err) => warn!("Skipping {} for {}: {}", kind, symbol, err),
        }
    }

    let timeframe = format!("{} days", days);
    let calculated_at = Utc::now();
    let mut results = Vec::with_capacity(kinds.len());
    let mut backtests = Vec::new();
    for (kind, outcome) in BacktestEngine::run_many(&window, &kinds, settings) {
        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                warn!("Backtest of {} for {} failed: {}", kind, symbol, err);
                continue;
            }
        };
        let metrics = report.metrics;
        results.push(IndicatorResult {
            stock_symbol: symbol.clone(),
            indicator_name: kind.identifier().to_string(),
            timeframe: timeframe.clone(),
            success_rate: metrics.success_rate,
            avg_return: metrics.avg_return,
            total_signals: metrics.total_signals,
            max_drawdown: metrics.max_drawdown,
            sharpe_ratio: metrics.sharpe_ratio,
            date_calculated: calculated_at,
        });
        if request.include_series {
            backtests.push(report);
        }
    }

    if results.is_empty() {
        return Err(anyhow!("no indicator could be analysed for {}", symbol));
    }

    results.sort_by(|a, b| {
        b.success_rate
            .partial_cmp(&a.success_rate)
            .unwrap_or(Ordering::Equal)
    });

    info!(
        "Analysed {} indicator(s) for {} over {} bars",
        results.len(),
        symbol,
        window.len()
    );

    Ok(AnalysisReport {
        summary: AnalysisSummary {
            stock: symbol,
            period: format!("{} to {}", request.start_date, request.end_date),
            indicators_analyzed: results.len(),
            data_points: window.len(),
        },
        results,
        backtests,
    })
}
