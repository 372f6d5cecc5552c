use crate::config::EngineSettings;
use crate::error::EngineResult;
use crate::models::{BacktestReport, PriceSeries};
use crate::performance::PerformanceCalculator;
use crate::signals::{generate_signals, position_changes};
use crate::strategy::IndicatorKind;
use log::debug;
use rayon::prelude::*;
use std::time::Instant;

/// Runs one indicator rule over a prepared series and reduces it to metrics.
///
/// The engine only reads the series. Columns must already be present, see
/// [`IndicatorKind::prepare`].
pub struct BacktestEngine;

impl BacktestEngine {
    pub fn run(
        series: &PriceSeries,
        kind: IndicatorKind,
        settings: &EngineSettings,
    ) -> EngineResult<BacktestReport> {
        let started = Instant::now();
        let signals = generate_signals(series, kind, &settings.signal_thresholds())?;
        let returns = PerformanceCalculator::calculate_returns(&series.closes(), &signals);
        let metrics = PerformanceCalculator::calculate_metrics(
            &signals,
            &returns,
            settings.trading_days_per_year,
        );

        let exposed_bars = signals
            .iter()
            .take(signals.len().saturating_sub(1))
            .filter(|signal| !signal.is_flat())
            .count();
        let total_return = returns
            .cumulative_returns
            .last()
            .map(|growth| (growth - 1.0) * 100.0)
            .unwrap_or(0.0);

        debug!(
            "Backtested {} over {} bars in {:?}: {} position changes, avg return {:.4}%",
            kind,
            series.len(),
            started.elapsed(),
            metrics.total_signals,
            metrics.avg_return
        );

        Ok(BacktestReport {
            indicator: kind,
            metrics,
            position_changes: position_changes(&signals),
            signals,
            daily_returns: returns.daily_returns,
            strategy_returns: returns.strategy_returns,
            cumulative_returns: returns.cumulative_returns,
            exposed_bars,
            total_return,
        })
    }

    /// Backtests several indicators over the same series in parallel. Results
    /// come back in the order of `kinds`.
    pub fn run_many(
        series: &PriceSeries,
        kinds: &[IndicatorKind],
        settings: &EngineSettings,
    ) -> Vec<(IndicatorKind, EngineResult<BacktestReport>)> {
        kinds
            .par_iter()
            .map(|&kind| (kind, Self::run(series, kind, settings)))
            .collect()
    }
}
