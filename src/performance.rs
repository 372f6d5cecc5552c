use crate::models::{BacktestMetrics, Signal};
use crate::signals::count_position_changes;
use statrs::statistics::Statistics;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Bar-aligned return series of one backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub daily_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub cumulative_returns: Vec<f64>,
}

pub struct PerformanceCalculator;

impl PerformanceCalculator {
    pub fn calculate_returns(closes: &[f64], signals: &[Signal]) -> ReturnSeries {
        let daily_returns = Self::calculate_daily_returns(closes);
        let strategy_returns = Self::calculate_strategy_returns(&daily_returns, signals);
        let cumulative_returns = Self::calculate_cumulative_returns(&strategy_returns);
        ReturnSeries {
            daily_returns,
            strategy_returns,
            cumulative_returns,
        }
    }

    /// Close-to-close percentage change; bar 0 (and any bar after a
    /// non-positive close) is 0.
    pub fn calculate_daily_returns(closes: &[f64]) -> Vec<f64> {
        let mut returns = vec![0.0; closes.len()];
        for i in 1..closes.len() {
            let prev_close = closes[i - 1];
            if prev_close > 0.0 {
                returns[i] = (closes[i] - prev_close) / prev_close;
            }
        }
        returns
    }

    /// Return of holding yesterday's signal through today's move. The signal
    /// produced from bar `i` first earns on bar `i + 1`.
    pub fn calculate_strategy_returns(daily_returns: &[f64], signals: &[Signal]) -> Vec<f64> {
        let mut returns = vec![0.0; daily_returns.len()];
        for i in 1..daily_returns.len().min(signals.len()) {
            returns[i] = daily_returns[i] * signals[i - 1].as_f64();
        }
        returns
    }

    pub fn calculate_cumulative_returns(strategy_returns: &[f64]) -> Vec<f64> {
        strategy_returns
            .iter()
            .scan(1.0, |growth, r| {
                *growth *= 1.0 + r;
                Some(*growth)
            })
            .collect()
    }

    pub fn calculate_metrics(
        signals: &[Signal],
        returns: &ReturnSeries,
        trading_days_per_year: f64,
    ) -> BacktestMetrics {
        let total_signals = count_position_changes(signals);
        BacktestMetrics {
            success_rate: Self::calculate_success_rate(&returns.strategy_returns, total_signals),
            avg_return: Self::average(&returns.strategy_returns) * 100.0,
            total_signals,
            max_drawdown: Self::calculate_max_drawdown(&returns.cumulative_returns),
            sharpe_ratio: Self::calculate_sharpe_ratio(
                &returns.strategy_returns,
                trading_days_per_year,
            ),
        }
    }

    /// Winning bars as a percentage of position changes; 0 without changes.
    pub fn calculate_success_rate(strategy_returns: &[f64], total_signals: usize) -> f64 {
        if total_signals == 0 {
            return 0.0;
        }
        let winning_bars = strategy_returns.iter().filter(|r| **r > 0.0).count();
        winning_bars as f64 / total_signals as f64 * 100.0
    }

    /// Deepest peak-to-trough decline of the cumulative curve, in percent (<= 0).
    pub fn calculate_max_drawdown(cumulative_returns: &[f64]) -> f64 {
        if cumulative_returns.len() < 2 {
            return 0.0;
        }

        let mut peak_value = cumulative_returns[0];
        let mut max_drawdown = 0.0f64;
        for &value in cumulative_returns {
            if value > peak_value {
                peak_value = value;
            }
            if peak_value > 0.0 {
                let drawdown = (value - peak_value) / peak_value;
                if drawdown < max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        max_drawdown * 100.0
    }

    /// Annualized mean over sample standard deviation; 0 for fewer than two
    /// returns or zero volatility.
    pub fn calculate_sharpe_ratio(strategy_returns: &[f64], trading_days_per_year: f64) -> f64 {
        if strategy_returns.len() < 2 {
            return 0.0;
        }

        let mean_return = strategy_returns.iter().mean();
        let std_dev = strategy_returns.iter().std_dev();

        if std_dev == 0.0 || !std_dev.is_finite() || !mean_return.is_finite() {
            return 0.0;
        }

        mean_return / std_dev * trading_days_per_year.sqrt()
    }

    fn average(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = values.iter().mean();
        if mean.is_finite() {
            mean
        } else {
            0.0
        }
    }
}
