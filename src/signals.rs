use crate::error::{EngineError, EngineResult};
use crate::models::{PriceSeries, Signal};
use crate::strategy::{IndicatorKind, SignalThresholds};

/// Applies the indicator's rule to every bar of an already prepared series.
///
/// Fails with [`EngineError::InvalidInput`] when a column the rule needs has not
/// been computed. Warm-up bars come out flat.
pub fn generate_signals(
    series: &PriceSeries,
    kind: IndicatorKind,
    thresholds: &SignalThresholds,
) -> EngineResult<Vec<Signal>> {
    let columns = kind
        .required_columns()
        .iter()
        .map(|name| {
            series.column(name).ok_or_else(|| {
                EngineError::invalid(format!("column {name} required by {kind} is missing"))
            })
        })
        .collect::<EngineResult<Vec<&[f64]>>>()?;

    let mut values = Vec::with_capacity(columns.len());
    let signals = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            values.clear();
            values.extend(columns.iter().map(|column| column[i]));
            kind.signal(bar.close, &values, thresholds)
        })
        .collect();

    Ok(signals)
}

/// Per-bar flag for "signal differs from the previous bar". Bar 0 has no
/// predecessor and is never a change.
pub fn position_changes(signals: &[Signal]) -> Vec<bool> {
    let mut changes = vec![false; signals.len()];
    for i in 1..signals.len() {
        changes[i] = signals[i] != signals[i - 1];
    }
    changes
}

pub fn count_position_changes(signals: &[Signal]) -> usize {
    signals
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count()
}
