//! Indicator formulas over plain slices.
//!
//! Every function returns a vector aligned to its input with `f64::NAN` in the
//! warm-up window. Inputs that start with undefined values (for example the
//! MACD line) are handled by starting the window at the first defined value.

fn first_defined(values: &[f64]) -> Option<usize> {
    values.iter().position(|value| value.is_finite())
}

pub fn calculate_sma(prices: &[f64], period: usize) -> Vec<f64> {
    let mut sma_values = vec![f64::NAN; prices.len()];
    if period == 0 {
        return sma_values;
    }
    let Some(start) = first_defined(prices) else {
        return sma_values;
    };
    if prices.len() - start < period {
        return sma_values;
    }

    let first_full = start + period - 1;
    let mut window_sum: f64 = prices[start..=first_full].iter().sum();
    sma_values[first_full] = window_sum / period as f64;
    for i in (first_full + 1)..prices.len() {
        window_sum += prices[i] - prices[i - period];
        sma_values[i] = window_sum / period as f64;
    }

    sma_values
}

/// EMA with smoothing `2 / (period + 1)`, seeded by the SMA of the first
/// `period` defined inputs.
pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    let mut ema_values = vec![f64::NAN; prices.len()];
    if period == 0 {
        return ema_values;
    }
    let Some(start) = first_defined(prices) else {
        return ema_values;
    };
    if prices.len() - start < period {
        return ema_values;
    }

    let seed_index = start + period - 1;
    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = prices[start..=seed_index].iter().sum::<f64>() / period as f64;
    ema_values[seed_index] = ema;

    for i in (seed_index + 1)..prices.len() {
        ema = (prices[i] * multiplier) + (ema * (1.0 - multiplier));
        ema_values[i] = ema;
    }

    ema_values
}

pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdOutput {
    let fast_ema = calculate_ema(prices, fast_period);
    let slow_ema = calculate_ema(prices, slow_period);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal = calculate_ema(&macd, signal_period);
    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(line, signal)| line - signal)
        .collect();

    MacdOutput {
        macd,
        signal,
        histogram,
    }
}

/// Neutral 50 whenever there is no average loss to divide by.
fn rsi_from_avgs(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        50.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Wilder's RSI. The first value lands on index `period`, after `period`
/// price changes have been observed.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut rsi_values = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period + 1 {
        return rsi_values;
    }

    let mut sum_gain = 0.0f64;
    let mut sum_loss = 0.0f64;
    for i in 1..=period {
        let delta = prices[i] - prices[i - 1];
        if delta >= 0.0 {
            sum_gain += delta;
        } else {
            sum_loss += -delta;
        }
    }

    let mut avg_gain = sum_gain / period as f64;
    let mut avg_loss = sum_loss / period as f64;
    rsi_values[period] = rsi_from_avgs(avg_gain, avg_loss);

    for i in (period + 1)..prices.len() {
        let delta = prices[i] - prices[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        rsi_values[i] = rsi_from_avgs(avg_gain, avg_loss);
    }

    rsi_values
}

pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bands at `std_dev` population standard deviations around the SMA.
pub fn calculate_bollinger_bands(prices: &[f64], period: usize, std_dev: f64) -> BollingerOutput {
    let middle = calculate_sma(prices, period);
    let mut upper = vec![f64::NAN; prices.len()];
    let mut lower = vec![f64::NAN; prices.len()];

    for (i, &mean) in middle.iter().enumerate() {
        if !mean.is_finite() {
            continue;
        }
        let window = &prices[i + 1 - period..=i];
        let variance = window
            .iter()
            .map(|&value| (value - mean).powi(2))
            .sum::<f64>()
            / period as f64;
        let standard_deviation = variance.sqrt();

        upper[i] = mean + (std_dev * standard_deviation);
        lower[i] = mean - (std_dev * standard_deviation);
    }

    BollingerOutput {
        upper,
        middle,
        lower,
    }
}

pub struct StochasticOutput {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// %K over `period` bars and %D as the `smoothing`-bar SMA of %K. A bar whose
/// window has no high/low range reads 50.
pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smoothing: usize,
) -> StochasticOutput {
    let mut k = vec![f64::NAN; closes.len()];
    if period > 0 && closes.len() >= period {
        for i in (period - 1)..closes.len() {
            let window_start = i + 1 - period;
            let lowest_low = lows[window_start..=i]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            let highest_high = highs[window_start..=i]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest_high - lowest_low;
            k[i] = if range > 0.0 {
                100.0 * (closes[i] - lowest_low) / range
            } else {
                50.0
            };
        }
    }

    let d = calculate_sma(&k, smoothing);
    StochasticOutput { k, d }
}

fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Wilder-smoothed true range, seeded with the mean of the first `period`
/// true ranges. True range needs a previous close, so the first value lands on
/// index `period`.
pub fn calculate_atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let mut atr_values = vec![f64::NAN; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return atr_values;
    }

    let mut tr_values = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        tr_values[i] = true_range(highs[i], lows[i], closes[i - 1]);
    }

    let p = period as f64;
    let mut atr = tr_values[1..=period].iter().sum::<f64>() / p;
    atr_values[period] = atr;
    for i in (period + 1)..closes.len() {
        atr = (atr * (p - 1.0) + tr_values[i]) / p;
        atr_values[i] = atr;
    }

    atr_values
}

pub fn calculate_obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut obv_values = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        if closes[i] > closes[i - 1] {
            obv_values[i] = obv_values[i - 1] + volumes[i];
        } else if closes[i] < closes[i - 1] {
            obv_values[i] = obv_values[i - 1] - volumes[i];
        } else {
            obv_values[i] = obv_values[i - 1];
        }
    }
    obv_values
}

fn directional_index(plus_dm: f64, minus_dm: f64, tr: f64) -> f64 {
    if tr <= 0.0 {
        return 0.0;
    }
    let di_plus = (plus_dm / tr) * 100.0;
    let di_minus = (minus_dm / tr) * 100.0;
    let di_sum = di_plus + di_minus;
    if di_sum > 0.0 {
        ((di_plus - di_minus).abs() / di_sum) * 100.0
    } else {
        0.0
    }
}

/// Wilder's ADX: DX from Wilder-smoothed +DM, -DM and true range, then ADX
/// as the Wilder average of DX. The first value lands on index `2 * period - 1`.
pub fn calculate_adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut adx_values = vec![f64::NAN; n];
    if period == 0 || n < 2 * period {
        return adx_values;
    }

    let mut tr_values = vec![0.0; n];
    let mut dm_plus_values = vec![0.0; n];
    let mut dm_minus_values = vec![0.0; n];

    // True Range and Directional Movement
    for i in 1..n {
        tr_values[i] = true_range(highs[i], lows[i], closes[i - 1]);

        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];

        dm_plus_values[i] = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        dm_minus_values[i] = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
    }

    let p = period as f64;
    let mut smoothed_tr: f64 = tr_values[1..=period].iter().sum();
    let mut smoothed_plus: f64 = dm_plus_values[1..=period].iter().sum();
    let mut smoothed_minus: f64 = dm_minus_values[1..=period].iter().sum();

    let mut dx_values = vec![f64::NAN; n];
    dx_values[period] = directional_index(smoothed_plus, smoothed_minus, smoothed_tr);
    for i in (period + 1)..n {
        smoothed_tr = smoothed_tr - smoothed_tr / p + tr_values[i];
        smoothed_plus = smoothed_plus - smoothed_plus / p + dm_plus_values[i];
        smoothed_minus = smoothed_minus - smoothed_minus / p + dm_minus_values[i];
        dx_values[i] = directional_index(smoothed_plus, smoothed_minus, smoothed_tr);
    }

    let first = 2 * period - 1;
    let mut adx = dx_values[period..=first].iter().sum::<f64>() / p;
    adx_values[first] = adx;
    for i in (first + 1)..n {
        adx = (adx * (p - 1.0) + dx_values[i]) / p;
        adx_values[i] = adx;
    }

    adx_values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(len: usize, start: f64, step: f64) -> Vec<f64> {
        (0..len).map(|i| start + step * i as f64).collect()
    }

    fn defined_from(values: &[f64]) -> Option<usize> {
        values.iter().position(|value| !value.is_nan())
    }

    #[test]
    fn sma_leaves_warm_up_undefined() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = calculate_sma(&prices, 3);
        assert!(sma[0].is_nan() && sma[1].is_nan());
        assert!((sma[2] - 2.0).abs() < 1e-12);
        assert!((sma[3] - 3.0).abs() < 1e-12);
        assert!((sma[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_shorter_than_window_is_all_undefined() {
        let sma = calculate_sma(&[1.0, 2.0], 3);
        assert_eq!(sma.len(), 2);
        assert!(sma.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_is_seeded_with_sma() {
        let prices = [2.0, 4.0, 6.0, 8.0];
        let ema = calculate_ema(&prices, 3);
        assert!(ema[0].is_nan() && ema[1].is_nan());
        assert!((ema[2] - 4.0).abs() < 1e-12);
        // multiplier 0.5: 8 * 0.5 + 4 * 0.5
        assert!((ema[3] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn ema_skips_leading_undefined_inputs() {
        let values = [f64::NAN, f64::NAN, 1.0, 1.0, 1.0];
        let ema = calculate_ema(&values, 2);
        assert_eq!(defined_from(&ema), Some(3));
        assert!((ema[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn macd_signal_starts_after_slow_and_signal_windows() {
        let prices = linear(60, 100.0, 0.5);
        let output = calculate_macd(&prices, 12, 26, 9);
        assert_eq!(defined_from(&output.macd), Some(25));
        assert_eq!(defined_from(&output.signal), Some(33));
        assert_eq!(defined_from(&output.histogram), Some(33));
        // a steady uptrend keeps the fast EMA above the slow EMA
        assert!(output.macd[59] > 0.0);
    }

    #[test]
    fn rsi_on_flat_prices_is_neutral() {
        let rsi = calculate_rsi(&[10.0; 20], 14);
        assert_eq!(defined_from(&rsi), Some(14));
        assert!(rsi[14..].iter().all(|v| (*v - 50.0).abs() < 1e-12));
    }

    #[test]
    fn rsi_extremes_for_one_way_moves() {
        // no losses at all reads neutral
        let rising = calculate_rsi(&linear(20, 10.0, 1.0), 14);
        assert!(rising[14..].iter().all(|v| (*v - 50.0).abs() < 1e-12));

        let falling = calculate_rsi(&linear(20, 50.0, -1.0), 14);
        assert!(falling[19].abs() < 1e-12);
    }

    #[test]
    fn rsi_stays_within_bounds() {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let rsi = calculate_rsi(&prices, 14);
        assert!(rsi[14..].iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn bollinger_bands_collapse_on_flat_prices() {
        let bands = calculate_bollinger_bands(&[5.0; 25], 20, 2.0);
        assert_eq!(defined_from(&bands.middle), Some(19));
        assert!((bands.upper[24] - 5.0).abs() < 1e-12);
        assert!((bands.lower[24] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_width_follows_population_std_dev() {
        let prices = [1.0, 3.0, 1.0, 3.0];
        let bands = calculate_bollinger_bands(&prices, 4, 2.0);
        assert!((bands.middle[3] - 2.0).abs() < 1e-12);
        assert!((bands.upper[3] - 4.0).abs() < 1e-12);
        assert!(bands.lower[3].abs() < 1e-12);
    }

    #[test]
    fn stochastic_reads_position_in_range() {
        let highs = [10.0, 12.0, 14.0, 16.0, 18.0];
        let lows = [8.0, 9.0, 10.0, 11.0, 12.0];
        let closes = [9.0, 11.0, 13.0, 15.0, 17.0];
        let output = calculate_stochastic(&highs, &lows, &closes, 3, 3);

        assert_eq!(defined_from(&output.k), Some(2));
        // window 0..=2: low 8, high 14, close 13
        assert!((output.k[2] - 100.0 * 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(defined_from(&output.d), Some(4));
        let expected_d = (output.k[2] + output.k[3] + output.k[4]) / 3.0;
        assert!((output.d[4] - expected_d).abs() < 1e-9);
    }

    #[test]
    fn stochastic_without_range_is_neutral() {
        let flat = [7.0; 6];
        let output = calculate_stochastic(&flat, &flat, &flat, 3, 3);
        assert!(output.k[2..].iter().all(|v| (*v - 50.0).abs() < 1e-12));
    }

    #[test]
    fn atr_averages_true_range() {
        let highs = [11.0, 12.0, 13.0, 14.0];
        let lows = [9.0, 10.0, 11.0, 12.0];
        let closes = [10.0, 11.0, 12.0, 13.0];
        let atr = calculate_atr(&highs, &lows, &closes, 2);
        assert!(atr[0].is_nan() && atr[1].is_nan());
        assert!((atr[2] - 2.0).abs() < 1e-12);
        assert!((atr[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atr_uses_wilder_smoothing_after_the_seed() {
        let highs = [10.0, 12.0, 11.0, 16.0, 12.0];
        let lows = [9.0, 10.0, 10.0, 11.0, 11.0];
        let closes = [10.0, 11.0, 10.5, 15.0, 11.5];
        // true ranges from bar 1: 2.0, 1.0, 5.5, 4.0
        let atr = calculate_atr(&highs, &lows, &closes, 2);
        assert!((atr[2] - 1.5).abs() < 1e-12);
        // a trailing mean would give 3.25 and 4.75
        assert!((atr[3] - 3.5).abs() < 1e-12);
        assert!((atr[4] - 3.75).abs() < 1e-12);
    }

    #[test]
    fn obv_accumulates_signed_volume() {
        let closes = [10.0, 11.0, 11.0, 9.0, 12.0];
        let volumes = [100.0, 200.0, 300.0, 400.0, 500.0];
        let obv = calculate_obv(&closes, &volumes);
        assert_eq!(obv, vec![0.0, 200.0, 200.0, -200.0, 300.0]);
    }

    #[test]
    fn adx_is_high_in_a_clean_trend() {
        let closes = linear(40, 100.0, 1.0);
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let adx = calculate_adx(&highs, &lows, &closes, 14);

        assert_eq!(defined_from(&adx), Some(27));
        assert!((adx[39] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn adx_without_movement_is_zero() {
        let flat = [20.0; 30];
        let adx = calculate_adx(&flat, &flat, &flat, 14);
        assert!(adx[27..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn repeated_calculation_is_bit_identical() {
        let prices: Vec<f64> = (0..120)
            .map(|i| 50.0 + (i as f64 * 0.31).cos() * 3.0 + i as f64 * 0.05)
            .collect();
        let first = calculate_macd(&prices, 12, 26, 9);
        let second = calculate_macd(&prices, 12, 26, 9);
        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.macd), bits(&second.macd));
        assert_eq!(bits(&first.signal), bits(&second.signal));
    }
}
