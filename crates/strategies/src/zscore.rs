use core_types::{TimeSeries, ZScore};

/// Rolling z-score of a spread over a trailing window of `lookback` points.
///
/// The window ends at and includes the current point. The first
/// `lookback - 1` positions are `Undefined`, as is any window whose values are
/// all equal. A `lookback` below two can never produce a sample deviation, so
/// every position is `Undefined`.
pub fn rolling_zscore(spread: &TimeSeries<f64>, lookback: usize) -> TimeSeries<ZScore> {
    let values = spread.to_values();
    let scores = rolling_zscore_values(&values, lookback);
    TimeSeries::with_index(&spread.timestamps(), scores)
}

/// Slice form of [`rolling_zscore`].
pub fn rolling_zscore_values(values: &[f64], lookback: usize) -> Vec<ZScore> {
    let mut scores = vec![ZScore::Undefined; values.len()];
    if lookback < 2 || values.len() < lookback {
        return scores;
    }

    for (end, score) in scores.iter_mut().enumerate().skip(lookback - 1) {
        let window = &values[end + 1 - lookback..=end];
        *score = window_zscore(window);
    }
    scores
}

/// Z-score of the last element of `window` against the whole window.
fn window_zscore(window: &[f64]) -> ZScore {
    let first = window[0];
    if window.iter().all(|v| *v == first) {
        return ZScore::Undefined;
    }

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let ss: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
    let std_dev = (ss / (n - 1.0)).sqrt();

    let current = window[window.len() - 1];
    ZScore::from_deviation(current - mean, std_dev)
}
