use core_types::{AlignedPair, PriceSeries, TimeSeries, align};
use serde::Serialize;

/// Builds the spread `B - hedge_ratio * A` over the common timestamps of the two series.
///
/// Rows where either price is undefined are dropped. Disjoint or empty inputs
/// produce an empty spread.
pub fn calculate_spread(a: &PriceSeries, b: &PriceSeries, hedge_ratio: f64) -> TimeSeries<f64> {
    spread_of_pair(&align(a, b), hedge_ratio)
}

/// Spread of an already aligned pair.
pub fn spread_of_pair(pair: &AlignedPair, hedge_ratio: f64) -> TimeSeries<f64> {
    let values = pair
        .a
        .iter()
        .zip(&pair.b)
        .map(|(pa, pb)| pb - hedge_ratio * pa)
        .collect();
    TimeSeries::with_index(&pair.timestamps, values)
}

/// Descriptive statistics of a spread series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadSummary {
    pub len: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` with fewer than two points.
    pub std_dev: Option<f64>,
}

impl SpreadSummary {
    pub fn from_spread(spread: &TimeSeries<f64>) -> Self {
        let values = spread.to_values();
        let len = values.len();
        if len == 0 {
            return Self { len, mean: None, std_dev: None };
        }

        let mean = values.iter().sum::<f64>() / len as f64;
        let std_dev = (len > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (len - 1) as f64).sqrt()
        });

        Self {
            len,
            mean: Some(mean),
            std_dev,
        }
    }
}
