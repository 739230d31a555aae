use crate::error::StatsError;
use crate::ols::{LinearFit, linear_regression};
use core_types::{AlignedPair, PriceSeries, align};

/// Estimates the hedge ratio of a pair: the OLS slope of B on A.
///
/// The series are aligned on their common timestamps first. The intercept is
/// discarded; use [`fit_pair`] when the full fit is needed.
pub fn estimate_hedge_ratio(a: &PriceSeries, b: &PriceSeries) -> Result<f64, StatsError> {
    let fit = fit_pair(&align(a, b))?;
    Ok(fit.slope)
}

/// Regresses the B leg of an aligned pair on its A leg.
pub fn fit_pair(pair: &AlignedPair) -> Result<LinearFit, StatsError> {
    if pair.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: pair.len(),
        });
    }
    linear_regression(&pair.b, &pair.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::TimeSeries;

    fn series(values: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn noiseless_pair_recovers_slope() {
        let ratio = estimate_hedge_ratio(&series(&[1.0, 2.0, 3.0]), &series(&[2.0, 4.0, 6.0])).unwrap();
        assert!((ratio - 2.0).abs() < 1e-12, "ratio = {ratio}");
    }

    #[test]
    fn intercept_does_not_leak_into_ratio() {
        let a = series(&[10.0, 12.0, 11.0, 15.0]);
        let b = series(&[35.0, 41.0, 38.0, 50.0]);
        let ratio = estimate_hedge_ratio(&a, &b).unwrap();
        assert!((ratio - 3.0).abs() < 1e-12);
    }

    #[test]
    fn flat_leg_a_is_degenerate() {
        let err = estimate_hedge_ratio(&series(&[5.0, 5.0, 5.0]), &series(&[1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateInput(_)));
    }

    #[test]
    fn single_common_row_is_insufficient() {
        let err = estimate_hedge_ratio(&series(&[1.0]), &series(&[2.0])).unwrap_err();
        assert_eq!(err, StatsError::InsufficientData { required: 2, actual: 1 });
    }
}
