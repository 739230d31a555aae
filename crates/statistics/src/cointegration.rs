use crate::adf::{Deterministic, adf_statistic};
use crate::error::StatsError;
use crate::hedge_ratio::fit_pair;
use crate::mackinnon::mackinnon_p_value;
use configuration::{MIN_COINTEGRATION_OBSERVATIONS, StrategyParams};
use core_types::{AlignedPair, PriceSeries, align};
use serde::Serialize;
use tracing::{info, warn};

/// Coefficient of determination above which the two legs are treated as
/// perfectly collinear and the residual unit-root test is skipped.
fn collinearity_threshold() -> f64 {
    1.0 - 100.0 * f64::EPSILON.sqrt()
}

/// Outcome of an Engle-Granger cointegration test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CointegrationResult {
    pub is_cointegrated: bool,
    pub p_value: f64,
    /// ADF t statistic on the residuals; `-inf` for perfectly collinear legs.
    pub statistic: f64,
    /// Slope of the cointegrating regression of B on A.
    pub hedge_ratio: f64,
    pub intercept: f64,
    pub used_lag: usize,
    /// Aligned observations entering the regression.
    pub nobs: usize,
}

/// Engle-Granger two-step test: OLS of B on A, then a unit-root test on the residuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointegrationTester {
    significance_level: f64,
    min_observations: usize,
}

impl Default for CointegrationTester {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_observations: MIN_COINTEGRATION_OBSERVATIONS,
        }
    }
}

impl CointegrationTester {
    /// `min_observations` is raised to the hard floor of three if lower.
    pub fn new(significance_level: f64, min_observations: usize) -> Self {
        Self {
            significance_level,
            min_observations: min_observations.max(MIN_COINTEGRATION_OBSERVATIONS),
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(params.significance_level(), params.min_observations())
    }

    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    /// Aligns the two price series and tests them for cointegration.
    pub fn test(&self, a: &PriceSeries, b: &PriceSeries) -> Result<CointegrationResult, StatsError> {
        self.test_aligned(&align(a, b))
    }

    /// Tests an already aligned pair.
    pub fn test_aligned(&self, pair: &AlignedPair) -> Result<CointegrationResult, StatsError> {
        let nobs = pair.len();
        if nobs < self.min_observations {
            return Err(StatsError::InsufficientData {
                required: self.min_observations,
                actual: nobs,
            });
        }

        let fit = fit_pair(pair)?;

        let collinear = match fit.r_squared() {
            Some(r2) => r2 >= collinearity_threshold(),
            None => true,
        };

        let (statistic, used_lag) = if collinear {
            warn!(
                hedge_ratio = fit.slope,
                "Legs are perfectly collinear; residuals are treated as stationary"
            );
            (f64::NEG_INFINITY, 0)
        } else {
            let adf = adf_statistic(&fit.residuals, Deterministic::None)?;
            (adf.statistic, adf.used_lag)
        };

        let p_value = mackinnon_p_value(statistic, 2)?;
        let is_cointegrated = p_value < self.significance_level;

        info!(
            nobs,
            statistic,
            p_value,
            hedge_ratio = fit.slope,
            is_cointegrated,
            "Engle-Granger test complete"
        );

        Ok(CointegrationResult {
            is_cointegrated,
            p_value,
            statistic,
            hedge_ratio: fit.slope,
            intercept: fit.intercept,
            used_lag,
            nobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::TimeSeries;

    fn series(values: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
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
    fn too_few_aligned_rows_is_insufficient() {
        let tester = CointegrationTester::default();
        let err = tester.test(&series(&[1.0, 2.0]), &series(&[2.0, 4.0])).unwrap_err();
        assert_eq!(err, StatsError::InsufficientData { required: 3, actual: 2 });
    }

    #[test]
    fn minimum_is_configurable_but_floored() {
        assert_eq!(CointegrationTester::new(0.05, 1).min_observations(), 3);

        let tester = CointegrationTester::new(0.05, 10);
        let a: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let err = tester.test(&series(&a), &series(&a)).unwrap_err();
        assert_eq!(err, StatsError::InsufficientData { required: 10, actual: 8 });
    }

    #[test]
    fn constant_leg_a_is_degenerate() {
        let tester = CointegrationTester::default();
        let err = tester
            .test(&series(&[4.0, 4.0, 4.0, 4.0]), &series(&[1.0, 3.0, 2.0, 5.0]))
            .unwrap_err();
        assert!(matches!(err, StatsError::DegenerateInput(_)));
    }

    #[test]
    fn exact_linear_pair_is_collinear_and_cointegrated() {
        let a: Vec<f64> = (0..30).map(|i| 10.0 + (i as f64 * 0.7).sin() + i as f64 * 0.1).collect();
        let b: Vec<f64> = a.iter().map(|x| 1.5 * x + 2.0).collect();

        let result = CointegrationTester::default().test(&series(&a), &series(&b)).unwrap();

        assert!(result.is_cointegrated);
        assert_eq!(result.p_value, 0.0);
        assert_eq!(result.statistic, f64::NEG_INFINITY);
        assert!((result.hedge_ratio - 1.5).abs() < 1e-9);
        assert!((result.intercept - 2.0).abs() < 1e-8);
    }

    #[test]
    fn from_params_uses_strategy_settings() {
        let params = StrategyParams::default()
            .with_significance_level(0.01)
            .unwrap()
            .with_min_observations(50)
            .unwrap();
        let tester = CointegrationTester::from_params(&params);
        assert_eq!(tester.significance_level(), 0.01);
        assert_eq!(tester.min_observations(), 50);
    }
}
