use crate::error::StatsError;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

/// Result of a simple regression `y = intercept + slope * x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub residuals: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Centered total sum of squares of `y`.
    pub sst: f64,
}

impl LinearFit {
    /// Coefficient of determination; `None` when `y` has no variation.
    pub fn r_squared(&self) -> Option<f64> {
        if self.sst == 0.0 {
            None
        } else {
            Some(1.0 - self.ssr / self.sst)
        }
    }
}

/// Ordinary least squares of `y` on `x` with an intercept.
///
/// Uses centered sums, so a noiseless linear relationship is recovered to
/// machine precision. Fails with `DegenerateInput` if `x` has zero variance.
pub fn linear_regression(y: &[f64], x: &[f64]) -> Result<LinearFit, StatsError> {
    if y.len() != x.len() {
        return Err(StatsError::LengthMismatch(y.len(), x.len()));
    }
    let n = y.len();
    if n < 2 {
        return Err(StatsError::InsufficientData { required: 2, actual: n });
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 || x.iter().all(|v| *v == x[0]) {
        return Err(StatsError::DegenerateInput(
            "regressor has zero variance, slope is undefined".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let residuals: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| yi - (intercept + slope * xi))
        .collect();
    let ssr = residuals.iter().map(|e| e * e).sum();

    Ok(LinearFit {
        intercept,
        slope,
        residuals,
        ssr,
        sst: syy,
    })
}

/// Result of a multiple regression `y = X b + e`.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn n_params(&self) -> usize {
        self.params.len()
    }

    /// t statistic of coefficient `i`.
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood at the least-squares estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every column of X as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.n_params() as f64
    }
}

/// Ordinary least squares via the normal equations `b = (X'X)^-1 X'y`.
///
/// The design matrix is used as given: callers add a constant column if they want one.
pub fn ols(y: &[f64], x: &DMatrix<f64>) -> Result<OlsFit, StatsError> {
    let n = y.len();
    let k = x.ncols();
    if x.nrows() != n {
        return Err(StatsError::LengthMismatch(n, x.nrows()));
    }
    if n <= k {
        return Err(StatsError::InsufficientData { required: k + 1, actual: n });
    }

    let y_vec = DVector::from_column_slice(y);
    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse().ok_or_else(|| {
        StatsError::DegenerateInput("design matrix is singular".to_string())
    })?;

    let beta = &xtx_inv * (&xt * &y_vec);
    let residuals = &y_vec - x * &beta;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / (n - k) as f64;

    let std_errors = (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()).collect();

    Ok(OlsFit {
        params: beta.iter().copied().collect(),
        std_errors,
        ssr,
        nobs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_slope() {
        let fit = linear_regression(&[2.0, 4.0, 6.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!(fit.ssr < 1e-20);
    }

    #[test]
    fn constant_regressor_is_degenerate() {
        let err = linear_regression(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateInput(_)));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert_eq!(
            linear_regression(&[1.0, 2.0], &[1.0]).unwrap_err(),
            StatsError::LengthMismatch(2, 1)
        );
    }

    #[test]
    fn multiple_regression_matches_known_coefficients() {
        // y = 1 + 2 a - 3 b, exactly.
        let a = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 0.0, 2.0, 1.0, 3.0, 2.0];
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b).collect();
        let x = DMatrix::from_fn(6, 3, |i, j| match j {
            0 => 1.0,
            1 => a[i],
            _ => b[i],
        });

        let fit = ols(&y, &x).unwrap();
        assert!((fit.params[0] - 1.0).abs() < 1e-9);
        assert!((fit.params[1] - 2.0).abs() < 1e-9);
        assert!((fit.params[2] + 3.0).abs() < 1e-9);
    }

    #[test]
    fn ols_needs_more_rows_than_columns() {
        let x = DMatrix::from_element(2, 2, 1.0);
        assert!(matches!(
            ols(&[1.0, 2.0], &x),
            Err(StatsError::InsufficientData { required: 3, actual: 2 })
        ));
    }
}
