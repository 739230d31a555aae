//! MacKinnon (1994) approximate asymptotic p-values for unit-root and
//! cointegration t statistics, regression with a constant term.

use crate::error::StatsError;
use statrs::distribution::{ContinuousCDF, Normal};

/// Response-surface coefficients for one number of integrated variables.
struct Surface {
    tau_max: f64,
    tau_min: f64,
    tau_star: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
}

/// Index 0 is the plain ADF case (one variable), index 1 the two-variable
/// Engle-Granger case.
const SURFACES: [Surface; 2] = [
    Surface {
        tau_max: 2.74,
        tau_min: -18.83,
        tau_star: -1.61,
        small_p: [2.1659, 1.4412, 0.038269],
        large_p: [1.7339, 0.93202, -0.12745, -0.010368],
    },
    Surface {
        tau_max: 0.92,
        tau_min: -18.86,
        tau_star: -2.62,
        small_p: [2.92, 1.5012, 0.039796],
        large_p: [2.1945, 0.64695, -0.29198, -0.042377],
    },
];

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Returns the approximate p-value of `stat` for `n_vars` integrated variables.
///
/// `n_vars` is 1 for an ADF test on a single series and 2 for the residuals of
/// a two-series cointegrating regression. Statistics beyond the tabulated
/// range saturate at 0 and 1; `-inf` maps to 0.
pub fn mackinnon_p_value(stat: f64, n_vars: usize) -> Result<f64, StatsError> {
    let surface = match n_vars {
        1 | 2 => &SURFACES[n_vars - 1],
        other => return Err(StatsError::UnsupportedVariables(other)),
    };
    if stat.is_nan() {
        return Err(StatsError::DegenerateInput("test statistic is NaN".to_string()));
    }

    if stat > surface.tau_max {
        return Ok(1.0);
    }
    if stat < surface.tau_min {
        return Ok(0.0);
    }

    let z = if stat <= surface.tau_star {
        polyval(&surface.small_p, stat)
    } else {
        polyval(&surface.large_p, stat)
    };

    let normal = Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(normal.cdf(z))
}
