use crate::error::StatsError;
use crate::mackinnon::mackinnon_p_value;
use crate::ols::{OlsFit, ols};
use nalgebra::DMatrix;
use serde::Serialize;
use tracing::debug;

/// Deterministic terms included in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deterministic {
    /// No constant. Used on cointegration residuals, which already have zero mean.
    None,
    Constant,
}

impl Deterministic {
    fn columns(self) -> usize {
        match self {
            Deterministic::None => 0,
            Deterministic::Constant => 1,
        }
    }
}

/// Outcome of an Augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfResult {
    /// t statistic of the lagged level coefficient.
    pub statistic: f64,
    pub p_value: f64,
    /// Number of lagged differences chosen by AIC.
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
}

/// Outcome of the regression stage only, before a p-value is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AdfStatistic {
    pub statistic: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Tests `series` for a unit root with a constant in the test regression.
///
/// A small p-value rejects the unit root, i.e. the series looks stationary.
pub fn adf_test(series: &[f64]) -> Result<AdfResult, StatsError> {
    let stat = adf_statistic(series, Deterministic::Constant)?;
    let p_value = mackinnon_p_value(stat.statistic, 1)?;
    Ok(AdfResult {
        statistic: stat.statistic,
        p_value,
        used_lag: stat.used_lag,
        nobs: stat.nobs,
    })
}

/// Upper bound on the lag order for a series of `n` points.
///
/// Schwert's rule `ceil(12 * (n/100)^(1/4))`, capped so every candidate
/// regression keeps at least one residual degree of freedom.
pub(crate) fn max_lag(n: usize, deterministic: Deterministic) -> Option<usize> {
    let ntrend = deterministic.columns();
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let half_sample = (n / 2).checked_sub(ntrend + 1)?;
    let dof_bound = n.checked_sub(3 + ntrend)? / 2;
    Some(schwert.min(half_sample).min(dof_bound))
}

/// Runs the ADF regression and returns the raw statistic.
///
/// Lag order is selected by minimum AIC over a common sample sized for the
/// largest candidate lag; the chosen lag is then refit on all available rows.
pub(crate) fn adf_statistic(
    series: &[f64],
    deterministic: Deterministic,
) -> Result<AdfStatistic, StatsError> {
    let n = series.len();
    let required = deterministic.columns() + 3;
    if n < required {
        return Err(StatsError::InsufficientData { required, actual: n });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::DegenerateInput("series contains non-finite values".to_string()));
    }
    if series.iter().all(|v| *v == series[0]) {
        return Err(StatsError::DegenerateInput("series is constant".to_string()));
    }

    let max_lag = max_lag(n, deterministic)
        .ok_or(StatsError::InsufficientData { required, actual: n })?;
    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    // Ties keep the smaller lag.
    let mut best: Option<(usize, f64)> = None;
    for lags in 0..=max_lag {
        let fit = match fit_lagged(series, &diffs, max_lag, lags, deterministic) {
            Ok(fit) => fit,
            Err(_) => continue,
        };
        let aic = fit.aic();
        if best.is_none_or(|(_, best_aic)| aic < best_aic) {
            best = Some((lags, aic));
        }
    }
    let (used_lag, _) = best.ok_or_else(|| {
        StatsError::DegenerateInput("no lag order produced a valid regression".to_string())
    })?;

    let fit = fit_lagged(series, &diffs, used_lag, used_lag, deterministic)?;
    let statistic = fit.t_value(0);
    if statistic.is_nan() {
        return Err(StatsError::DegenerateInput("ADF statistic is undefined".to_string()));
    }

    debug!(max_lag, used_lag, nobs = fit.nobs, statistic, "ADF regression fitted");
    Ok(AdfStatistic {
        statistic,
        used_lag,
        nobs: fit.nobs,
    })
}

/// Regresses `diff[t]` on `level[t]`, `lags` lagged differences and the
/// deterministic terms, over rows `t = sample_lag .. diffs.len()`.
///
/// Column 0 is always the lagged level.
fn fit_lagged(
    levels: &[f64],
    diffs: &[f64],
    sample_lag: usize,
    lags: usize,
    deterministic: Deterministic,
) -> Result<OlsFit, StatsError> {
    let rows: Vec<usize> = (sample_lag..diffs.len()).collect();
    let ncols = 1 + lags + deterministic.columns();

    let y: Vec<f64> = rows.iter().map(|&t| diffs[t]).collect();
    let x = DMatrix::from_fn(rows.len(), ncols, |r, c| {
        let t = rows[r];
        if c == 0 {
            levels[t]
        } else if c <= lags {
            diffs[t - c]
        } else {
            1.0
        }
    });

    ols(&y, &x)
}
