use crate::error::AnalyticsError;
use crate::report::PerformanceReport;
use tracing::debug;

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// A stateless calculator for deriving performance metrics from a return series.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine {
    periods_per_year: f64,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            periods_per_year: PERIODS_PER_YEAR,
        }
    }
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annualizes with a different period count, e.g. 52 for weekly data.
    pub fn with_periods_per_year(periods_per_year: f64) -> Self {
        Self { periods_per_year }
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `returns` - Per-period simple portfolio returns, in chronological order.
    ///
    /// # Returns
    ///
    /// The `PerformanceReport`, or `NotEnoughData` for an empty series.
    pub fn calculate(&self, returns: &[f64]) -> Result<PerformanceReport, AnalyticsError> {
        if returns.is_empty() {
            return Err(AnalyticsError::NotEnoughData(
                "at least one return is required".to_string(),
            ));
        }
        if let Some(index) = returns.iter().position(|r| !r.is_finite()) {
            return Err(AnalyticsError::NonFiniteReturn(index));
        }

        let mut report = PerformanceReport::new(returns.len());

        self.calculate_returns(returns, &mut report);
        self.calculate_risk(returns, &mut report);
        self.calculate_period_stats(returns, &mut report);
        self.calculate_ratios(&mut report);

        debug!(
            periods = report.periods,
            total_return = report.total_return,
            sharpe = report.sharpe_ratio,
            max_drawdown = report.max_drawdown,
            "Performance metrics calculated"
        );
        Ok(report)
    }

    fn calculate_returns(&self, returns: &[f64], report: &mut PerformanceReport) {
        let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
        report.total_return = growth - 1.0;

        // A wiped-out account cannot be annualized with a fractional power.
        report.annual_return = if growth <= 0.0 {
            -1.0
        } else {
            growth.powf(self.periods_per_year / returns.len() as f64) - 1.0
        };
    }

    fn calculate_risk(&self, returns: &[f64], report: &mut PerformanceReport) {
        report.annual_volatility = sample_std(returns) * self.periods_per_year.sqrt();
        report.max_drawdown = drawdown_series(returns)
            .into_iter()
            .fold(0.0, f64::min);
    }

    fn calculate_period_stats(&self, returns: &[f64], report: &mut PerformanceReport) {
        let mut gross_profit = 0.0;
        let mut gross_loss = 0.0;

        for r in returns {
            if *r > 0.0 {
                gross_profit += r;
                report.winning_periods += 1;
            } else if *r < 0.0 {
                gross_loss += r;
                report.losing_periods += 1;
            }
        }

        report.win_rate = report.winning_periods as f64 / returns.len() as f64;
        report.profit_factor = if report.losing_periods == 0 {
            f64::INFINITY
        } else {
            gross_profit / gross_loss.abs()
        };
    }

    fn calculate_ratios(&self, report: &mut PerformanceReport) {
        report.sharpe_ratio = if report.annual_volatility == 0.0 {
            0.0
        } else {
            report.annual_return / report.annual_volatility
        };

        report.calmar_ratio = if report.max_drawdown == 0.0 {
            0.0
        } else {
            report.annual_return / report.max_drawdown.abs()
        };
    }
}

/// Sample standard deviation (n - 1); zero for fewer than two values or a constant series.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Drawdown of the compounded returns at every period, as non-positive fractions.
///
/// The running peak is taken over the compounded values themselves, so the
/// first period never shows a drawdown.
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    let mut peak = f64::NEG_INFINITY;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            peak = peak.max(growth);
            (growth - peak) / peak
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_series_is_not_enough_data() {
        assert!(matches!(
            AnalyticsEngine::new().calculate(&[]),
            Err(AnalyticsError::NotEnoughData(_))
        ));
    }

    #[test]
    fn nan_return_is_rejected() {
        assert_eq!(
            AnalyticsEngine::new().calculate(&[0.01, f64::NAN]),
            Err(AnalyticsError::NonFiniteReturn(1))
        );
    }

    #[test]
    fn zero_variance_gives_zero_sharpe() {
        let report = AnalyticsEngine::new().calculate(&[0.001; 10]).unwrap();
        assert_eq!(report.annual_volatility, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.calmar_ratio, 0.0);
    }

    #[test]
    fn no_losses_gives_infinite_profit_factor() {
        let report = AnalyticsEngine::new().calculate(&[0.01, 0.0, 0.02]).unwrap();
        assert_eq!(report.profit_factor, f64::INFINITY);
        assert_eq!(report.finite_profit_factor(), None);
    }

    #[test]
    fn infinite_profit_factor_exports_as_null() {
        let report = AnalyticsEngine::new().calculate(&[0.01]).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["profit_factor"].is_null());
    }

    #[test]
    fn known_series() {
        let returns = [0.10, -0.05, 0.02, -0.01];
        let report = AnalyticsEngine::new().calculate(&returns).unwrap();

        let growth = 1.10 * 0.95 * 1.02 * 0.99;
        assert!(approx(report.total_return, growth - 1.0));
        assert!(approx(report.annual_return, growth.powf(252.0 / 4.0) - 1.0));

        // Peak 1.10, trough 1.10 * 0.95.
        assert!(approx(report.max_drawdown, -0.05));
        assert_eq!(report.winning_periods, 2);
        assert_eq!(report.losing_periods, 2);
        assert!(approx(report.win_rate, 0.5));
        assert!(approx(report.profit_factor, 0.12 / 0.06));
        assert!(report.finite_profit_factor().is_some());
        assert!(approx(report.calmar_ratio, report.annual_return / report.max_drawdown.abs()));
    }

    #[test]
    fn single_return_has_zero_volatility() {
        let report = AnalyticsEngine::new().calculate(&[0.05]).unwrap();
        assert_eq!(report.annual_volatility, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
    }

    #[test]
    fn wiped_out_account_annualizes_to_minus_one() {
        let report = AnalyticsEngine::new().calculate(&[0.5, -1.2]).unwrap();
        assert_eq!(report.annual_return, -1.0);
    }

    #[test]
    fn drawdown_ignores_initial_capital_as_peak() {
        // A first-period loss is not a drawdown: the peak starts at the first value.
        let dd = drawdown_series(&[-0.10, 0.05, -0.20]);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!(approx(dd[2], -0.20));
    }

    #[test]
    fn custom_annualization() {
        let weekly = AnalyticsEngine::with_periods_per_year(52.0).calculate(&[0.01, 0.02]).unwrap();
        assert!(approx(weekly.annual_return, (1.01f64 * 1.02).powf(26.0) - 1.0));
    }
}
