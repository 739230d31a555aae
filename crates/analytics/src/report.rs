use serde::Serialize;

/// Summary risk/return statistics of a per-period return series.
///
/// Ratios that would divide by zero take a defined limiting value instead of NaN:
/// Sharpe and Calmar are `0`, the profit factor is `+inf` (exported to JSON as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    // I. Return
    pub total_return: f64,
    pub annual_return: f64,

    // II. Risk and Drawdown
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline of the compounded returns, as a non-positive fraction.
    pub max_drawdown: f64,
    pub calmar_ratio: f64,

    // III. Period-Level Statistics
    pub periods: usize,
    pub winning_periods: usize,
    pub losing_periods: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out report for `periods` returns.
    pub fn new(periods: usize) -> Self {
        Self {
            total_return: 0.0,
            annual_return: 0.0,
            annual_volatility: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            calmar_ratio: 0.0,
            periods,
            winning_periods: 0,
            losing_periods: 0,
            win_rate: 0.0,
            profit_factor: f64::INFINITY,
        }
    }

    /// Profit factor as a finite number, or `None` when no period lost money.
    pub fn finite_profit_factor(&self) -> Option<f64> {
        self.profit_factor.is_finite().then_some(self.profit_factor)
    }
}
