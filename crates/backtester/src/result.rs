use core_types::{Signal, TimeSeries, Timestamp};
use serde::Serialize;

/// Dollar exposure of each leg at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LegPositions {
    pub a: f64,
    pub b: f64,
}

/// A change of the signal between two consecutive periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trade {
    pub timestamp: Timestamp,
    pub from: Signal,
    pub to: Signal,
    /// Fraction of capital charged for this change.
    pub cost: f64,
}

/// Everything produced by one simulation run.
///
/// `equity_curve`, `signals` and `positions` share one index; `returns` is
/// the same index without its first timestamp, so the equity curve is always
/// exactly one point longer than the returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub hedge_ratio: f64,
    pub equity_curve: TimeSeries<f64>,
    pub returns: TimeSeries<f64>,
    pub signals: TimeSeries<Signal>,
    pub positions: TimeSeries<LegPositions>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |(_, equity)| *equity)
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn trade_timestamps(&self) -> Vec<Timestamp> {
        self.trades.iter().map(|t| t.timestamp).collect()
    }
}
