use crate::error::BacktestError;
use crate::result::{BacktestResult, LegPositions, Trade};
use configuration::BacktestParams;
use core_types::{PriceSeries, Signal, TimeSeries, Timestamp, intersect};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

/// The pairs backtest simulator.
///
/// Positions are sized from the signal of the previous period, so a period's
/// return is always earned by a position decided before it started.
#[derive(Debug, Clone)]
pub struct Backtester {
    params: BacktestParams,
}

/// One row of the joined signal/return table.
struct Period {
    timestamp: Timestamp,
    signal: Signal,
    return_a: f64,
    return_b: f64,
}

impl Backtester {
    pub fn new(params: BacktestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BacktestParams {
        &self.params
    }

    /// Simulates the long/short spread position implied by `signals`.
    ///
    /// Returns of each leg are computed on that leg's own index, then joined
    /// with the signals on common timestamps; rows without a finite return on
    /// both legs are dropped. At least two joined rows are required.
    pub fn run(
        &self,
        prices_a: &PriceSeries,
        prices_b: &PriceSeries,
        signals: &TimeSeries<Signal>,
        hedge_ratio: f64,
    ) -> Result<BacktestResult, BacktestError> {
        let capital = to_f64(self.params.initial_capital(), "initial_capital")?;
        let cost_rate = to_f64(self.params.transaction_cost(), "transaction_cost")?;
        let max_position = to_f64(self.params.max_position_size(), "max_position_size")?;
        if !hedge_ratio.is_finite() {
            return Err(BacktestError::InvalidParameter(format!(
                "hedge ratio must be finite, got {hedge_ratio}"
            )));
        }

        let periods = join_periods(prices_a, prices_b, signals);
        if periods.len() < 2 {
            return Err(BacktestError::InsufficientData {
                required: 2,
                actual: periods.len(),
            });
        }

        let notional = capital * max_position;
        let positions: Vec<LegPositions> = periods
            .iter()
            .map(|p| LegPositions {
                a: -p.signal.as_f64() * notional,
                b: p.signal.as_f64() * notional * hedge_ratio,
            })
            .collect();

        let mut equity = Vec::with_capacity(periods.len());
        let mut returns = Vec::with_capacity(periods.len() - 1);
        let mut trades = Vec::new();
        let mut value = capital;
        let mut wiped_out = false;
        equity.push(value);

        for k in 1..periods.len() {
            let (prev, cur) = (&periods[k - 1], &periods[k]);
            let held = positions[k - 1];

            let change = cur.signal.change_magnitude(prev.signal);
            let cost = cost_rate * f64::from(change);
            let r = (held.a * cur.return_a + held.b * cur.return_b) / capital - cost;

            if change > 0 {
                trades.push(Trade {
                    timestamp: cur.timestamp,
                    from: prev.signal,
                    to: cur.signal,
                    cost,
                });
            }

            value *= 1.0 + r;
            if value <= 0.0 && !wiped_out {
                warn!(timestamp = %cur.timestamp, equity = value, "Equity is no longer positive");
                wiped_out = true;
            }
            returns.push(r);
            equity.push(value);
        }

        debug!(
            periods = periods.len(),
            trades = trades.len(),
            final_equity = value,
            "Backtest simulation complete"
        );

        let index: Vec<Timestamp> = periods.iter().map(|p| p.timestamp).collect();
        Ok(BacktestResult {
            initial_capital: capital,
            hedge_ratio,
            equity_curve: TimeSeries::with_index(&index, equity),
            returns: TimeSeries::with_index(&index[1..], returns),
            signals: TimeSeries::with_index(&index, periods.iter().map(|p| p.signal).collect()),
            positions: TimeSeries::with_index(&index, positions),
            trades,
        })
    }
}

fn join_periods(a: &PriceSeries, b: &PriceSeries, signals: &TimeSeries<Signal>) -> Vec<Period> {
    let leg_returns = intersect(&a.pct_change(), &b.pct_change());
    intersect(signals, &leg_returns)
        .iter()
        .filter(|(_, (_, (ra, rb)))| ra.is_finite() && rb.is_finite())
        .map(|(timestamp, (signal, (ra, rb)))| Period {
            timestamp: *timestamp,
            signal: *signal,
            return_a: *ra,
            return_b: *rb,
        })
        .collect()
}

fn to_f64(value: Decimal, name: &str) -> Result<f64, BacktestError> {
    value
        .to_f64()
        .ok_or_else(|| BacktestError::InvalidParameter(format!("{name} ({value}) is not representable as f64")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn day(i: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap() + Duration::days(i)
    }

    fn prices(values: &[f64]) -> PriceSeries {
        TimeSeries::new(values.iter().enumerate().map(|(i, v)| (day(i as i64), *v)).collect()).unwrap()
    }

    fn signals(from_day: i64, values: &[Signal]) -> TimeSeries<Signal> {
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, s)| (day(from_day + i as i64), *s))
                .collect(),
        )
        .unwrap()
    }

    fn backtester(cost: Decimal) -> Backtester {
        Backtester::new(BacktestParams::new(dec!(1000), cost, dec!(0.5)).unwrap())
    }

    #[test]
    fn returns_are_earned_by_the_previous_position() {
        use Signal::*;
        let a = prices(&[100.0, 100.0, 110.0, 110.0]);
        let b = prices(&[50.0, 50.0, 50.0, 55.0]);
        // Rows start at day 1, the first day with defined returns.
        let s = signals(1, &[Long, Long, Flat]);

        let result = backtester(dec!(0)).run(&a, &b, &s, 2.0).unwrap();

        // Day 2: short A (-500) loses 10%; long B (+1000) flat. r = -0.05.
        // Day 3: still Long from day 2, B gains 10%: r = +0.10.
        let r = result.returns.to_values();
        assert!((r[0] + 0.05).abs() < 1e-12);
        assert!((r[1] - 0.10).abs() < 1e-12);
        assert!((result.final_equity() - 1000.0 * 0.95 * 1.10).abs() < 1e-9);
    }

    #[test]
    fn flip_costs_twice_an_entry() {
        use Signal::*;
        let a = prices(&[10.0; 5]);
        let b = prices(&[10.0; 5]);
        let s = signals(1, &[Flat, Long, Short, Short]);

        let result = backtester(dec!(0.01)).run(&a, &b, &s, 1.0).unwrap();

        assert_eq!(result.returns.to_values(), vec![-0.01, -0.02, 0.0]);
        assert_eq!(result.trade_count(), 2);
        assert_eq!(result.trades[1].from, Long);
        assert_eq!(result.trades[1].to, Short);
        assert_eq!(result.trade_timestamps(), vec![day(2), day(3)]);
    }

    #[test]
    fn leg_sizes_follow_signal_and_hedge() {
        let a = prices(&[10.0, 10.0, 10.0]);
        let b = prices(&[10.0, 10.0, 10.0]);
        let s = signals(1, &[Signal::Short, Signal::Short]);

        let result = backtester(dec!(0)).run(&a, &b, &s, 1.5).unwrap();
        let first = result.positions.first().unwrap().1;
        assert_eq!(first, LegPositions { a: 500.0, b: -750.0 });
    }

    #[test]
    fn equity_is_one_longer_than_returns() {
        let a = prices(&[1.0, 1.1, 1.2, 1.3, 1.4]);
        let b = prices(&[2.0, 2.1, 2.0, 2.2, 2.4]);
        let s = signals(0, &[Signal::Flat; 5]);

        let result = backtester(dec!(0.001)).run(&a, &b, &s, 1.0).unwrap();

        // Day 0 has no return and is dropped.
        assert_eq!(result.equity_curve.len(), 4);
        assert_eq!(result.returns.len(), 3);
        assert_eq!(result.equity_curve.first().unwrap().1, 1000.0);
        assert_eq!(result.returns.timestamps(), result.equity_curve.timestamps()[1..].to_vec());
    }

    #[test]
    fn single_joined_row_is_insufficient() {
        let a = prices(&[1.0, 1.1]);
        let b = prices(&[2.0, 2.1]);
        let s = signals(0, &[Signal::Flat, Signal::Flat]);

        let err = backtester(dec!(0)).run(&a, &b, &s, 1.0).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientData { required: 2, actual: 1 }));
    }

    #[test]
    fn non_finite_hedge_ratio_is_rejected() {
        let a = prices(&[1.0, 1.1, 1.2]);
        let s = signals(0, &[Signal::Flat; 3]);
        let err = backtester(dec!(0)).run(&a, &a, &s, f64::NAN).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidParameter(_)));
    }
}
