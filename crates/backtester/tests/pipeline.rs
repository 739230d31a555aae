use backtester::{BacktestError, Backtester, Pipeline};
use chrono::{Duration, TimeZone, Utc};
use configuration::{BacktestParams, StrategyParams};
use core_types::{PriceSeries, Signal, TimeSeries};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal_macros::dec;

fn to_series(values: &[f64]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
    TimeSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v))
            .collect(),
    )
    .unwrap()
}

/// A mean-reverting pair: B tracks 1.5 * A plus an AR(1) deviation.
fn cointegrated_pair(seed: u64, n: usize) -> (PriceSeries, PriceSeries) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut a = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    let (mut level, mut deviation) = (100.0, 0.0);
    for _ in 0..n {
        level += rng.gen_range(-1.0..1.0);
        deviation = 0.8 * deviation + rng.gen_range(-1.0..1.0);
        a.push(level);
        b.push(1.5 * level + 20.0 + deviation);
    }
    (to_series(&a), to_series(&b))
}

fn pipeline() -> Pipeline {
    Pipeline::new(
        StrategyParams::new(20, 2.0, 0.5).unwrap(),
        BacktestParams::new(dec!(100000), dec!(0.001), dec!(0.5)).unwrap(),
    )
}

#[test]
fn end_to_end_run_is_consistent() {
    let (a, b) = cointegrated_pair(5, 400);
    let report = pipeline().run(&a, &b).unwrap();

    assert!(report.cointegration.is_cointegrated);
    assert_eq!(report.hedge_ratio, report.cointegration.hedge_ratio);
    assert_eq!(report.spread.len(), 400);
    assert_eq!(report.signal_summary.defined_zscores, 400 - 19);
    assert_eq!(report.backtest.equity_curve.len(), report.backtest.returns.len() + 1);
    assert_eq!(report.metrics.periods, report.backtest.returns.len());
    assert!(report.backtest.trade_count() > 0);
    assert!(report.backtest.equity_curve.iter().all(|(_, v)| *v > 0.0));
}

#[test]
fn report_carries_strategy_thresholds() {
    let (a, b) = cointegrated_pair(11, 200);
    let pipeline = Pipeline::new(
        StrategyParams::new(30, 1.5, 0.25).unwrap(),
        BacktestParams::default(),
    );

    let report = pipeline.run(&a, &b).unwrap();
    assert_eq!(report.strategy.entry_threshold(), 1.5);
    assert_eq!(report.strategy.exit_threshold(), 0.25);
}

#[test]
fn running_twice_is_bit_identical() {
    let (a, b) = cointegrated_pair(17, 300);
    let first = pipeline().run(&a, &b).unwrap();
    let second = pipeline().run(&a, &b).unwrap();

    assert_eq!(first.backtest.equity_curve, second.backtest.equity_curve);
    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn all_flat_signals_keep_equity_constant() {
    let (a, b) = cointegrated_pair(8, 120);
    let flat = TimeSeries::with_index(&a.timestamps(), vec![Signal::Flat; a.len()]);

    let backtester = Backtester::new(BacktestParams::new(dec!(5000), dec!(0.01), dec!(1)).unwrap());
    let result = backtester.run(&a, &b, &flat, 1.5).unwrap();

    assert!(result.equity_curve.iter().all(|(_, v)| *v == 5000.0));
    assert!(result.trades.is_empty());
}

#[test]
fn disjoint_inputs_have_no_data() {
    let a = to_series(&[1.0, 2.0, 3.0]);
    let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let b = TimeSeries::new(vec![(start, 1.0)]).unwrap();

    assert!(matches!(pipeline().run(&a, &b), Err(BacktestError::DataUnavailable)));
}

#[test]
fn report_exports_to_json() {
    let (a, b) = cointegrated_pair(21, 150);
    let report = pipeline().run(&a, &b).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["zscores"]["points"][0][1].is_null());
    assert_eq!(json["backtest"]["equity_curve"]["points"].as_array().unwrap().len(), 149);
}
