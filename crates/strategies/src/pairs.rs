use crate::error::StrategyError;
use crate::signal::{SignalGenerator, SignalSummary};
use crate::spread::{SpreadSummary, spread_of_pair};
use crate::zscore::rolling_zscore;
use configuration::StrategyParams;
use core_types::{AlignedPair, PriceSeries, Signal, TimeSeries, ZScore, align};
use statistics::{CointegrationResult, CointegrationTester, fit_pair};
use tracing::info;

/// Everything the strategy derives from one pair of price series.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutput {
    pub hedge_ratio: f64,
    pub spread: TimeSeries<f64>,
    pub zscores: TimeSeries<ZScore>,
    pub signals: TimeSeries<Signal>,
}

impl StrategyOutput {
    pub fn spread_summary(&self) -> SpreadSummary {
        SpreadSummary::from_spread(&self.spread)
    }

    pub fn signal_summary(&self) -> SignalSummary {
        SignalSummary::new(&self.zscores.to_values(), &self.signals.to_values())
    }
}

/// The z-score pairs trading strategy.
///
/// Holds only its immutable parameters; every method is a pure function of its
/// inputs, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct PairsStrategy {
    params: StrategyParams,
}

impl PairsStrategy {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Engle-Granger test at the configured significance level.
    pub fn test_cointegration(
        &self,
        a: &PriceSeries,
        b: &PriceSeries,
    ) -> Result<CointegrationResult, StrategyError> {
        Ok(CointegrationTester::from_params(&self.params).test(a, b)?)
    }

    /// Estimates the hedge ratio and derives spread, z-scores and signals.
    pub fn evaluate(&self, a: &PriceSeries, b: &PriceSeries) -> Result<StrategyOutput, StrategyError> {
        let pair = align(a, b);
        if pair.is_empty() {
            return Err(StrategyError::NoOverlap);
        }
        let hedge_ratio = fit_pair(&pair)?.slope;
        Ok(self.evaluate_with_ratio(&pair, hedge_ratio))
    }

    /// Derives spread, z-scores and signals for a given hedge ratio.
    pub fn evaluate_with_ratio(&self, pair: &AlignedPair, hedge_ratio: f64) -> StrategyOutput {
        let spread = spread_of_pair(pair, hedge_ratio);
        let (zscores, signals) = self.signals_for_spread(&spread);

        info!(
            hedge_ratio,
            periods = spread.len(),
            lookback = self.params.lookback_period(),
            "Strategy signals generated"
        );

        StrategyOutput {
            hedge_ratio,
            spread,
            zscores,
            signals,
        }
    }

    /// Normalizes a precomputed spread and runs the signal state machine over it.
    pub fn signals_for_spread(
        &self,
        spread: &TimeSeries<f64>,
    ) -> (TimeSeries<ZScore>, TimeSeries<Signal>) {
        let zscores = rolling_zscore(spread, self.params.lookback_period());
        let signals = SignalGenerator::new(&self.params).generate(&zscores);
        (zscores, signals)
    }
}
