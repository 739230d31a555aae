use crate::error::BacktestError;
use crate::result::BacktestResult;
use crate::simulator::Backtester;
use analytics::{AnalyticsEngine, PerformanceReport};
use configuration::{BacktestParams, Config, StrategyParams};
use core_types::{AlignedPair, PriceSeries, Signal, TimeSeries, ZScore, align};
use serde::Serialize;
use statistics::CointegrationResult;
use strategies::{PairsStrategy, SignalSummary, SpreadSummary};
use tracing::{info, warn};

/// Every artefact of one end-to-end run, for reporting and plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// The strategy settings of the run; its thresholds are the plotted z-score bands.
    pub strategy: StrategyParams,
    pub prices: AlignedPair,
    pub cointegration: CointegrationResult,
    pub hedge_ratio: f64,
    pub spread: TimeSeries<f64>,
    pub spread_summary: SpreadSummary,
    pub zscores: TimeSeries<ZScore>,
    pub signals: TimeSeries<Signal>,
    pub signal_summary: SignalSummary,
    pub backtest: BacktestResult,
    pub metrics: PerformanceReport,
}

/// Sequences cointegration test, hedge ratio, spread, z-score, signals,
/// simulation and metrics for one pair.
#[derive(Debug, Clone)]
pub struct Pipeline {
    strategy: PairsStrategy,
    backtester: Backtester,
    analytics: AnalyticsEngine,
}

impl Pipeline {
    pub fn new(strategy: StrategyParams, backtest: BacktestParams) -> Self {
        Self {
            strategy: PairsStrategy::new(strategy),
            backtester: Backtester::new(backtest),
            analytics: AnalyticsEngine::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.strategy.clone(), config.backtest.clone())
    }

    pub fn strategy(&self) -> &PairsStrategy {
        &self.strategy
    }

    pub fn backtester(&self) -> &Backtester {
        &self.backtester
    }

    /// Runs the full pipeline.
    ///
    /// The cointegration verdict is informational: a pair that fails the test is
    /// still traded, with a warning.
    pub fn run(&self, a: &PriceSeries, b: &PriceSeries) -> Result<PipelineReport, BacktestError> {
        let prices = align(a, b);
        if prices.is_empty() {
            return Err(BacktestError::DataUnavailable);
        }

        let cointegration = self.strategy.test_cointegration(a, b)?;
        if !cointegration.is_cointegrated {
            warn!(
                p_value = cointegration.p_value,
                significance = self.strategy.params().significance_level(),
                "Pair is not cointegrated; trading it anyway"
            );
        }

        let output = self.strategy.evaluate_with_ratio(&prices, cointegration.hedge_ratio);
        let (backtest, metrics) = backtest_signals(
            &self.backtester,
            &self.analytics,
            a,
            b,
            &output.signals,
            output.hedge_ratio,
        )?;

        info!(
            hedge_ratio = output.hedge_ratio,
            trades = backtest.trade_count(),
            total_return = metrics.total_return,
            sharpe = metrics.sharpe_ratio,
            "Pipeline run complete"
        );

        Ok(PipelineReport {
            strategy: self.strategy.params().clone(),
            spread_summary: output.spread_summary(),
            signal_summary: output.signal_summary(),
            hedge_ratio: output.hedge_ratio,
            prices,
            cointegration,
            spread: output.spread,
            zscores: output.zscores,
            signals: output.signals,
            backtest,
            metrics,
        })
    }
}

/// Simulates a signal path and evaluates its returns.
///
/// Shared by the pipeline and the parameter sweep, which reuses one spread
/// across many signal paths.
pub fn backtest_signals(
    backtester: &Backtester,
    analytics: &AnalyticsEngine,
    a: &PriceSeries,
    b: &PriceSeries,
    signals: &TimeSeries<Signal>,
    hedge_ratio: f64,
) -> Result<(BacktestResult, PerformanceReport), BacktestError> {
    let backtest = backtester.run(a, b, signals, hedge_ratio)?;
    let metrics = analytics.calculate(&backtest.returns.to_values())?;
    Ok((backtest, metrics))
}
