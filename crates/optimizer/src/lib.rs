//! # Parameter Sweep
//!
//! Backtests every combination of a `SweepConfig` grid in parallel and ranks
//! the survivors. The hedge ratio and spread are computed once and shared by
//! every run; only the z-score window and thresholds vary.

use analytics::{AnalyticsEngine, PerformanceReport};
use backtester::{Backtester, backtest_signals};
use configuration::{BacktestParams, Filters, StrategyParams, SweepConfig};
use core_types::PriceSeries;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use strategies::PairsStrategy;
use tracing::{info, warn};

pub mod error;
pub mod generator;

pub use error::OptimizerError;
pub use generator::{expand_range, generate_parameter_sets};

/// The outcome of one parameter combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRun {
    pub lookback_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub trades: usize,
    pub metrics: PerformanceReport,
}

/// All ranked runs of a sweep plus bookkeeping counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub hedge_ratio: f64,
    pub evaluated: usize,
    pub failed: usize,
    /// Runs removed by the filters.
    pub rejected: usize,
    /// Best first: Sharpe ratio descending, then Calmar ratio descending.
    pub ranked: Vec<SweepRun>,
}

impl SweepReport {
    pub fn best(&self) -> Option<&SweepRun> {
        self.ranked.first()
    }
}

pub struct Optimizer {
    config: SweepConfig,
    base_strategy: StrategyParams,
    backtest: BacktestParams,
    show_progress: bool,
}

impl Optimizer {
    pub fn new(config: SweepConfig, base_strategy: StrategyParams, backtest: BacktestParams) -> Self {
        Self {
            config,
            base_strategy,
            backtest,
            show_progress: false,
        }
    }

    /// Draws a progress bar on stderr while the sweep runs.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn run(&self, a: &PriceSeries, b: &PriceSeries) -> Result<SweepReport, OptimizerError> {
        let param_sets = generate_parameter_sets(&self.config, &self.base_strategy)?;
        if param_sets.is_empty() {
            return Err(OptimizerError::EmptyGrid);
        }

        // The hedge ratio and spread do not depend on the swept parameters.
        let shared = PairsStrategy::new(self.base_strategy.clone()).evaluate(a, b)?;
        let hedge_ratio = shared.hedge_ratio;

        info!(
            runs = param_sets.len(),
            threads = rayon::current_num_threads(),
            hedge_ratio,
            "Starting parameter sweep"
        );

        let progress_bar = self.progress_bar(param_sets.len())?;
        let backtester = Backtester::new(self.backtest.clone());
        let analytics = AnalyticsEngine::new();

        let outcomes: Vec<Result<SweepRun, OptimizerError>> = param_sets
            .par_iter()
            .map(|params| {
                let strategy = PairsStrategy::new(params.clone());
                let (_, signals) = strategy.signals_for_spread(&shared.spread);
                let outcome = backtest_signals(&backtester, &analytics, a, b, &signals, hedge_ratio)
                    .map(|(backtest, metrics)| SweepRun {
                        lookback_period: params.lookback_period(),
                        entry_threshold: params.entry_threshold(),
                        exit_threshold: params.exit_threshold(),
                        trades: backtest.trade_count(),
                        metrics,
                    })
                    .map_err(OptimizerError::from);
                progress_bar.inc(1);
                outcome
            })
            .collect();

        progress_bar.finish_with_message("Sweep complete.");

        let evaluated = outcomes.len();
        let mut runs = Vec::with_capacity(evaluated);
        let mut failed = 0;
        for outcome in outcomes {
            match outcome {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!(error = %e, "A sweep run failed");
                    failed += 1;
                }
            }
        }

        let before_filter = runs.len();
        let mut ranked = filter_runs(runs, &self.config.filters);
        let rejected = before_filter - ranked.len();
        rank_runs(&mut ranked);

        info!(evaluated, failed, rejected, kept = ranked.len(), "Parameter sweep finished");

        Ok(SweepReport {
            hedge_ratio,
            evaluated,
            failed,
            rejected,
            ranked,
        })
    }

    fn progress_bar(&self, len: usize) -> Result<ProgressBar, OptimizerError> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let progress_bar = ProgressBar::new(len as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );
        Ok(progress_bar)
    }
}

/// Applies hard filters to remove unacceptable runs.
fn filter_runs(runs: Vec<SweepRun>, filters: &Filters) -> Vec<SweepRun> {
    runs.into_iter()
        .filter(|r| {
            let passes_trades = r.trades >= filters.min_trades;
            let passes_drawdown = r.metrics.max_drawdown.abs() <= filters.max_drawdown;
            passes_trades && passes_drawdown
        })
        .collect()
}

/// Sorts best first. The sort is stable, so exact ties keep grid order.
fn rank_runs(runs: &mut [SweepRun]) {
    runs.sort_by(|a, b| {
        b.metrics
            .sharpe_ratio
            .total_cmp(&a.metrics.sharpe_ratio)
            .then_with(|| b.metrics.calmar_ratio.total_cmp(&a.metrics.calmar_ratio))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(lookback: usize, sharpe: f64, calmar: f64, trades: usize, drawdown: f64) -> SweepRun {
        let mut metrics = PerformanceReport::new(10);
        metrics.sharpe_ratio = sharpe;
        metrics.calmar_ratio = calmar;
        metrics.max_drawdown = drawdown;
        SweepRun {
            lookback_period: lookback,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            trades,
            metrics,
        }
    }

    #[test]
    fn ranking_uses_sharpe_then_calmar() {
        let mut runs = vec![
            run(20, 0.5, 1.0, 4, -0.1),
            run(30, 1.2, 0.2, 4, -0.1),
            run(40, 1.2, 0.9, 4, -0.1),
            run(50, -0.3, 5.0, 4, -0.1),
        ];
        rank_runs(&mut runs);
        let order: Vec<usize> = runs.iter().map(|r| r.lookback_period).collect();
        assert_eq!(order, vec![40, 30, 20, 50]);
    }

    #[test]
    fn filters_drop_inactive_and_deep_drawdown_runs() {
        let filters = Filters {
            min_trades: 2,
            max_drawdown: 0.25,
        };
        let runs = vec![
            run(20, 1.0, 1.0, 1, -0.1),
            run(30, 1.0, 1.0, 3, -0.3),
            run(40, 1.0, 1.0, 3, -0.25),
        ];
        let kept = filter_runs(runs, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].lookback_period, 40);
    }
}
