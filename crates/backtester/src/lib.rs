//! # Pairs Backtester
//!
//! Simulates the long/short spread position implied by a signal path and
//! wires the whole pair-evaluation pipeline together.
//!
//! ## Public API
//!
//! - `Backtester`: the leak-free simulator (positions lag returns by one period).
//! - `Pipeline`: cointegration test through performance metrics in one call.
//! - `BacktestResult` / `PipelineReport`: immutable run artefacts.

pub mod error;
pub mod pipeline;
pub mod result;
pub mod simulator;

pub use error::BacktestError;
pub use pipeline::{Pipeline, PipelineReport, backtest_signals};
pub use result::{BacktestResult, LegPositions, Trade};
pub use simulator::Backtester;
