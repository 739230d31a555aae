//! # Pairs Analytics Engine
//!
//! This crate turns a backtest's per-period return series into summary
//! performance statistics. It acts as the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No knowledge of strategies, prices or I/O; the input is a
//!   plain slice of returns.
//! - **Stateless Calculation:** The `AnalyticsEngine` takes returns as input and
//!   produces a `PerformanceReport` as output.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The calculator.
//! - `PerformanceReport`: The metrics record.
//! - `drawdown_series`: Per-period drawdown of compounded returns.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{AnalyticsEngine, PERIODS_PER_YEAR, drawdown_series};
pub use error::AnalyticsError;
pub use report::PerformanceReport;
