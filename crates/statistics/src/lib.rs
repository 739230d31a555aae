//! # Statistical tests for pairs selection
//!
//! Pure numeric routines with no knowledge of trading: least squares, the
//! Augmented Dickey-Fuller unit-root test, MacKinnon p-values, and the
//! Engle-Granger two-step cointegration test built from them.
//!
//! ## Public API
//!
//! - `CointegrationTester` / `CointegrationResult`: the Engle-Granger test.
//! - `estimate_hedge_ratio`: the OLS slope of B on A over aligned prices.
//! - `adf_test`: a standalone ADF test (constant term, AIC lag selection).
//! - `StatsError`: insufficient or degenerate input.

pub mod adf;
pub mod cointegration;
pub mod error;
pub mod hedge_ratio;
pub mod mackinnon;
pub mod ols;

pub use adf::{AdfResult, adf_test};
pub use cointegration::{CointegrationResult, CointegrationTester};
pub use error::StatsError;
pub use hedge_ratio::{estimate_hedge_ratio, fit_pair};
pub use mackinnon::mackinnon_p_value;
pub use ols::{LinearFit, OlsFit, linear_regression, ols};
