//! # Pairs Strategy Library
//!
//! This crate contains the trading logic of the pairs system: it turns two
//! price series and a hedge ratio into a spread, normalizes the spread with a
//! rolling z-score, and runs the entry/exit state machine over it.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no simulation. It depends only on `core-types`,
//!   `configuration` and `statistics`.
//! - **Sequential Signals:** Each signal depends on the previous one, so the
//!   state machine is a fold over the z-score sequence, never a pointwise map.
//!
//! ## Public API
//!
//! - `PairsStrategy`: the facade used by the backtester and the optimizer.
//! - `calculate_spread`, `rolling_zscore`, `SignalGenerator`: the individual stages.
//! - `transition`: the pure state-machine step.

pub mod error;
pub mod pairs;
pub mod signal;
pub mod spread;
pub mod zscore;

pub use error::StrategyError;
pub use pairs::{PairsStrategy, StrategyOutput};
pub use signal::{SignalGenerator, SignalSummary, transition};
pub use spread::{SpreadSummary, calculate_spread, spread_of_pair};
pub use zscore::{rolling_zscore, rolling_zscore_values};
