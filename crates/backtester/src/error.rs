use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Strategy execution error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Invalid backtest parameter: {0}")]
    InvalidParameter(String),

    #[error("Backtest needs at least {required} aligned periods, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Historical data for the requested range is incomplete or missing.")]
    DataUnavailable,
}
