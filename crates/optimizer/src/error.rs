use indicatif::style::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Backtest execution failed within optimizer: {0}")]
    Backtest(#[from] backtester::BacktestError),

    #[error("Strategy error while preparing the sweep: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Parameter generation failed: {0}")]
    ParameterGeneration(String),

    #[error("The parameter grid contains no valid combination")]
    EmptyGrid,

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for OptimizerError {
    fn from(error: TemplateError) -> Self {
        OptimizerError::ProgressBarTemplate(error.to_string())
    }
}
