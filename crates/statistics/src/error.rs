use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data: at least {required} aligned observations required, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Series lengths differ: {0} vs {1}")]
    LengthMismatch(usize, usize),

    #[error("Unsupported number of integrated variables for p-value lookup: {0}")]
    UnsupportedVariables(usize),

    #[error("Distribution error: {0}")]
    Distribution(String),
}
