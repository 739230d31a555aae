use statistics::StatsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Price series share no usable timestamps")]
    NoOverlap,

    #[error("Statistics error: {0}")]
    Statistics(#[from] StatsError),
}
