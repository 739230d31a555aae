use crate::series::Timestamp;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Timestamps must be strictly increasing: point {index} at {timestamp} does not follow its predecessor")]
    NonMonotonicTimestamps { index: usize, timestamp: Timestamp },
}
