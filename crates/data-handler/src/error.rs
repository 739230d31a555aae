use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("The price table has no price columns")]
    NoPriceColumns,

    #[error("Column '{0}' not found in the price table")]
    MissingColumn(String),

    #[error("Line {line}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("Line {line}: cannot parse price '{value}' in column '{column}'")]
    InvalidPrice { line: u64, column: String, value: String },

    #[error("Line {line}: timestamp {timestamp} does not follow the previous row")]
    NonIncreasingTimestamp { line: u64, timestamp: String },

    #[error("Invalid series: {0}")]
    Series(#[from] CoreError),
}
