//! # Price Data Handler
//!
//! Loads historical prices from local CSV tables into `PriceSeries`,
//! restricted to the window of a validated `DataRequest`. Fetching from a
//! remote vendor is left to whatever tool produced the CSV.
//!
//! ## Public API
//!
//! - `load_pair`: the two legs of a pair from one table.
//! - `load_price_table` / `read_price_table`: every price column of a table.
//! - `DataError`: I/O, CSV and content errors.

pub mod error;
pub mod loader;

pub use error::DataError;
pub use loader::{PriceColumn, PriceTable, load_pair, load_price_table, read_price_table};
