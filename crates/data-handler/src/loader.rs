use crate::error::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use configuration::DataRequest;
use core_types::{PriceSeries, TimeSeries, Timestamp};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Cell contents treated as a missing observation rather than a parse error.
const MISSING_MARKERS: [&str; 4] = ["", "nan", "null", "na"];

/// Price columns of one CSV table, each as its own series.
///
/// A column's series omits the rows where that column was missing, so two
/// columns of the same table may have different lengths.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    columns: Vec<PriceColumn>,
    rows: usize,
}

/// One named price column.
#[derive(Debug, Clone)]
pub struct PriceColumn {
    pub name: String,
    pub series: PriceSeries,
    /// Rows inside the requested window where the cell was missing.
    pub missing: usize,
}

impl PriceTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    /// Data rows kept after date filtering.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn series(&self, name: &str) -> Result<&PriceSeries, DataError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.series)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }
}

/// Opens and parses a CSV price table. See [`read_price_table`].
pub fn load_price_table(
    path: impl AsRef<Path>,
    request: Option<&DataRequest>,
) -> Result<PriceTable, DataError> {
    let path = path.as_ref();
    let table = read_price_table(File::open(path)?, request)?;
    info!(
        path = %path.display(),
        rows = table.rows(),
        columns = ?table.column_names(),
        "Price table loaded"
    );
    Ok(table)
}

/// Loads the two named columns of a CSV price table as the A and B legs of a pair.
pub fn load_pair(
    path: impl AsRef<Path>,
    column_a: &str,
    column_b: &str,
    request: Option<&DataRequest>,
) -> Result<(PriceSeries, PriceSeries), DataError> {
    let table = load_price_table(path, request)?;
    let a = table.series(column_a)?.clone();
    let b = table.series(column_b)?.clone();
    Ok((a, b))
}

/// Parses a price table.
///
/// The first column holds timestamps (RFC 3339, `YYYY-MM-DD` or
/// `YYYY-MM-DD HH:MM:SS`, read as UTC); every other column is a named price
/// column. Blank, `NaN`, `NA` and `null` cells are missing observations. Rows
/// whose date falls outside `request` are skipped. Timestamps must strictly
/// increase down the file.
pub fn read_price_table<R: Read>(
    reader: R,
    request: Option<&DataRequest>,
) -> Result<PriceTable, DataError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.len() < 2 {
        return Err(DataError::NoPriceColumns);
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut points: Vec<Vec<(Timestamp, f64)>> = vec![Vec::new(); names.len()];
    let mut missing = vec![0usize; names.len()];
    let mut previous: Option<Timestamp> = None;
    let mut rows = 0;
    let mut skipped = 0;

    for record in csv.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_ts = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DataError::InvalidTimestamp {
            line,
            value: raw_ts.to_string(),
        })?;

        if previous.is_some_and(|p| timestamp <= p) {
            return Err(DataError::NonIncreasingTimestamp {
                line,
                timestamp: timestamp.to_rfc3339(),
            });
        }
        previous = Some(timestamp);

        if request.is_some_and(|r| !r.contains(timestamp.date_naive())) {
            skipped += 1;
            continue;
        }
        rows += 1;

        for (column, name) in names.iter().enumerate() {
            let cell = record.get(column + 1).unwrap_or_default();
            match parse_price(cell) {
                Ok(Some(price)) => points[column].push((timestamp, price)),
                Ok(None) => missing[column] += 1,
                Err(()) => {
                    return Err(DataError::InvalidPrice {
                        line,
                        column: name.clone(),
                        value: cell.to_string(),
                    });
                }
            }
        }
    }

    debug!(rows, skipped, "Price rows parsed");

    let columns = names
        .into_iter()
        .zip(points)
        .zip(missing)
        .map(|((name, points), missing)| {
            Ok(PriceColumn {
                name,
                series: TimeSeries::new(points)?,
                missing,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(PriceTable { columns, rows })
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// `Ok(None)` for a missing cell, `Err` for anything else that is not a finite number.
fn parse_price(raw: &str) -> Result<Option<f64>, ()> {
    if MISSING_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(Some(price)),
        _ => Err(()),
    }
}
