use crate::error::ConfigError;
use crate::optimizer_config::SweepConfig;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Shortest rolling window accepted for z-score normalisation.
pub const MIN_LOOKBACK_PERIOD: usize = 20;

/// Fewest aligned observations on which a cointegration test is attempted.
pub const MIN_COINTEGRATION_OBSERVATIONS: usize = 3;

/// Longest span, in days, that an intraday data request may cover.
pub const MAX_INTRADAY_SPAN_DAYS: i64 = 60;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub backtest: BacktestParams,
    /// The historical window the price data should cover, if the run is tied to one.
    #[serde(default)]
    pub data: Option<DataRequest>,
    /// The parameter grid explored by the `sweep` command.
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

// ==============================================================================
// Strategy parameters
// ==============================================================================

/// Parameters of the z-score pairs strategy.
///
/// Immutable once built: every constructor (including deserialization) validates,
/// so holding a `StrategyParams` means holding a consistent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StrategyParamsSpec")]
pub struct StrategyParams {
    lookback_period: usize,
    entry_threshold: f64,
    exit_threshold: f64,
    significance_level: f64,
    min_observations: usize,
}

/// The unvalidated, on-disk shape of `StrategyParams`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct StrategyParamsSpec {
    lookback_period: usize,
    entry_threshold: f64,
    exit_threshold: f64,
    significance_level: f64,
    min_observations: usize,
}

impl Default for StrategyParamsSpec {
    fn default() -> Self {
        Self {
            lookback_period: 60,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            significance_level: 0.05,
            min_observations: MIN_COINTEGRATION_OBSERVATIONS,
        }
    }
}

impl TryFrom<StrategyParamsSpec> for StrategyParams {
    type Error = ConfigError;

    fn try_from(spec: StrategyParamsSpec) -> Result<Self, Self::Error> {
        validate_thresholds(spec.entry_threshold, spec.exit_threshold)?;

        if spec.lookback_period < MIN_LOOKBACK_PERIOD {
            return Err(ConfigError::ValidationError(format!(
                "Lookback period ({}) should be at least {} periods",
                spec.lookback_period, MIN_LOOKBACK_PERIOD
            )));
        }
        if !(spec.significance_level > 0.0 && spec.significance_level < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "Significance level ({}) must lie strictly between 0 and 1",
                spec.significance_level
            )));
        }
        if spec.min_observations < MIN_COINTEGRATION_OBSERVATIONS {
            return Err(ConfigError::ValidationError(format!(
                "Minimum observations ({}) must be at least {}",
                spec.min_observations, MIN_COINTEGRATION_OBSERVATIONS
            )));
        }

        Ok(Self {
            lookback_period: spec.lookback_period,
            entry_threshold: spec.entry_threshold,
            exit_threshold: spec.exit_threshold,
            significance_level: spec.significance_level,
            min_observations: spec.min_observations,
        })
    }
}

impl StrategyParams {
    /// Creates strategy parameters with the default significance level (5%)
    /// and minimum cointegration sample size.
    pub fn new(
        lookback_period: usize,
        entry_threshold: f64,
        exit_threshold: f64,
    ) -> Result<Self, ConfigError> {
        StrategyParamsSpec {
            lookback_period,
            entry_threshold,
            exit_threshold,
            ..StrategyParamsSpec::default()
        }
        .try_into()
    }

    pub fn with_significance_level(self, significance_level: f64) -> Result<Self, ConfigError> {
        StrategyParamsSpec {
            significance_level,
            ..self.spec()
        }
        .try_into()
    }

    pub fn with_min_observations(self, min_observations: usize) -> Result<Self, ConfigError> {
        StrategyParamsSpec {
            min_observations,
            ..self.spec()
        }
        .try_into()
    }

    pub fn lookback_period(&self) -> usize {
        self.lookback_period
    }

    pub fn entry_threshold(&self) -> f64 {
        self.entry_threshold
    }

    pub fn exit_threshold(&self) -> f64 {
        self.exit_threshold
    }

    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    fn spec(&self) -> StrategyParamsSpec {
        StrategyParamsSpec {
            lookback_period: self.lookback_period,
            entry_threshold: self.entry_threshold,
            exit_threshold: self.exit_threshold,
            significance_level: self.significance_level,
            min_observations: self.min_observations,
        }
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            lookback_period: 60,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            significance_level: 0.05,
            min_observations: MIN_COINTEGRATION_OBSERVATIONS,
        }
    }
}

fn validate_thresholds(entry_threshold: f64, exit_threshold: f64) -> Result<(), ConfigError> {
    if !entry_threshold.is_finite() || !exit_threshold.is_finite() {
        return Err(ConfigError::ValidationError(
            "Entry and exit thresholds must be finite numbers".to_string(),
        ));
    }
    if entry_threshold <= exit_threshold {
        return Err(ConfigError::ValidationError(format!(
            "Entry threshold ({}) must be > exit threshold ({})",
            entry_threshold, exit_threshold
        )));
    }
    Ok(())
}

// ==============================================================================
// Backtest parameters
// ==============================================================================

/// Contains parameters for the backtesting simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BacktestParamsSpec")]
pub struct BacktestParams {
    initial_capital: Decimal,
    transaction_cost: Decimal,
    max_position_size: Decimal,
}

/// Threshold bands belong to `[strategy]`; an unknown key here is an error
/// rather than a silently ignored setting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BacktestParamsSpec {
    /// The starting capital for the simulation.
    initial_capital: Decimal,
    /// Cost charged per unit of signal change, as a fraction (0.001 is 0.1%).
    transaction_cost: Decimal,
    /// The fraction of capital committed to each leg.
    max_position_size: Decimal,
}

impl Default for BacktestParamsSpec {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            transaction_cost: dec!(0.001),
            max_position_size: dec!(0.5),
        }
    }
}

impl TryFrom<BacktestParamsSpec> for BacktestParams {
    type Error = ConfigError;

    fn try_from(spec: BacktestParamsSpec) -> Result<Self, Self::Error> {
        if spec.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "Initial capital ({}) must be positive",
                spec.initial_capital
            )));
        }
        if spec.transaction_cost.is_sign_negative() {
            return Err(ConfigError::ValidationError(format!(
                "Transaction cost ({}) cannot be negative",
                spec.transaction_cost
            )));
        }
        if spec.max_position_size <= Decimal::ZERO || spec.max_position_size > Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "Max position size ({}) must be in (0, 1]",
                spec.max_position_size
            )));
        }
        Ok(Self {
            initial_capital: spec.initial_capital,
            transaction_cost: spec.transaction_cost,
            max_position_size: spec.max_position_size,
        })
    }
}

impl BacktestParams {
    pub fn new(
        initial_capital: Decimal,
        transaction_cost: Decimal,
        max_position_size: Decimal,
    ) -> Result<Self, ConfigError> {
        BacktestParamsSpec {
            initial_capital,
            transaction_cost,
            max_position_size,
        }
        .try_into()
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn transaction_cost(&self) -> Decimal {
        self.transaction_cost
    }

    pub fn max_position_size(&self) -> Decimal {
        self.max_position_size
    }
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            transaction_cost: dec!(0.001),
            max_position_size: dec!(0.5),
        }
    }
}

// ==============================================================================
// Data request
// ==============================================================================

/// A sampling interval understood by the price data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Interval {
    #[serde(rename = "1m")]
    #[cfg_attr(feature = "clap", value(name = "1m"))]
    OneMinute,
    #[serde(rename = "2m")]
    #[cfg_attr(feature = "clap", value(name = "2m"))]
    TwoMinutes,
    #[serde(rename = "5m")]
    #[cfg_attr(feature = "clap", value(name = "5m"))]
    FiveMinutes,
    #[serde(rename = "15m")]
    #[cfg_attr(feature = "clap", value(name = "15m"))]
    FifteenMinutes,
    #[serde(rename = "30m")]
    #[cfg_attr(feature = "clap", value(name = "30m"))]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    #[cfg_attr(feature = "clap", value(name = "60m"))]
    SixtyMinutes,
    #[serde(rename = "90m")]
    #[cfg_attr(feature = "clap", value(name = "90m"))]
    NinetyMinutes,
    #[serde(rename = "1h")]
    #[cfg_attr(feature = "clap", value(name = "1h"))]
    OneHour,
    #[serde(rename = "1d")]
    #[cfg_attr(feature = "clap", value(name = "1d"))]
    OneDay,
    #[serde(rename = "5d")]
    #[cfg_attr(feature = "clap", value(name = "5d"))]
    FiveDays,
    #[serde(rename = "1wk")]
    #[cfg_attr(feature = "clap", value(name = "1wk"))]
    OneWeek,
    #[serde(rename = "1mo")]
    #[cfg_attr(feature = "clap", value(name = "1mo"))]
    OneMonth,
    #[serde(rename = "3mo")]
    #[cfg_attr(feature = "clap", value(name = "3mo"))]
    ThreeMonths,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::OneMinute,
        Interval::TwoMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
        Interval::NinetyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::FiveDays,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::OneMinute
                | Interval::TwoMinutes
                | Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::SixtyMinutes
                | Interval::NinetyMinutes
                | Interval::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| ConfigError::ValidationError(format!("Invalid interval '{}'", s)))
    }
}

/// The historical window and sampling interval a run's price data must cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DataRequestSpec")]
pub struct DataRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
    interval: Interval,
}

#[derive(Debug, Clone, Deserialize)]
struct DataRequestSpec {
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default = "default_interval")]
    interval: Interval,
}

fn default_interval() -> Interval {
    Interval::OneDay
}

impl TryFrom<DataRequestSpec> for DataRequest {
    type Error = ConfigError;

    fn try_from(spec: DataRequestSpec) -> Result<Self, Self::Error> {
        DataRequest::new(spec.start_date, spec.end_date, spec.interval)
    }
}

impl DataRequest {
    /// Validates a request against today's UTC date.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, interval: Interval) -> Result<Self, ConfigError> {
        Self::new_as_of(start_date, end_date, interval, Utc::now().date_naive())
    }

    /// Validates a request against an explicit "today".
    pub fn new_as_of(
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
        today: NaiveDate,
    ) -> Result<Self, ConfigError> {
        if start_date >= end_date {
            return Err(ConfigError::ValidationError(format!(
                "Start date ({}) must be before end date ({})",
                start_date, end_date
            )));
        }
        if end_date > today {
            return Err(ConfigError::ValidationError(format!(
                "End date ({}) cannot be in the future",
                end_date
            )));
        }
        if interval.is_intraday() {
            let span = (end_date - start_date).num_days();
            if span > MAX_INTRADAY_SPAN_DAYS {
                return Err(ConfigError::ValidationError(format!(
                    "For intraday intervals ({}), duration cannot exceed {} days (got {})",
                    interval, MAX_INTRADAY_SPAN_DAYS, span
                )));
            }
        }

        Ok(Self {
            start_date,
            end_date,
            interval,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Exclusive upper bound of the requested window.
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Whether `date` falls inside `[start_date, end_date)`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }
}

// ==============================================================================
// Logging
// ==============================================================================

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Fallback filter directive when `RUST_LOG` is not set (e.g. "info", "backtester=debug").
    pub level: String,
    /// If set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "pairwise.log".to_string(),
        }
    }
}
