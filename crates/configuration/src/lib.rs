use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod optimizer_config;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use optimizer_config::{Filters, ParameterRange, SweepConfig};
pub use settings::{
    BacktestParams, Config, DataRequest, Interval, LoggingSettings, MAX_INTRADAY_SPAN_DAYS,
    MIN_COINTEGRATION_OBSERVATIONS, MIN_LOOKBACK_PERIOD, StrategyParams,
};
pub use telemetry::init_tracing;

/// Prefix of environment variables that override file settings,
/// e.g. `PAIRWISE__STRATEGY__LOOKBACK_PERIOD=90`.
pub const ENV_PREFIX: &str = "PAIRWISE";

/// Loads the application configuration from a TOML file, with environment overrides.
///
/// Every parameter struct validates itself while deserializing, so an
/// inconsistent file (e.g. entry threshold below exit threshold) fails here.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}

/// Parses a configuration from TOML text, without environment overrides.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.strategy, StrategyParams::default());
        assert_eq!(config.backtest, BacktestParams::default());
        assert!(config.data.is_none());
        assert!(config.sweep.is_none());
    }

    #[test]
    fn parses_full_document() {
        let config = parse_config(
            r#"
            [strategy]
            lookback_period = 30
            entry_threshold = 2.5
            exit_threshold = 0.25

            [backtest]
            initial_capital = 50000
            transaction_cost = 0.0005
            max_position_size = 0.25

            [data]
            start_date = "2013-01-01"
            end_date = "2015-01-01"
            interval = "1d"

            [sweep]
            lookback_period = [40, 60]
            entry_threshold = { start = 1.5, end = 2.5, step = 0.5 }
            exit_threshold = [0.0, 0.5]
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy.lookback_period(), 30);
        assert_eq!(config.strategy.entry_threshold(), 2.5);
        assert_eq!(config.backtest.initial_capital(), dec!(50000));
        assert_eq!(config.backtest.max_position_size(), dec!(0.25));
        assert_eq!(config.data.unwrap().interval(), Interval::OneDay);

        let sweep = config.sweep.unwrap();
        assert_eq!(sweep.lookback_period, ParameterRange::DiscreteInt(vec![40, 60]));
        assert!(matches!(sweep.entry_threshold, ParameterRange::LinearDecimal { .. }));
        assert_eq!(sweep.filters.min_trades, 1);
    }

    #[test]
    fn invalid_thresholds_fail_at_load_time() {
        let result = parse_config(
            r#"
            [strategy]
            entry_threshold = 0.5
            exit_threshold = 2.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn thresholds_under_backtest_are_rejected() {
        let result = parse_config(
            r#"
            [backtest]
            initial_capital = 1000
            entry_threshold = 2.5
            "#,
        );
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn invalid_interval_fails_at_load_time() {
        let result = parse_config(
            r#"
            [data]
            start_date = "2013-01-01"
            end_date = "2013-02-01"
            interval = "7m"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.toml");
        std::fs::write(&path, "[strategy]\nlookback_period = 45\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.strategy.lookback_period(), 45);
    }
}
