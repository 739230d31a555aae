use rust_decimal::Decimal;
use serde::Deserialize;

/// Defines a parameter sweep. This is deserialized from the `[sweep]` section.
///
/// Every combination of the three ranges is backtested; combinations whose
/// entry threshold does not exceed the exit threshold are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub lookback_period: ParameterRange,
    pub entry_threshold: ParameterRange,
    pub exit_threshold: ParameterRange,
    #[serde(default)] // Use default values if the [sweep.filters] section is missing
    pub filters: Filters,
}

/// Hard filters applied to sweep results before ranking.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Runs with fewer signal changes than this are discarded.
    pub min_trades: usize,
    /// Runs whose drawdown magnitude exceeds this fraction are discarded (0.25 = 25%).
    pub max_drawdown: f64,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            min_trades: 1,
            max_drawdown: 0.5,
        }
    }
}

/// Represents a range of values for a single parameter to be tested.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterRange {
    DiscreteInt(Vec<i64>),
    DiscreteDecimal(Vec<Decimal>),
    LinearInt { start: i64, end: i64, step: i64 },
    LinearDecimal { start: Decimal, end: Decimal, step: Decimal },
}
