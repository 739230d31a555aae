use crate::error::OptimizerError;
use configuration::{ParameterRange, StrategyParams, SweepConfig};
use itertools::iproduct;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

/// Converts a parameter range into its concrete list of values.
///
/// Linear ranges include `end` when the steps land on it exactly.
pub fn expand_range(name: &str, range: &ParameterRange) -> Result<Vec<Decimal>, OptimizerError> {
    let values = match range {
        ParameterRange::DiscreteInt(vals) => vals.iter().map(|&v| Decimal::from(v)).collect(),
        ParameterRange::DiscreteDecimal(vals) => vals.clone(),
        ParameterRange::LinearInt { start, end, step } => {
            if *step <= 0 {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{}' must be positive.",
                    name
                )));
            }
            (*start..=*end).step_by(*step as usize).map(Decimal::from).collect()
        }
        ParameterRange::LinearDecimal { start, end, step } => {
            if step.is_sign_negative() || step.is_zero() {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{}' must be positive.",
                    name
                )));
            }
            let mut vals = Vec::new();
            let mut current = *start;
            while current <= *end {
                vals.push(current);
                current += *step;
            }
            vals
        }
    };
    Ok(values)
}

/// Generates every valid strategy configuration of the sweep grid.
///
/// The grid is the Cartesian product lookback x entry x exit, in that nesting
/// order. Significance level and minimum sample size are taken from `base`.
/// Combinations that fail validation (e.g. entry not above exit) are skipped.
pub fn generate_parameter_sets(
    config: &SweepConfig,
    base: &StrategyParams,
) -> Result<Vec<StrategyParams>, OptimizerError> {
    let lookbacks = expand_range("lookback_period", &config.lookback_period)?
        .into_iter()
        .map(to_lookback)
        .collect::<Result<Vec<_>, _>>()?;
    let entries = to_f64s("entry_threshold", expand_range("entry_threshold", &config.entry_threshold)?)?;
    let exits = to_f64s("exit_threshold", expand_range("exit_threshold", &config.exit_threshold)?)?;

    let mut sets = Vec::with_capacity(lookbacks.len() * entries.len() * exits.len());
    let mut skipped = 0usize;

    for (&lookback, &entry, &exit) in iproduct!(&lookbacks, &entries, &exits) {
        let params = StrategyParams::new(lookback, entry, exit)
            .and_then(|p| p.with_significance_level(base.significance_level()))
            .and_then(|p| p.with_min_observations(base.min_observations()));
        match params {
            Ok(params) => sets.push(params),
            Err(e) => {
                debug!(lookback, entry, exit, reason = %e, "Skipping parameter combination");
                skipped += 1;
            }
        }
    }

    debug!(valid = sets.len(), skipped, "Parameter grid generated");
    Ok(sets)
}

fn to_lookback(value: Decimal) -> Result<usize, OptimizerError> {
    if !value.fract().is_zero() {
        return Err(OptimizerError::ParameterGeneration(format!(
            "lookback_period values must be whole numbers, got {}",
            value
        )));
    }
    value.to_usize().ok_or_else(|| {
        OptimizerError::ParameterGeneration(format!("lookback_period {} is out of range", value))
    })
}

fn to_f64s(name: &str, values: Vec<Decimal>) -> Result<Vec<f64>, OptimizerError> {
    values
        .into_iter()
        .map(|v| {
            v.to_f64().ok_or_else(|| {
                OptimizerError::ParameterGeneration(format!("{} value {} is not representable", name, v))
            })
        })
        .collect()
}
