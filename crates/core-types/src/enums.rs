use serde::{Deserialize, Serialize};

/// The desired exposure to the spread at a single timestamp.
///
/// `Long` means long the spread (long B, short A), `Short` the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    /// The signed unit exposure: -1, 0 or +1.
    pub fn direction(&self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    /// The signed unit exposure as a float, for position arithmetic.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.direction())
    }

    /// Number of unit exposure steps needed to move from `previous` to `self`.
    /// A flip from Long to Short costs two, an entry or exit costs one.
    pub fn change_magnitude(&self, previous: Signal) -> u8 {
        (self.direction() - previous.direction()).unsigned_abs()
    }
}

/// A rolling z-score observation.
///
/// Windows that are not yet full, or whose standard deviation is exactly zero,
/// yield `Undefined` instead of a NaN or an infinity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZScore {
    #[default]
    Undefined,
    Value(f64),
}

impl ZScore {
    /// Builds a z-score from a deviation and a standard deviation.
    pub fn from_deviation(deviation: f64, std_dev: f64) -> Self {
        if std_dev == 0.0 || !std_dev.is_finite() || !deviation.is_finite() {
            return ZScore::Undefined;
        }
        ZScore::Value(deviation / std_dev)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ZScore::Undefined => None,
            ZScore::Value(z) => Some(*z),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, ZScore::Value(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit_exposures() {
        assert_eq!(Signal::Short.as_f64(), -1.0);
        assert_eq!(Signal::default(), Signal::Flat);
        assert_eq!(Signal::Long.direction(), 1);
    }

    #[test]
    fn flip_costs_twice_an_entry() {
        assert_eq!(Signal::Short.change_magnitude(Signal::Long), 2);
        assert_eq!(Signal::Long.change_magnitude(Signal::Flat), 1);
        assert_eq!(Signal::Flat.change_magnitude(Signal::Flat), 0);
    }

    #[test]
    fn zero_std_is_undefined_not_infinite() {
        assert_eq!(ZScore::from_deviation(1.0, 0.0), ZScore::Undefined);
        assert_eq!(ZScore::from_deviation(0.0, 0.0), ZScore::Undefined);
        assert_eq!(ZScore::from_deviation(3.0, 1.5), ZScore::Value(2.0));
    }
}
