use configuration::StrategyParams;
use core_types::{Signal, TimeSeries, ZScore};
use serde::Serialize;
use tracing::debug;

/// One step of the hysteresis state machine.
///
/// From `Flat`, a z-score strictly above `entry` opens `Short` and one strictly
/// below `-entry` opens `Long`. An open position closes once `|z|` falls strictly
/// below `exit`. An `Undefined` z-score never changes the state.
pub fn transition(prior: Signal, z: ZScore, entry: f64, exit: f64) -> Signal {
    let Some(z) = z.value() else {
        return prior;
    };

    match prior {
        Signal::Flat if z > entry => Signal::Short,
        Signal::Flat if z < -entry => Signal::Long,
        Signal::Flat => Signal::Flat,
        Signal::Long | Signal::Short if z.abs() < exit => Signal::Flat,
        held => held,
    }
}

/// Turns a z-score sequence into position signals, carrying the current position.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    entry_threshold: f64,
    exit_threshold: f64,
    position: Signal,
}

impl SignalGenerator {
    pub fn new(params: &StrategyParams) -> Self {
        Self {
            entry_threshold: params.entry_threshold(),
            exit_threshold: params.exit_threshold(),
            position: Signal::Flat,
        }
    }

    /// The position carried into the next step.
    pub fn position(&self) -> Signal {
        self.position
    }

    /// Returns to the initial `Flat` state.
    pub fn reset(&mut self) {
        self.position = Signal::Flat;
    }

    /// Feeds one z-score and returns the post-transition signal.
    pub fn step(&mut self, z: ZScore) -> Signal {
        let next = transition(self.position, z, self.entry_threshold, self.exit_threshold);
        if next != self.position {
            debug!(from = ?self.position, to = ?next, z = ?z.value(), "Signal transition");
        }
        self.position = next;
        next
    }

    /// Runs the state machine over a whole z-score series from a fresh `Flat` state.
    pub fn generate(&self, zscores: &TimeSeries<ZScore>) -> TimeSeries<Signal> {
        let signals = self.generate_values(&zscores.to_values());
        TimeSeries::with_index(&zscores.timestamps(), signals)
    }

    /// Slice form of [`SignalGenerator::generate`].
    pub fn generate_values(&self, zscores: &[ZScore]) -> Vec<Signal> {
        let (entry, exit) = (self.entry_threshold, self.exit_threshold);
        zscores
            .iter()
            .scan(Signal::Flat, |position, z| {
                *position = transition(*position, *z, entry, exit);
                Some(*position)
            })
            .collect()
    }
}

/// Period counts of a generated signal path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub long_periods: usize,
    pub short_periods: usize,
    pub flat_periods: usize,
    pub defined_zscores: usize,
    /// Positions where the signal differs from its predecessor.
    pub signal_changes: usize,
}

impl SignalSummary {
    pub fn new(zscores: &[ZScore], signals: &[Signal]) -> Self {
        let mut summary = Self {
            defined_zscores: zscores.iter().filter(|z| z.is_defined()).count(),
            signal_changes: signals.windows(2).filter(|w| w[0] != w[1]).count(),
            ..Self::default()
        };
        for signal in signals {
            match signal {
                Signal::Long => summary.long_periods += 1,
                Signal::Short => summary.short_periods += 1,
                Signal::Flat => summary.flat_periods += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generator() -> SignalGenerator {
        SignalGenerator::new(&StrategyParams::new(20, 2.0, 0.5).unwrap())
    }

    #[test]
    fn reference_sequence() {
        let zscores = [
            ZScore::Undefined,
            ZScore::Undefined,
            ZScore::Value(2.5),
            ZScore::Value(1.0),
            ZScore::Value(0.3),
            ZScore::Value(-2.5),
            ZScore::Value(0.2),
        ];
        let directions: Vec<i8> = generator()
            .generate_values(&zscores)
            .iter()
            .map(Signal::direction)
            .collect();
        assert_eq!(directions, vec![0, 0, -1, -1, 0, 1, 0]);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(transition(Signal::Flat, ZScore::Value(2.0), 2.0, 0.5), Signal::Flat);
        assert_eq!(transition(Signal::Flat, ZScore::Value(-2.0), 2.0, 0.5), Signal::Flat);
        assert_eq!(transition(Signal::Long, ZScore::Value(0.5), 2.0, 0.5), Signal::Long);
        assert_eq!(transition(Signal::Short, ZScore::Value(-0.5), 2.0, 0.5), Signal::Short);
    }

    #[test]
    fn undefined_holds_position() {
        for prior in [Signal::Long, Signal::Short, Signal::Flat] {
            assert_eq!(transition(prior, ZScore::Undefined, 2.0, 0.5), prior);
        }
    }

    #[test]
    fn open_position_is_held_through_opposite_extreme() {
        // No direct flip: a Short stays Short even at z < -entry.
        assert_eq!(transition(Signal::Short, ZScore::Value(-3.0), 2.0, 0.5), Signal::Short);
        assert_eq!(transition(Signal::Long, ZScore::Value(3.0), 2.0, 0.5), Signal::Long);
    }

    #[test]
    fn streaming_matches_batch() {
        let zscores: Vec<ZScore> = (0..50)
            .map(|i| ZScore::Value(3.0 * (i as f64 * 0.4).sin()))
            .collect();
        let batch = generator().generate_values(&zscores);

        let mut streaming = generator();
        let stepped: Vec<Signal> = zscores.iter().map(|z| streaming.step(*z)).collect();

        assert_eq!(batch, stepped);
        assert_eq!(streaming.position(), *batch.last().unwrap());
        streaming.reset();
        assert_eq!(streaming.position(), Signal::Flat);
    }

    #[test]
    fn summary_counts_periods_and_changes() {
        let zscores = [ZScore::Undefined, ZScore::Value(2.5), ZScore::Value(0.1), ZScore::Value(-3.0)];
        let signals = [Signal::Flat, Signal::Short, Signal::Flat, Signal::Long];
        let summary = SignalSummary::new(&zscores, &signals);

        assert_eq!(
            summary,
            SignalSummary {
                long_periods: 1,
                short_periods: 1,
                flat_periods: 2,
                defined_zscores: 3,
                signal_changes: 3,
            }
        );
    }
}
