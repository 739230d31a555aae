use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

pub type Timestamp = DateTime<Utc>;

/// An ordered sequence of `(timestamp, value)` points.
///
/// Timestamps are strictly increasing, which every constructor guarantees.
/// Derived series (spread, z-score, signals) reuse the index of the series they
/// were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries<T> {
    points: Vec<(Timestamp, T)>,
}

/// A series of prices for a single instrument.
pub type PriceSeries = TimeSeries<f64>;

impl<T> TimeSeries<T> {
    /// Creates a series, rejecting duplicate or out-of-order timestamps.
    pub fn new(points: Vec<(Timestamp, T)>) -> Result<Self, CoreError> {
        if let Some(pos) = points.windows(2).position(|w| w[1].0 <= w[0].0) {
            return Err(CoreError::NonMonotonicTimestamps {
                index: pos + 1,
                timestamp: points[pos + 1].0,
            });
        }
        Ok(Self { points })
    }

    /// Pairs an already validated index with freshly computed values.
    ///
    /// `index` must come from an existing `TimeSeries` and have the same length as `values`.
    pub fn with_index(index: &[Timestamp], values: Vec<T>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            points: index.iter().copied().zip(values).collect(),
        }
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(Timestamp, T)] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Timestamp, T)> {
        self.points.iter()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.points.iter().map(|(ts, _)| *ts).collect()
    }

    pub fn first(&self) -> Option<&(Timestamp, T)> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&(Timestamp, T)> {
        self.points.last()
    }
}

impl<T: Copy> TimeSeries<T> {
    pub fn to_values(&self) -> Vec<T> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

impl PriceSeries {
    /// Simple per-period returns `p[t] / p[t-1] - 1`, indexed by the later timestamp.
    ///
    /// The result is one point shorter than the series; the first point has no
    /// defined return and is dropped.
    pub fn pct_change(&self) -> TimeSeries<f64> {
        TimeSeries {
            points: self
                .points
                .windows(2)
                .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
                .collect(),
        }
    }
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Intersects two series on their common timestamps.
pub fn intersect<T: Clone, U: Clone>(a: &TimeSeries<T>, b: &TimeSeries<U>) -> TimeSeries<(T, U)> {
    let mut points = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.points.len() && j < b.points.len() {
        let (ta, va) = &a.points[i];
        let (tb, vb) = &b.points[j];
        match ta.cmp(tb) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                points.push((*ta, (va.clone(), vb.clone())));
                i += 1;
                j += 1;
            }
        }
    }

    TimeSeries { points }
}

/// Two price series restricted to their common, fully-defined timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AlignedPair {
    pub timestamps: Vec<Timestamp>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Aligns two price series on their common timestamps, dropping any row where
/// either price is not a finite number.
pub fn align(a: &PriceSeries, b: &PriceSeries) -> AlignedPair {
    let joined = intersect(a, b);
    let mut aligned = AlignedPair {
        timestamps: Vec::with_capacity(joined.len()),
        a: Vec::with_capacity(joined.len()),
        b: Vec::with_capacity(joined.len()),
    };

    for (ts, (pa, pb)) in joined.points {
        if pa.is_finite() && pb.is_finite() {
            aligned.timestamps.push(ts);
            aligned.a.push(pa);
            aligned.b.push(pb);
        }
    }

    aligned
}
