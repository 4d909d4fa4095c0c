//! Common metric types for evaluation.
//!
//! Ratios that can degenerate (empty pools, zero entropy) are carried as
//! [`MetricValue`], so an undefined result is visible in reports and never
//! enters an average as NaN.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Converts a count to f64 for statistical calculations.
///
/// Evaluation counts fit in u32; larger counts saturate.
#[inline]
pub(crate) fn count_as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Computes arithmetic mean.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / count_as_f64(values.len())
}

/// Computes standard deviation.
#[must_use]
pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / count_as_f64(values.len() - 1);
    variance.sqrt()
}

/// Why a metric has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    /// Both partitions have zero entropy (NMI is 0/0).
    ZeroEntropy,
    /// A comparison pool is empty.
    EmptyPool,
    /// Neither pool produced a match (precision is 0/0).
    NoMatches,
    /// Precision and recall are both zero (F1 is 0/0).
    ZeroPrecisionRecall,
    /// Nothing was accumulated.
    NoSamples,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ZeroEntropy => "zero entropy",
            Self::EmptyPool => "empty pool",
            Self::NoMatches => "no matches",
            Self::ZeroPrecisionRecall => "zero precision and recall",
            Self::NoSamples => "no samples",
        };
        f.write_str(text)
    }
}

/// A metric that is either a number or explicitly undefined.
///
/// A defined value formats like `f64`, honouring width and precision.
/// Serializes as a bare number, or as `{"reason": "..."}` when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A well-defined value.
    Defined(f64),
    /// A degenerate computation.
    Undefined {
        /// What made the metric degenerate.
        reason: Degeneracy,
    },
}

impl MetricValue {
    /// Divides, reporting `reason` instead of dividing by zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use textprofile_eval::{Degeneracy, MetricValue};
    ///
    /// assert_eq!(MetricValue::ratio(1.0, 4.0, Degeneracy::EmptyPool), MetricValue::Defined(0.25));
    /// assert!(!MetricValue::ratio(1.0, 0.0, Degeneracy::EmptyPool).is_defined());
    /// ```
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn ratio(numerator: f64, denominator: f64, reason: Degeneracy) -> Self {
        if denominator == 0.0 {
            Self::Undefined { reason }
        } else {
            Self::Defined(numerator / denominator)
        }
    }

    /// Count ratio; see [`MetricValue::ratio`].
    #[must_use]
    pub fn count_ratio(numerator: usize, denominator: usize, reason: Degeneracy) -> Self {
        Self::ratio(count_as_f64(numerator), count_as_f64(denominator), reason)
    }

    /// Returns the value when defined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined { .. } => None,
        }
    }

    /// Returns true for a defined value.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }

    /// Applies `f` to a defined value.
    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Defined(v) => Self::Defined(f(v)),
            undefined @ Self::Undefined { .. } => undefined,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => fmt::Display::fmt(v, f),
            Self::Undefined { reason } => write!(f, "undefined ({reason})"),
        }
    }
}

/// Running mean that skips undefined values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMean {
    /// Sum of defined values.
    pub sum: f64,
    /// Number of defined values.
    pub count: usize,
    /// Number of undefined values skipped.
    pub skipped: usize,
}

impl RunningMean {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value; undefined values are counted but not averaged.
    pub fn push(&mut self, value: MetricValue) {
        match value {
            MetricValue::Defined(v) => {
                self.sum += v;
                self.count += 1;
            }
            MetricValue::Undefined { .. } => self.skipped += 1,
        }
    }

    /// The mean of the defined values.
    #[must_use]
    pub fn mean(&self) -> MetricValue {
        MetricValue::ratio(self.sum, count_as_f64(self.count), Degeneracy::NoSamples)
    }
}
