//! Named aggregators and aggregator-spec resolution
//!
//! An [`Aggregator`] pairs a reduction function with the name that labels its
//! output metric. User-facing configuration accepts one aggregator, an
//! ordered sequence, or explicitly named pairs ([`AggSpec`]); the spec is
//! resolved exactly once, at stream build time, into an ordered
//! `(output_name, function)` list — there is no runtime dispatch on the
//! spec's shape afterwards.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::StreamError;

/// Reduction function over one group's values, in original batch order.
pub type AggFn = Arc<dyn Fn(&[f64]) -> std::result::Result<f64, AggregateError> + Send + Sync>;

/// Errors raised by aggregation functions
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The group contained no values
    #[error("no values to aggregate")]
    Empty,

    /// The function needs more values than the group supplied
    #[error("need at least {needed} values, got {got}")]
    NotEnoughValues {
        /// Minimum number of values the function requires
        needed: usize,
        /// Number of values actually supplied
        got: usize,
    },

    /// Failure reported by a custom aggregation function
    #[error("{0}")]
    Failed(String),
}

/// A named reduction applied to one group's values.
#[derive(Clone)]
pub struct Aggregator {
    name: String,
    func: AggFn,
}

impl Aggregator {
    /// Create an aggregator from a name and a reduction function.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[f64]) -> std::result::Result<f64, AggregateError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name of this aggregator, used to label its output metric.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reduction function.
    #[inline]
    pub fn func(&self) -> &AggFn {
        &self.func
    }

    /// Sum of the group's values.
    pub fn sum() -> Self {
        Self::new("sum", |values| Ok(values.iter().sum()))
    }

    /// Smallest value in the group.
    pub fn min() -> Self {
        Self::new("min", |values| {
            values
                .iter()
                .copied()
                .reduce(f64::min)
                .ok_or(AggregateError::Empty)
        })
    }

    /// Largest value in the group.
    pub fn max() -> Self {
        Self::new("max", |values| {
            values
                .iter()
                .copied()
                .reduce(f64::max)
                .ok_or(AggregateError::Empty)
        })
    }

    /// Arithmetic mean of the group's values.
    pub fn mean() -> Self {
        Self::new("mean", |values| {
            if values.is_empty() {
                return Err(AggregateError::Empty);
            }
            Ok(values.iter().sum::<f64>() / values.len() as f64)
        })
    }

    /// Sample standard deviation; needs at least two values.
    pub fn stdev() -> Self {
        Self::new("stdev", |values| {
            if values.len() < 2 {
                return Err(AggregateError::NotEnoughValues {
                    needed: 2,
                    got: values.len(),
                });
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (values.len() - 1) as f64;
            Ok(variance.sqrt())
        })
    }

    /// Number of values in the group.
    pub fn count() -> Self {
        Self::new("count", |values| Ok(values.len() as f64))
    }

    /// The most recently observed value in the group.
    pub fn last() -> Self {
        Self::new("last", |values| {
            values.last().copied().ok_or(AggregateError::Empty)
        })
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").field("name", &self.name).finish()
    }
}

/// Aggregator configuration accepted by the stream builder.
///
/// All three shapes normalize to the same thing: an ordered list of
/// `(output_name, function)` pairs. `Named` entries use the explicit name
/// instead of the aggregator's own.
#[derive(Debug, Clone)]
pub enum AggSpec {
    /// A single aggregator, named after itself
    Single(Aggregator),
    /// An ordered sequence of aggregators, each named after itself
    Sequence(Vec<Aggregator>),
    /// Explicitly named aggregators, in the given order
    Named(Vec<(String, Aggregator)>),
}

impl AggSpec {
    /// Resolve the spec into the canonical ordered `(output_name, func)`
    /// list, prefixing each name with the stream name.
    ///
    /// An empty sequence or mapping is a configuration error: a stream with
    /// no aggregators would silently discard every batch.
    pub(crate) fn resolve(
        self,
        stream_name: &str,
    ) -> std::result::Result<Vec<(String, AggFn)>, StreamError> {
        let pairs: Vec<(String, AggFn)> = match self {
            AggSpec::Single(agg) => {
                vec![(format!("{stream_name}.{}", agg.name()), agg.func.clone())]
            }
            AggSpec::Sequence(aggs) => aggs
                .into_iter()
                .map(|agg| (format!("{stream_name}.{}", agg.name()), agg.func))
                .collect(),
            AggSpec::Named(pairs) => pairs
                .into_iter()
                .map(|(name, agg)| (format!("{stream_name}.{name}"), agg.func))
                .collect(),
        };
        if pairs.is_empty() {
            return Err(StreamError::NoAggregators);
        }
        Ok(pairs)
    }
}

impl From<Aggregator> for AggSpec {
    fn from(agg: Aggregator) -> Self {
        AggSpec::Single(agg)
    }
}

impl From<Vec<Aggregator>> for AggSpec {
    fn from(aggs: Vec<Aggregator>) -> Self {
        AggSpec::Sequence(aggs)
    }
}

impl<const N: usize> From<[Aggregator; N]> for AggSpec {
    fn from(aggs: [Aggregator; N]) -> Self {
        AggSpec::Sequence(aggs.into())
    }
}

impl From<Vec<(String, Aggregator)>> for AggSpec {
    fn from(pairs: Vec<(String, Aggregator)>) -> Self {
        AggSpec::Named(pairs)
    }
}

impl<const N: usize> From<[(&str, Aggregator); N]> for AggSpec {
    fn from(pairs: [(&str, Aggregator); N]) -> Self {
        AggSpec::Named(
            pairs
                .into_iter()
                .map(|(name, agg)| (name.to_string(), agg))
                .collect(),
        )
    }
}
