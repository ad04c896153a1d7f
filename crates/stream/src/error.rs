//! Stream error types

use thiserror::Error;

use crate::agg::AggregateError;

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors raised by stream construction and batch processing
#[derive(Debug, Error)]
pub enum StreamError {
    /// Neither window_secs nor batch_size was configured
    #[error(
        "either window_secs or batch_size must be set in order to group \
         metric elements prior to value aggregation"
    )]
    GroupingRequired,

    /// Both window_secs and batch_size were configured
    #[error("window_secs and batch_size are mutually exclusive")]
    GroupingConflict,

    /// Window length is zero, negative, or not finite
    #[error("window_secs must be a finite, positive number of seconds, got {0}")]
    InvalidWindow(f64),

    /// The aggregator spec resolved to an empty list
    #[error("at least one aggregator is required")]
    NoAggregators,

    /// An aggregator failed while reducing a group; the whole batch was
    /// aborted with nothing emitted
    #[error("aggregator '{output}' failed: {source}")]
    Aggregate {
        /// Output metric name of the failing branch
        output: String,
        /// Underlying aggregation error
        #[source]
        source: AggregateError,
    },
}
