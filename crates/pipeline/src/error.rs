//! Pipeline error types

use thiserror::Error;

use gauge_stream::StreamError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the delivery coordinator
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No stream is registered under the given metric name
    #[error("no metric stream registered under '{0}'")]
    UnknownMetric(String),

    /// Per-sink rate limit list does not match the sink list
    #[error("rate limit list has {limits} entries for {sinks} sinks; they must match one-to-one")]
    RateLimitMismatch {
        /// Number of rate limit entries supplied
        limits: usize,
        /// Number of sinks supplied
        sinks: usize,
    },

    /// Rate limit is negative or not finite
    #[error("rate limit must be a finite, non-negative number of seconds, got {0}")]
    InvalidRateLimit(f64),

    /// Error surfaced from a metric stream
    #[error(transparent)]
    Stream(#[from] StreamError),
}
