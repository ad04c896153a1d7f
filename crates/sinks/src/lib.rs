//! Gauge - Sinks
//!
//! External consumers of aggregated metric elements. A sink is anything with
//! a synchronous, side-effecting `deliver` call; the pipeline invokes it once
//! per element after rate limiting and buffering.
//!
//! Three reference sinks ship here:
//!
//! - [`StdoutSink`] — prints each element; development visibility only.
//! - [`LogSink`] — emits each element through `tracing` with a configurable
//!   logger identity, level, and message template.
//! - [`TsdbSink`] — passes each element to a pre-constructed time-series
//!   database client.

mod error;
mod logger;
mod stdout;
mod tsdb;

pub use error::{Result, SinkError};
pub use logger::{LogLevel, LogSink};
pub use stdout::StdoutSink;
pub use tsdb::{TsdbClient, TsdbSink};

use gauge_protocol::MetricElement;

/// An external consumer of aggregated metric elements.
///
/// `deliver` performs a side effect and returns nothing meaningful. An error
/// is fatal to the delivery chain invoking it: the pipeline does not retry,
/// suppress, or dead-letter failed deliveries — callers needing tolerance
/// wrap the sink themselves.
pub trait MetricSink: Send + Sync {
    /// Short name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Consume one aggregated element.
    fn deliver(&self, element: &MetricElement) -> Result<()>;
}
