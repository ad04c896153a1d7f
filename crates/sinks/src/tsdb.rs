//! TSDB pass-through sink
//!
//! Hands each aggregated element to an already-constructed time-series
//! database client. The sink owns no connection logic of its own; making a
//! suitable client available is the caller's responsibility.

use std::fmt;

use gauge_protocol::{MetricElement, TagMap};

use crate::error::{Result, SinkError};
use crate::MetricSink;

/// A time-series database client capable of recording one data point.
pub trait TsdbClient: Send + Sync {
    /// Error type reported by the client.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record a `(name, value, tags)` data point.
    fn send(&self, name: &str, value: f64, tags: &TagMap) -> std::result::Result<(), Self::Error>;
}

/// Sink that forwards each element to a TSDB client.
///
/// Elements without tags are sent with an empty tag map. Sub-second delivery
/// may exceed what some TSDBs accept; pair this sink with a rate limit of at
/// least one second where that applies.
pub struct TsdbSink<C: TsdbClient> {
    client: C,
}

impl<C: TsdbClient> TsdbSink<C> {
    /// Wrap a pre-constructed TSDB client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Access the wrapped client.
    #[inline]
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: TsdbClient> MetricSink for TsdbSink<C> {
    fn name(&self) -> &str {
        "tsdb"
    }

    fn deliver(&self, element: &MetricElement) -> Result<()> {
        let empty = TagMap::new();
        let tags = element.tags().unwrap_or(&empty);
        self.client
            .send(element.name(), element.value(), tags)
            .map_err(|e| SinkError::Client(Box::new(e)))
    }
}

impl<C: TsdbClient> fmt::Debug for TsdbSink<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsdbSink").finish()
    }
}
