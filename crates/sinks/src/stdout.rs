//! Stdout sink - human-readable debug output
//!
//! Prints one line per aggregated element. Useful while experimenting with a
//! pipeline to see what the streams produce; not intended for production.

use std::io::{self, Write};

use gauge_protocol::MetricElement;

use crate::error::Result;
use crate::MetricSink;

/// Sink that prints each element to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl StdoutSink {
    /// Create a stdout sink.
    pub fn new() -> Self {
        Self
    }
}

impl MetricSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn deliver(&self, element: &MetricElement) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{element}")?;
        Ok(())
    }
}
