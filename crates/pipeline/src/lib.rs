//! Gauge - Pipeline
//!
//! The delivery coordinator that multiplexes many metric streams into many
//! sinks.
//!
//! # Architecture
//!
//! ```text
//! [Streams]                  [Coordinator]                 [Sinks]
//!   requests ──┐                                        ┌──▶ buffer ─ rate limit ─ stdout
//!   latency  ──┼──▶ intake ──▶ broadcast ──Arc clone────┼──▶ buffer ─ rate limit ─ tracing
//!   errors   ──┘   (unbounded)  (every element            └──▶ buffer ─────────────▶ tsdb
//!                               to every sink)
//! ```
//!
//! # Key Design
//!
//! - **Channel-based**: streams push aggregated elements into one unbounded
//!   intake; a broadcast task clones an `Arc<MetricElement>` to every
//!   registered sink chain — full fan-out, no partitioning.
//! - **Per-sink chains**: each sink gets its own bounded buffer and delivery
//!   task; a slow or dead sink never corrupts another sink's order.
//! - **Delay, not drop**: rate limiting holds elements back until the
//!   minimum interval has elapsed; the bounded buffer absorbs bursts and
//!   backpressures the broadcast loop when full. Nothing is rejected.
//! - **Single logical driver**: registration takes `&mut self`; `send` and
//!   `timer` take `&self` and are safe from any task.

mod coordinator;
mod delivery;
mod error;
mod sink_handle;

pub use coordinator::{Coordinator, RateLimit};
pub use error::{PipelineError, Result};
pub use sink_handle::SinkHandle;

// Re-export the types a pipeline caller touches directly.
pub use gauge_protocol::{MetricElement, TagMap};
pub use gauge_sinks::MetricSink;
pub use gauge_stream::{Aggregator, MetricStream, TimerGuard};

#[cfg(test)]
mod coordinator_test;
