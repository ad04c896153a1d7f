//! Gauge - Stream
//!
//! The per-metric engine: accumulates metric elements into batches by time or
//! count, groups each batch by distinct tag signature, reduces every group
//! through one or more named aggregators, and hands the aggregated elements
//! to a downstream channel.
//!
//! # Architecture
//!
//! ```text
//! send(value, tags) ──▶ [accumulator] ──window tick / batch full──▶ take batch
//!                                                                     │
//!                                                    group by tag key (first-seen order)
//!                                                                     │
//!                                               agg #1 ─┬─ agg #2 ─┬─ ... (joined per batch)
//!                                                       ▼
//!                                        downstream UnboundedSender<MetricElement>
//! ```
//!
//! # Key Design
//!
//! - **Two grouping variants**, chosen at build time: tumbling time windows
//!   (fixed phase, anchored at stream creation, driven by a spawned tokio
//!   task) or fixed-size count batches (flushed synchronously in the
//!   caller's context).
//! - **First-seen group order**: within a batch, groups are emitted in the
//!   order their tag signatures first appeared, not sorted order.
//! - **Per-batch join**: with multiple aggregators, every branch's results
//!   for a batch are computed before any is emitted, then emitted
//!   branch-major. Batches are never interleaved.
//! - **Fail-fast configuration**: builders return errors; no partially
//!   usable stream is ever handed out.

mod agg;
mod error;
mod group;
mod stream;
mod timer;

pub use agg::{AggFn, AggSpec, AggregateError, Aggregator};
pub use error::{Result, StreamError};
pub use stream::{MetricStream, StreamBuilder};
pub use timer::TimerGuard;
