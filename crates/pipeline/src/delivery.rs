//! Per-sink delivery task
//!
//! Each registered sink gets its own chain: bounded buffer → optional rate
//! limiter → synchronous `deliver` call. The rate limiter enforces a minimum
//! elapsed time between two successive deliveries by sleeping, so elements
//! arriving faster than the interval queue in the buffer (and behind it, in
//! the broadcast loop) rather than being dropped. FIFO order is preserved
//! end to end.
//!
//! The limiter sits behind the buffer rather than ahead of it. Held-back
//! elements wait in the same bounded buffer either way, so the observable
//! spacing, ordering, and absorption are identical, and this ordering needs
//! only one task per sink.

use std::sync::Arc;
use std::time::Duration;

use gauge_protocol::MetricElement;
use gauge_sinks::MetricSink;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Run one sink's delivery loop until its buffer closes or a delivery fails.
///
/// A `deliver` error is fatal to this chain: it is logged and the task
/// exits, leaving every other sink's chain untouched. There is no retry,
/// suppression, or dead-lettering.
pub(crate) async fn run(
    mut buffer: mpsc::Receiver<Arc<MetricElement>>,
    sink: Arc<dyn MetricSink>,
    rate_limit: Option<Duration>,
) {
    let mut next_allowed: Option<Instant> = None;

    while let Some(element) = buffer.recv().await {
        // next_allowed is only ever set when a rate limit is configured.
        if let Some(at) = next_allowed {
            sleep_until(at).await;
        }

        if let Err(error) = sink.deliver(&element) {
            tracing::error!(
                sink = %sink.name(),
                %error,
                "sink delivery failed, terminating delivery chain"
            );
            return;
        }

        if let Some(interval) = rate_limit {
            next_allowed = Some(Instant::now() + interval);
        }
    }

    tracing::debug!(sink = %sink.name(), "delivery buffer closed, sink chain shutting down");
}
