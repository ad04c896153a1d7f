//! Scoped timing guard
//!
//! Measures the wall-clock time a scope was alive and reports it through the
//! owning stream when dropped. Drop runs on every exit path — early returns,
//! `?`, and unwinding panics alike — so the measurement is never lost, and a
//! panic inside the scope keeps propagating after the send.

use gauge_protocol::TagMap;
use tokio::time::Instant;

use crate::stream::MetricStream;

/// RAII guard returned by [`MetricStream::timer`].
///
/// On drop, sends `elapsed_seconds * scale` into the stream with the tags it
/// was created with. Use `scale = 1000.0` to report milliseconds.
#[must_use = "the timer reports on drop; binding to `_` ends the measurement immediately"]
pub struct TimerGuard {
    stream: MetricStream,
    scale: f64,
    tags: Option<TagMap>,
    start: Instant,
}

impl TimerGuard {
    pub(crate) fn new(stream: MetricStream, scale: f64, tags: Option<TagMap>) -> Self {
        Self {
            stream,
            scale,
            tags,
            start: Instant::now(),
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        // A guard dropped during unwinding must not panic; a failed send
        // (count-mode aggregation error) is logged instead.
        if let Err(error) = self.stream.send(elapsed * self.scale, self.tags.take()) {
            tracing::error!(
                stream = %self.stream.name(),
                %error,
                "timer measurement dropped"
            );
        }
    }
}
