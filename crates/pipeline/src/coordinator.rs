//! Delivery coordinator
//!
//! Registers named metric streams and sinks, broadcasts every aggregated
//! element from every stream to every sink, and gives each sink its own
//! buffered, optionally rate-limited delivery chain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use gauge_protocol::{MetricElement, TagMap};
use gauge_sinks::MetricSink;
use gauge_stream::{MetricStream, TimerGuard};

use crate::delivery;
use crate::error::{PipelineError, Result};
use crate::sink_handle::SinkHandle;

/// Rate limit configuration for a batch of sinks.
#[derive(Debug, Clone)]
pub enum RateLimit {
    /// One minimum interval, in seconds, applied to every sink
    All(f64),
    /// Per-sink intervals, matched one-to-one with the sink list;
    /// `0` disables the limit for that sink
    PerSink(Vec<f64>),
}

/// Coordinates the flow of metric elements through one or more streams into
/// one or more sinks.
///
/// Every aggregated element produced by any registered stream is delivered,
/// unmodified, to every registered sink — broadcast, not partitioned. The
/// broadcast task is spawned at construction, so a coordinator must be
/// created inside a running tokio runtime.
///
/// ```ignore
/// let mut coordinator = Coordinator::new();
/// coordinator.add_stream(
///     MetricStream::builder("n").agg(Aggregator::sum()).batch_size(2).build()?,
/// );
/// coordinator.add_sink(Arc::new(StdoutSink::new()), None)?;
/// coordinator.send("n", 1, None)?;
/// coordinator.send("n", 2, None)?;   // prints: n.sum=3
/// ```
pub struct Coordinator {
    /// Entry point streams connect to; cloned into every stream
    intake: mpsc::UnboundedSender<MetricElement>,

    /// Metric name → stream; `send`/`timer` look up here
    streams: HashMap<String, MetricStream>,

    /// Registered sink chains, shared with the broadcast task
    sinks: Arc<RwLock<Vec<SinkHandle>>>,
}

impl Coordinator {
    /// Create an empty coordinator and spawn its broadcast task.
    pub fn new() -> Self {
        let (intake, rx) = mpsc::unbounded_channel();
        let sinks = Arc::new(RwLock::new(Vec::new()));
        tokio::spawn(broadcast(rx, Arc::clone(&sinks)));
        Self {
            intake,
            streams: HashMap::new(),
            sinks,
        }
    }

    /// Create a coordinator pre-populated with streams and sinks.
    ///
    /// `rate_limit` is applied to the given sinks: [`RateLimit::All`] puts
    /// the same minimum interval on each, [`RateLimit::PerSink`] matches
    /// intervals to sinks one-to-one and must have the same length as
    /// `sinks`.
    pub fn with(
        streams: Vec<MetricStream>,
        sinks: Vec<Arc<dyn MetricSink>>,
        rate_limit: Option<RateLimit>,
    ) -> Result<Self> {
        let limits: Vec<Option<f64>> = match rate_limit {
            None => vec![None; sinks.len()],
            Some(RateLimit::All(secs)) => vec![Some(secs); sinks.len()],
            Some(RateLimit::PerSink(limits)) => {
                if limits.len() != sinks.len() {
                    return Err(PipelineError::RateLimitMismatch {
                        limits: limits.len(),
                        sinks: sinks.len(),
                    });
                }
                limits.into_iter().map(Some).collect()
            }
        };

        let mut coordinator = Self::new();
        for stream in streams {
            coordinator.add_stream(stream);
        }
        for (sink, limit) in sinks.into_iter().zip(limits) {
            coordinator.add_sink(sink, limit)?;
        }
        Ok(coordinator)
    }

    /// Register a metric stream, connecting its output to the broadcast.
    ///
    /// Re-registering an existing name replaces and detaches: the previous
    /// stream is disconnected from the broadcast before the lookup entry is
    /// replaced, so a stale stream can no longer emit into the pipeline.
    pub fn add_stream(&mut self, stream: MetricStream) {
        stream.connect(self.intake.clone());
        tracing::debug!(
            stream = %stream.name(),
            outputs = ?stream.output_names(),
            "registered metric stream"
        );
        if let Some(previous) = self.streams.insert(stream.name().to_string(), stream) {
            tracing::warn!(
                stream = %previous.name(),
                "replaced existing metric stream, previous stream detached"
            );
            previous.disconnect();
        }
    }

    /// Register a sink with an optional rate limit in seconds.
    ///
    /// `None` or `0` means unlimited. The buffer ahead of the sink absorbs
    /// transient pile-ups from several streams emitting at once; its
    /// capacity is fixed now, from the number of streams registered at this
    /// moment, and does not adapt afterwards.
    pub fn add_sink(&mut self, sink: Arc<dyn MetricSink>, rate_limit: Option<f64>) -> Result<()> {
        let interval = match rate_limit {
            None => None,
            Some(secs) => {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(PipelineError::InvalidRateLimit(secs));
                }
                if secs > 0.0 {
                    // try_from rejects values past Duration's upper bound.
                    let interval = Duration::try_from_secs_f64(secs)
                        .map_err(|_| PipelineError::InvalidRateLimit(secs))?;
                    Some(interval)
                } else {
                    None
                }
            }
        };

        // Small absorbing buffer; clamped to 1 because a zero-capacity
        // channel cannot exist and would wedge the broadcast when a sink is
        // registered before any stream.
        let buffer_size = (3 * self.streams.len()).min(3).max(1);
        let (tx, rx) = mpsc::channel(buffer_size);

        tracing::debug!(
            sink = %sink.name(),
            buffer = buffer_size,
            rate_limit_secs = rate_limit.unwrap_or(0.0),
            "registered sink"
        );

        self.sinks.write().push(SinkHandle::new(sink.name(), tx));
        tokio::spawn(delivery::run(rx, sink, interval));
        Ok(())
    }

    /// Send a metric value into the stream registered under `name`.
    ///
    /// Explicit `tags` override and augment the stream's default tags. Fails
    /// if no stream is registered under `name`; for count-batched streams an
    /// aggregation failure on a completed batch also surfaces here.
    pub fn send(&self, name: &str, value: impl Into<f64>, tags: Option<TagMap>) -> Result<()> {
        let stream = self
            .streams
            .get(name)
            .ok_or_else(|| PipelineError::UnknownMetric(name.to_string()))?;
        stream.send(value, tags)?;
        Ok(())
    }

    /// Measure elapsed time over a scope and send it to the stream
    /// registered under `name`.
    ///
    /// The returned guard reports `elapsed_seconds * scale` when dropped, on
    /// every exit path including panics; a panic keeps propagating after the
    /// measurement is recorded.
    pub fn timer(&self, name: &str, scale: f64, tags: Option<TagMap>) -> Result<TimerGuard> {
        let stream = self
            .streams
            .get(name)
            .ok_or_else(|| PipelineError::UnknownMetric(name.to_string()))?;
        Ok(stream.timer(scale, tags))
    }

    /// Number of registered streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Number of registered sink chains.
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("streams", &self.streams.keys().collect::<Vec<_>>())
            .field("sink_count", &self.sink_count())
            .finish()
    }
}

/// Broadcast loop: forward every intake element to every sink chain.
///
/// Elements are wrapped in `Arc` once and cloned per sink. Sends await on a
/// full buffer (delay, never drop); chains whose delivery task has exited
/// are skipped with a warning, leaving the remaining chains unaffected.
async fn broadcast(
    mut intake: mpsc::UnboundedReceiver<MetricElement>,
    sinks: Arc<RwLock<Vec<SinkHandle>>>,
) {
    while let Some(element) = intake.recv().await {
        let element = Arc::new(element);

        // Snapshot the registry so the lock is not held across awaits.
        let handles: Vec<SinkHandle> = sinks.read().clone();
        for handle in handles {
            if handle.is_closed() {
                tracing::warn!(sink = %handle.name(), "sink chain closed, skipping");
                continue;
            }
            if handle.send(Arc::clone(&element)).await.is_err() {
                tracing::warn!(sink = %handle.name(), "sink chain closed during send");
            }
        }
    }

    tracing::debug!("intake closed, broadcast shutting down");
}
