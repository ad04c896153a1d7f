//! Metric stream engine
//!
//! One `MetricStream` per named metric. Elements accumulate into batches by
//! tumbling time window or by count; a completed batch is grouped by tag
//! signature and reduced through the configured aggregators, and the results
//! are pushed to the connected downstream channel.
//!
//! The stream is a cheap handle over shared state, so it can be held by the
//! coordinator, by timer guards, and by the window ticker task at the same
//! time. The accumulator has a single logical writer; the mutex exists
//! because the ticker task swaps the buffer out from under `send` callers.

use std::mem;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, Instant};

use gauge_protocol::{tags_from_key, MetricElement, TagMap};

use crate::agg::{AggFn, AggSpec};
use crate::error::{Result, StreamError};
use crate::group::group_by_key;
use crate::timer::TimerGuard;

/// How elements are grouped into batches.
#[derive(Debug, Clone, Copy)]
enum Grouping {
    /// Tumbling wall-clock window, fixed phase, anchored at stream creation
    Window(Duration),
    /// Fixed number of elements per batch
    Batch(usize),
}

pub(crate) struct StreamInner {
    name: String,
    /// Resolved `(output_name, function)` branches, in configured order
    aggs: Vec<(String, AggFn)>,
    default_tags: Option<TagMap>,
    grouping: Grouping,
    /// Accumulating batch; swapped out whole on flush
    accumulator: Mutex<Vec<MetricElement>>,
    /// Where aggregated elements go; `None` until connected
    downstream: Mutex<Option<UnboundedSender<MetricElement>>>,
}

/// A stream of metric elements for one named metric.
///
/// Built via [`MetricStream::builder`]. Exactly one of `window_secs` or
/// `batch_size` must be configured:
///
/// - **`window_secs`**: all elements sent within each tumbling window are
///   batched together. The window timer is anchored at stream creation, so a
///   window stream must be built inside a running tokio runtime.
/// - **`batch_size`**: every N successive elements form a batch, flushed
///   synchronously in the caller's context. `batch_size = 1` emits one
///   aggregated element per send with no latency. `batch_size = 0` is
///   accepted but never reaches its threshold, so nothing is ever emitted —
///   a latent stall, kept deliberate rather than silently rejected.
///
/// Dropping every handle to the stream loses whatever partial batch it was
/// accumulating; tumbling semantics provide no drain on shutdown.
#[derive(Clone)]
pub struct MetricStream {
    inner: Arc<StreamInner>,
}

impl MetricStream {
    /// Start building a stream for the named metric.
    pub fn builder(name: impl Into<String>) -> StreamBuilder {
        StreamBuilder {
            name: name.into(),
            agg: None,
            default_tags: None,
            window_secs: None,
            batch_size: None,
        }
    }

    /// Name of the metric this stream accepts.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Names of the aggregated output metrics, in emission order.
    pub fn output_names(&self) -> Vec<&str> {
        self.inner.aggs.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Connect the stream's output to a downstream channel.
    ///
    /// Replaces any previous connection. Elements aggregated while no
    /// downstream is connected are discarded.
    pub fn connect(&self, downstream: UnboundedSender<MetricElement>) {
        *self.inner.downstream.lock() = Some(downstream);
    }

    /// Detach the stream from its downstream channel.
    pub fn disconnect(&self) {
        *self.inner.downstream.lock() = None;
    }

    /// Send a metric value into the stream.
    ///
    /// Explicit `tags` override and augment the stream's default tags on key
    /// collision. For count-batched streams a full batch is grouped,
    /// aggregated and forwarded before this returns; an aggregation failure
    /// aborts that batch and surfaces here.
    pub fn send(&self, value: impl Into<f64>, tags: Option<TagMap>) -> Result<()> {
        let tags = self.inner.merge_tags(tags);
        let element = MetricElement::new(self.inner.name.clone(), value, tags);

        match self.inner.grouping {
            Grouping::Window(_) => {
                self.inner.accumulator.lock().push(element);
                Ok(())
            }
            Grouping::Batch(size) => {
                let full = {
                    let mut accumulator = self.inner.accumulator.lock();
                    accumulator.push(element);
                    if accumulator.len() == size {
                        Some(mem::take(&mut *accumulator))
                    } else {
                        None
                    }
                };
                match full {
                    Some(batch) => self.inner.flush(batch),
                    None => Ok(()),
                }
            }
        }
    }

    /// Measure elapsed wall-clock time over a scope and send it as a value.
    ///
    /// The returned guard reports `elapsed_seconds * scale` (with the given
    /// tags) when dropped — on every exit path, including unwinding, so a
    /// panic inside the scope still records its measurement before
    /// propagating.
    pub fn timer(&self, scale: f64, tags: Option<TagMap>) -> TimerGuard {
        TimerGuard::new(self.clone(), scale, tags)
    }
}

impl std::fmt::Debug for MetricStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStream")
            .field("name", &self.inner.name)
            .field("outputs", &self.output_names())
            .field("grouping", &self.inner.grouping)
            .finish()
    }
}

impl StreamInner {
    /// Merge explicit tags over the stream's defaults; explicit wins.
    fn merge_tags(&self, tags: Option<TagMap>) -> Option<TagMap> {
        match (&self.default_tags, tags) {
            (Some(defaults), Some(tags)) => {
                let mut merged = defaults.clone();
                merged.extend(tags);
                Some(merged)
            }
            (Some(defaults), None) => Some(defaults.clone()),
            // An explicit empty map with no defaults carries no information;
            // collapse it so such elements group with untagged ones.
            (None, Some(tags)) if tags.is_empty() => None,
            (None, tags) => tags,
        }
    }

    /// Group a completed batch, run every aggregator branch, and forward the
    /// results downstream.
    ///
    /// All branch results are computed before any element is emitted, so a
    /// failure aborts the whole batch with nothing sent, and one batch's
    /// outputs are never interleaved with another's. Emission order is
    /// branch-major: every group of the first aggregator, then the second's,
    /// and so on, with groups in first-seen order throughout.
    fn flush(&self, batch: Vec<MetricElement>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let groups = group_by_key(batch);
        let mut results = Vec::with_capacity(groups.len() * self.aggs.len());
        for (output, func) in &self.aggs {
            for (key, members) in &groups {
                let values: Vec<f64> = members.iter().map(MetricElement::value).collect();
                let value = func(&values).map_err(|source| StreamError::Aggregate {
                    output: output.clone(),
                    source,
                })?;
                results.push(MetricElement::new(
                    output.clone(),
                    value,
                    tags_from_key(key.as_deref()),
                ));
            }
        }

        let downstream = self.downstream.lock();
        if let Some(tx) = downstream.as_ref() {
            for element in results {
                if tx.send(element).is_err() {
                    // Receiver gone; the rest of this batch has nowhere to go.
                    tracing::debug!(stream = %self.name, "downstream closed, discarding batch output");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Spawn the tumbling-window ticker for a window-grouped stream.
///
/// The task holds only a weak reference, so dropping the last stream handle
/// stops the ticker on its next fire. Empty windows are skipped; an
/// aggregation failure drops that window's batch and keeps ticking.
fn spawn_window_ticker(inner: &Arc<StreamInner>, period: Duration) {
    let weak: Weak<StreamInner> = Arc::downgrade(inner);
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { break };
            let batch = mem::take(&mut *inner.accumulator.lock());
            if batch.is_empty() {
                continue;
            }
            if let Err(error) = inner.flush(batch) {
                tracing::error!(
                    stream = %inner.name,
                    %error,
                    "aggregation failed, window batch dropped"
                );
            }
        }
    });
}

/// Builder for [`MetricStream`].
#[derive(Debug)]
pub struct StreamBuilder {
    name: String,
    agg: Option<AggSpec>,
    default_tags: Option<TagMap>,
    window_secs: Option<f64>,
    batch_size: Option<usize>,
}

impl StreamBuilder {
    /// Set the aggregator configuration: a single [`Aggregator`], an ordered
    /// sequence, or explicitly named pairs.
    ///
    /// [`Aggregator`]: crate::Aggregator
    pub fn agg(mut self, spec: impl Into<AggSpec>) -> Self {
        self.agg = Some(spec.into());
        self
    }

    /// Tags applied to every element by default; per-send tags override and
    /// augment these.
    pub fn default_tags(mut self, tags: TagMap) -> Self {
        self.default_tags = Some(tags);
        self
    }

    /// Group elements into tumbling windows of this many seconds.
    pub fn window_secs(mut self, secs: f64) -> Self {
        self.window_secs = Some(secs);
        self
    }

    /// Group elements into batches of this many elements.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Validate the configuration and build the stream.
    ///
    /// Fails fast on an invalid grouping or aggregator spec; nothing is
    /// spawned or registered on failure. Window streams spawn their ticker
    /// here and therefore must be built inside a tokio runtime.
    pub fn build(self) -> Result<MetricStream> {
        let grouping = match (self.window_secs, self.batch_size) {
            (Some(_), Some(_)) => return Err(StreamError::GroupingConflict),
            (None, None) => return Err(StreamError::GroupingRequired),
            (Some(secs), None) => {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(StreamError::InvalidWindow(secs));
                }
                // try_from rejects values past Duration's upper bound.
                let period = Duration::try_from_secs_f64(secs)
                    .map_err(|_| StreamError::InvalidWindow(secs))?;
                Grouping::Window(period)
            }
            (None, Some(size)) => Grouping::Batch(size),
        };

        let aggs = self
            .agg
            .ok_or(StreamError::NoAggregators)?
            .resolve(&self.name)?;

        let inner = Arc::new(StreamInner {
            name: self.name,
            aggs,
            default_tags: self.default_tags,
            grouping,
            accumulator: Mutex::new(Vec::new()),
            downstream: Mutex::new(None),
        });

        if let Grouping::Window(period) = grouping {
            spawn_window_ticker(&inner, period);
        }

        Ok(MetricStream { inner })
    }
}
