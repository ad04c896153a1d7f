//! Coordinator tests
//!
//! Registration, lookup failures, rate-limit validation, broadcast fan-out,
//! and the replace-and-detach policy for duplicate stream names.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use gauge_protocol::{MetricElement, TagMap};
use gauge_sinks::{MetricSink, SinkError};
use gauge_stream::{Aggregator, MetricStream};

use crate::coordinator::{Coordinator, RateLimit};
use crate::error::PipelineError;

fn tag_map(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Sink that records everything it receives.
#[derive(Default)]
struct CollectingSink {
    received: Mutex<Vec<MetricElement>>,
}

impl CollectingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn received(&self) -> Vec<MetricElement> {
        self.received.lock().clone()
    }
}

impl MetricSink for CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }

    fn deliver(&self, element: &MetricElement) -> Result<(), SinkError> {
        self.received.lock().push(element.clone());
        Ok(())
    }
}

/// Sink whose every delivery fails.
struct FailingSink;

impl MetricSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn deliver(&self, _element: &MetricElement) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::other("sink exploded")))
    }
}

fn batch_stream(name: &str, size: usize) -> MetricStream {
    MetricStream::builder(name)
        .agg(Aggregator::sum())
        .batch_size(size)
        .build()
        .unwrap()
}

/// Wait until the sink has received `expected` elements.
async fn wait_for(sink: &Arc<CollectingSink>, expected: usize) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while sink.received.lock().len() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "timed out waiting for {expected} elements, got {}",
            sink.received.lock().len()
        )
    });
}

// ============================================================================
// Registration and lookup
// ============================================================================

#[tokio::test]
async fn test_send_to_unregistered_name_fails() {
    let coordinator = Coordinator::new();
    let result = coordinator.send("missing", 1, None);
    assert!(matches!(result, Err(PipelineError::UnknownMetric(name)) if name == "missing"));
}

#[tokio::test]
async fn test_timer_on_unregistered_name_fails() {
    let coordinator = Coordinator::new();
    let result = coordinator.timer("missing", 1.0, None);
    assert!(matches!(result, Err(PipelineError::UnknownMetric(_))));
}

#[tokio::test]
async fn test_counts() {
    let mut coordinator = Coordinator::new();
    assert_eq!(coordinator.stream_count(), 0);
    assert_eq!(coordinator.sink_count(), 0);

    coordinator.add_stream(batch_stream("a", 1));
    coordinator.add_stream(batch_stream("b", 1));
    coordinator.add_sink(CollectingSink::new(), None).unwrap();

    assert_eq!(coordinator.stream_count(), 2);
    assert_eq!(coordinator.sink_count(), 1);
}

#[tokio::test]
async fn test_sink_registered_before_any_stream_still_delivers() {
    // With no streams yet, the sink's buffer is clamped to capacity 1; the
    // chain must still move elements once a stream shows up.
    let mut coordinator = Coordinator::new();
    let sink = CollectingSink::new();
    coordinator.add_sink(sink.clone(), None).unwrap();

    coordinator.add_stream(batch_stream("n", 1));
    for value in 1..=3 {
        coordinator.send("n", value, None).unwrap();
    }
    wait_for(&sink, 3).await;

    let values: Vec<f64> = sink.received().iter().map(MetricElement::value).collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

// ============================================================================
// Rate limit validation
// ============================================================================

#[tokio::test]
async fn test_per_sink_rate_limit_length_must_match() {
    let sinks: Vec<Arc<dyn MetricSink>> = vec![CollectingSink::new(), CollectingSink::new()];
    let result = Coordinator::with(
        vec![batch_stream("n", 1)],
        sinks,
        Some(RateLimit::PerSink(vec![1.0])),
    );
    assert!(matches!(
        result,
        Err(PipelineError::RateLimitMismatch { limits: 1, sinks: 2 })
    ));
}

#[tokio::test]
async fn test_negative_rate_limit_is_rejected() {
    let mut coordinator = Coordinator::new();
    let result = coordinator.add_sink(CollectingSink::new(), Some(-1.0));
    assert!(matches!(result, Err(PipelineError::InvalidRateLimit(_))));
}

#[tokio::test]
async fn test_rate_limit_beyond_duration_range_is_rejected() {
    // Finite and positive, but larger than a Duration can hold; must fail
    // cleanly like a negative limit, not panic.
    let mut coordinator = Coordinator::new();
    let result = coordinator.add_sink(CollectingSink::new(), Some(2e19));
    assert!(matches!(result, Err(PipelineError::InvalidRateLimit(_))));
}

#[tokio::test]
async fn test_zero_rate_limit_means_unlimited() {
    let mut coordinator = Coordinator::new();
    coordinator.add_stream(batch_stream("n", 1));
    let sink = CollectingSink::new();
    coordinator.add_sink(sink.clone(), Some(0.0)).unwrap();

    coordinator.send("n", 1, None).unwrap();
    wait_for(&sink, 1).await;
}

// ============================================================================
// Broadcast fan-out
// ============================================================================

#[tokio::test]
async fn test_every_sink_receives_every_element() {
    let mut coordinator = Coordinator::new();
    coordinator.add_stream(batch_stream("a", 1));
    coordinator.add_stream(batch_stream("b", 1));

    let first = CollectingSink::new();
    let second = CollectingSink::new();
    coordinator.add_sink(first.clone(), None).unwrap();
    coordinator.add_sink(second.clone(), None).unwrap();

    coordinator.send("a", 1, None).unwrap();
    coordinator.send("b", 2, None).unwrap();

    wait_for(&first, 2).await;
    wait_for(&second, 2).await;

    let expected = vec![
        MetricElement::new("a.sum", 1, None),
        MetricElement::new("b.sum", 2, None),
    ];
    assert_eq!(first.received(), expected);
    assert_eq!(second.received(), expected);
}

#[tokio::test]
async fn test_failing_sink_does_not_affect_others() {
    let mut coordinator = Coordinator::new();
    coordinator.add_stream(batch_stream("n", 1));

    let healthy = CollectingSink::new();
    coordinator.add_sink(Arc::new(FailingSink), None).unwrap();
    coordinator.add_sink(healthy.clone(), None).unwrap();

    for value in 1..=5 {
        coordinator.send("n", value, None).unwrap();
    }
    wait_for(&healthy, 5).await;

    let values: Vec<f64> = healthy.received().iter().map(MetricElement::value).collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

// ============================================================================
// Tag merging through the coordinator
// ============================================================================

#[tokio::test]
async fn test_send_merges_tags_over_stream_defaults() {
    let mut coordinator = Coordinator::new();
    coordinator.add_stream(
        MetricStream::builder("n")
            .agg(Aggregator::sum())
            .default_tags(tag_map(&[("foo", "bar")]))
            .batch_size(1)
            .build()
            .unwrap(),
    );
    let sink = CollectingSink::new();
    coordinator.add_sink(sink.clone(), None).unwrap();

    coordinator.send("n", 1, None).unwrap();
    coordinator
        .send("n", 2, Some(tag_map(&[("foo", "BAR!")])))
        .unwrap();
    wait_for(&sink, 2).await;

    let received = sink.received();
    assert_eq!(received[0].tags(), Some(&tag_map(&[("foo", "bar")])));
    assert_eq!(received[1].tags(), Some(&tag_map(&[("foo", "BAR!")])));
}

// ============================================================================
// Duplicate stream names: replace and detach
// ============================================================================

#[tokio::test]
async fn test_reregistering_a_name_detaches_the_previous_stream() {
    let mut coordinator = Coordinator::new();
    let sink = CollectingSink::new();

    let original = batch_stream("n", 1);
    coordinator.add_stream(original.clone());
    coordinator.add_sink(sink.clone(), None).unwrap();

    coordinator.send("n", 1, None).unwrap();
    wait_for(&sink, 1).await;

    // Replace "n"; the original stream must stop feeding the broadcast.
    let replacement = MetricStream::builder("n")
        .agg(Aggregator::max())
        .batch_size(1)
        .build()
        .unwrap();
    coordinator.add_stream(replacement);

    original.send(99, None).unwrap();
    coordinator.send("n", 2, None).unwrap();
    wait_for(&sink, 2).await;

    // Give the detached stream's element time to (not) show up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let received = sink.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1], MetricElement::new("n.max", 2, None));
}
