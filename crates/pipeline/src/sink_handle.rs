//! Sink handle for pipeline communication
//!
//! `SinkHandle` wraps the sending half of a sink chain's bounded buffer,
//! letting the broadcast loop feed sinks without knowing their concrete
//! types. Elements travel as `Arc<MetricElement>` so fan-out to many sinks
//! never copies the element itself.

use std::sync::Arc;

use gauge_protocol::MetricElement;
use tokio::sync::mpsc;

/// Handle to one sink's delivery chain.
#[derive(Clone)]
pub struct SinkHandle {
    /// Human-readable name for logging
    name: String,

    /// Sender feeding the chain's bounded buffer
    sender: mpsc::Sender<Arc<MetricElement>>,
}

impl SinkHandle {
    /// Create a handle from a sink name and the chain's buffer sender.
    #[inline]
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<Arc<MetricElement>>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// The sink's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send an element, waiting while the buffer is full.
    ///
    /// Waiting is the intended backpressure: delivery is delayed, never
    /// dropped. Fails only when the chain's delivery task has exited.
    #[inline]
    pub async fn send(&self, element: Arc<MetricElement>) -> Result<(), Arc<MetricElement>> {
        self.sender.send(element).await.map_err(|e| e.0)
    }

    /// Whether the chain's delivery task has exited.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Maximum capacity of the buffer ahead of the sink.
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_handle_creation() {
        let (tx, _rx) = mpsc::channel::<Arc<MetricElement>>(3);
        let handle = SinkHandle::new("test_sink", tx);

        assert_eq!(handle.name(), "test_sink");
        assert_eq!(handle.buffer_capacity(), 3);
        assert!(!handle.is_closed());
    }

    #[test]
    fn test_sink_handle_closed_detection() {
        let (tx, rx) = mpsc::channel::<Arc<MetricElement>>(3);
        let handle = SinkHandle::new("test", tx);

        assert!(!handle.is_closed());
        drop(rx);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_sink_handle_debug() {
        let (tx, _rx) = mpsc::channel::<Arc<MetricElement>>(3);
        let handle = SinkHandle::new("debug_sink", tx);

        let debug = format!("{handle:?}");
        assert!(debug.contains("SinkHandle"));
        assert!(debug.contains("debug_sink"));
    }
}
