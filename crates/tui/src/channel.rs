//! Fan-in conduit from tail workers to the render loop.
//!
//! Many producers, one consumer. Per-producer order is preserved; order across
//! producers is whatever the scheduler produces. The channel is bounded: a
//! sender suspends while the queue is full, so nothing is ever dropped.

use podtail_types::LogEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Queue depth used when the configuration does not override it.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Returned when the render loop has gone away.
#[derive(Debug, Error)]
#[error("event channel closed; dropped event for {source_key}")]
pub struct ChannelClosed {
    pub source_key: String,
}

/// Producer half. Clone one per worker.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::Sender<LogEvent>,
}

/// Consumer half, owned by the render loop.
#[derive(Debug)]
pub struct EventReceiver {
    inner: mpsc::Receiver<LogEvent>,
}

/// Create a bounded event channel.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (EventSender { inner: sender }, EventReceiver { inner: receiver })
}

impl EventSender {
    /// Enqueue `event`, waiting for room if the queue is full.
    pub async fn send(&self, event: LogEvent) -> Result<(), ChannelClosed> {
        self.inner.send(event).await.map_err(|error| ChannelClosed {
            source_key: error.0.source_key.to_string(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl EventReceiver {
    /// Wait for the next event. `None` once every sender is gone and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<LogEvent> {
        self.inner.recv().await
    }

    /// Take an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<LogEvent> {
        self.inner.try_recv().ok()
    }

    /// Stop accepting events. Queued events can still be received.
    pub fn close(&mut self) {
        self.inner.close();
    }
}
