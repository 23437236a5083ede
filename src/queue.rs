//! Bounded in-memory FIFO queue for event envelopes.
//!
//! Built on a tokio mpsc channel: writers are cheap clones, the reader is
//! single and owned by the [`EventListener`](crate::EventListener). A full
//! queue exerts backpressure by parking the writer until capacity frees up
//! or its cancellation token fires.
//!
//! Items remember their delivery attempt so the listener's retry loop can
//! re-enqueue them at the tail without losing count.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::EnqueueError;
use crate::messages::{Event, EventEnvelope};

/// A queued envelope plus its delivery attempt, starting at 1.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub envelope: EventEnvelope,
    pub attempt: u32,
}

impl QueueItem {
    fn first(envelope: EventEnvelope) -> Self {
        Self { envelope, attempt: 1 }
    }

    /// Copy of this item for the next delivery attempt.
    pub(crate) fn next_attempt(&self) -> Self {
        Self {
            envelope: self.envelope.clone(),
            attempt: self.attempt + 1,
        }
    }
}

/// Creates a queue with the given capacity and splits it into its writer
/// and reader halves. Capacity is clamped to at least 1.
pub fn event_queue(capacity: usize) -> (QueueWriter, QueueReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueWriter { tx }, QueueReader { rx })
}

/// Producer half of the event queue.
#[derive(Clone)]
pub struct QueueWriter {
    tx: mpsc::Sender<QueueItem>,
}

impl QueueWriter {
    /// Wraps the event in an envelope and appends it.
    ///
    /// Waits for capacity when the queue is full; returns
    /// [`EnqueueError::Cancelled`] if `ctx` fires first.
    pub async fn enqueue<E: Event>(
        &self,
        event: E,
        ctx: &CancellationToken,
    ) -> Result<(), EnqueueError> {
        self.push(QueueItem::first(EventEnvelope::new(event)), ctx).await
    }

    pub(crate) async fn push(
        &self,
        item: QueueItem,
        ctx: &CancellationToken,
    ) -> Result<(), EnqueueError> {
        tokio::select! {
            sent = self.tx.send(item) => sent.map_err(|_| EnqueueError::Closed),
            _ = ctx.cancelled() => Err(EnqueueError::Cancelled),
        }
    }
}

/// Consumer half of the event queue. Exactly one exists per queue.
pub struct QueueReader {
    rx: mpsc::Receiver<QueueItem>,
}

impl QueueReader {
    /// Next item in FIFO order.
    ///
    /// Returns `None` when every writer is gone and the queue is drained,
    /// or when `ctx` fires.
    pub async fn dequeue(&mut self, ctx: &CancellationToken) -> Option<QueueItem> {
        tokio::select! {
            item = self.rx.recv() => item,
            _ = ctx.cancelled() => None,
        }
    }
}
