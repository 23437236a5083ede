//! Background consumer of the event queue.
//!
//! The listener loops on [`QueueReader::dequeue`] and publishes each item.
//! A failed publish is retried under a bounded budget:
//!
//! ```text
//!   dequeue -> publish -> ok ........ next item
//!                      -> err, attempt < max .. re-enqueue (or retry in place)
//!                      -> err, attempt = max .. dead-letter log, next item
//! ```
//!
//! Attempts count total deliveries, so `max_retries = 3` means the event
//! runs at most three times. An exhausted event is dropped after an
//! error-level log line; nothing else in the queue is affected.
//!
//! Two trade-offs of the tail re-enqueue to be aware of:
//! - a persistently failing event under [`RetryAction::MoveLast`] lands
//!   behind newer items each round, so those items delay its next attempt;
//! - the re-enqueue awaits queue capacity, and the listener is the sole
//!   consumer. With the queue full at that moment the loop parks until
//!   cancellation. Size `queue_capacity` to hold the expected retry
//!   backlog.
//!
//! A [`DeliveryHook`] observes the same transitions for tests and metrics.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::config::{Config, RetryAction};
use crate::error::PublishError;
use crate::messages::EventEnvelope;
use crate::publisher::Publisher;
use crate::queue::{QueueReader, QueueWriter};

/// Observer of delivery outcomes. All methods default to no-ops.
pub trait DeliveryHook: Send + Sync + 'static {
    /// A publish succeeded on the given attempt.
    fn on_delivered(&self, _envelope: &EventEnvelope, _attempt: u32) {}

    /// A publish failed and the event will be retried.
    fn on_retry(&self, _envelope: &EventEnvelope, _attempt: u32, _error: &PublishError) {}

    /// The retry budget is exhausted and the event is dropped.
    fn on_dead_letter(&self, _envelope: &EventEnvelope, _attempts: u32, _error: &PublishError) {}
}

struct NoopHook;

impl DeliveryHook for NoopHook {}

/// The dead-letter log line for an exhausted event.
pub(crate) fn dead_letter_message(max_retries: u32, event: &str) -> String {
    format!("Max retries {max_retries} reached for {event}.")
}

/// Queue consumer with bounded retry.
///
/// Holds the sole [`QueueReader`] plus a [`QueueWriter`] for tail
/// re-enqueues. Runs until cancelled or until every writer is dropped.
pub struct EventListener {
    publisher: Publisher,
    reader: QueueReader,
    writer: QueueWriter,
    max_retries: u32,
    retry_action: RetryAction,
    hook: Arc<dyn DeliveryHook>,
}

impl EventListener {
    pub fn new(publisher: Publisher, reader: QueueReader, writer: QueueWriter, cfg: &Config) -> Self {
        Self {
            publisher,
            reader,
            writer,
            max_retries: cfg.max_retries(),
            retry_action: cfg.retry_action,
            hook: Arc::new(NoopHook),
        }
    }

    /// Replaces the delivery hook.
    pub fn with_hook(mut self, hook: Arc<dyn DeliveryHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Spawns the listener loop on the current runtime.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    /// Consumes queue items until `token` fires or the queue closes.
    ///
    /// The publish in flight when cancellation arrives finishes first;
    /// only the dequeue of the next item is interrupted.
    pub async fn run(mut self, token: CancellationToken) {
        while let Some(mut item) = self.reader.dequeue(&token).await {
            loop {
                match self.publisher.publish_envelope(&item.envelope, &token).await {
                    Ok(()) => {
                        self.hook.on_delivered(&item.envelope, item.attempt);
                        break;
                    }
                    Err(err) if item.attempt >= self.max_retries => {
                        error!(
                            target: "mediary",
                            "{}",
                            dead_letter_message(self.max_retries, item.envelope.summary())
                        );
                        self.hook.on_dead_letter(&item.envelope, item.attempt, &err);
                        break;
                    }
                    Err(err) => {
                        warn!(
                            target: "mediary",
                            event = item.envelope.summary(),
                            attempt = item.attempt,
                            error = %err,
                            "event delivery failed, retrying"
                        );
                        self.hook.on_retry(&item.envelope, item.attempt, &err);
                        match self.retry_action {
                            RetryAction::ImmediateRetry => {
                                item.attempt += 1;
                            }
                            RetryAction::MoveLast => {
                                // On a closed or cancelled queue the retry is
                                // dropped with the rest of the backlog.
                                let _ = self.writer.push(item.next_attempt(), &token).await;
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
}
