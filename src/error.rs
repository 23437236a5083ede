//! Infrastructure errors, as opposed to business [`Failure`]s.
//!
//! [`Failure`](crate::Failure) describes a problem with the operation
//! itself; the types here describe problems with moving messages around.

use std::sync::Arc;

use thiserror::Error;

use crate::responses::Failure;

/// Why an event could not be placed on the queue.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The reader side was dropped; the runtime is shutting down or gone.
    #[error("event queue is closed")]
    Closed,
    /// The cancellation token fired while waiting for queue capacity.
    #[error("enqueue cancelled")]
    Cancelled,
}

impl EnqueueError {
    /// Stable short label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EnqueueError::Closed => "closed",
            EnqueueError::Cancelled => "cancelled",
        }
    }
}

/// One event handler pipeline that failed during a publish.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    /// Type name of the failed handler.
    pub handler: &'static str,
    /// The failure it produced (or the caught panic, as
    /// [`FailureKind::UnhandledException`](crate::FailureKind::UnhandledException)).
    pub failure: Failure,
}

/// Outcome of a publish where at least one handler pipeline failed.
///
/// Handlers are independent: every pipeline runs to completion regardless
/// of its siblings, and this error aggregates everything that went wrong.
#[derive(Debug, Clone, Error)]
#[error("{}/{} handler pipeline(s) failed for {}", .failures.len(), .total, .event)]
pub struct PublishError {
    /// `Debug` rendering of the published event.
    pub event: Arc<str>,
    /// How many handler pipelines ran.
    pub total: usize,
    /// The pipelines that failed, in completion order.
    pub failures: Vec<HandlerFailure>,
}
