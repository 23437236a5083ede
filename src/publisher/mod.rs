//! Event fan-out to zero or more subscribed handlers.
//!
//! A publish looks up every subscription for the event type, builds one
//! behavior chain per handler, and runs the chains under the configured
//! [`PublishStrategy`]. Handlers are isolated from each other: a failing
//! or panicking pipeline never stops its siblings, and everything that
//! went wrong comes back aggregated in one [`PublishError`].
//!
//! Publishing an event nobody subscribed to is a successful no-op.

mod strategy;

pub use strategy::PublishStrategy;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{HandlerFailure, PublishError};
use crate::messages::{Event, EventEnvelope};
use crate::registry::Registry;

/// Fans events out to their subscribed handlers.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Publisher {
    registry: Arc<Registry>,
    strategy: PublishStrategy,
}

impl Publisher {
    pub fn new(registry: Arc<Registry>, strategy: PublishStrategy) -> Self {
        Self { registry, strategy }
    }

    /// The configured publishing strategy.
    pub fn strategy(&self) -> PublishStrategy {
        self.strategy
    }

    /// Publishes an event to every handler subscribed to its type.
    ///
    /// Returns `Ok(())` only when every handler pipeline succeeded (or no
    /// handler is subscribed). A caught handler panic is reported as an
    /// [`UnhandledException`](crate::FailureKind::UnhandledException)
    /// failure alongside ordinary ones.
    pub async fn publish<E: Event>(
        &self,
        event: E,
        ctx: &CancellationToken,
    ) -> Result<(), PublishError> {
        self.publish_envelope(&EventEnvelope::new(event), ctx).await
    }

    /// Publishes an already wrapped event. Used by the queue listener,
    /// which holds envelopes rather than concrete events.
    pub async fn publish_envelope(
        &self,
        envelope: &EventEnvelope,
        ctx: &CancellationToken,
    ) -> Result<(), PublishError> {
        let registrations = self.registry.event_registrations(envelope.type_id());
        if registrations.is_empty() {
            return Ok(());
        }

        let total = registrations.len();
        let mut pipelines = Vec::with_capacity(total);
        for registration in registrations {
            let behaviors = self.registry.behaviors_for(envelope.type_id());
            let fut = registration.run(envelope.clone(), behaviors, ctx.child_token());
            pipelines.push((registration.name, fut));
        }

        let failures: Vec<HandlerFailure> = self.strategy.execute(pipelines).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError {
                event: envelope.summary_arc(),
                total,
                failures,
            })
        }
    }
}
