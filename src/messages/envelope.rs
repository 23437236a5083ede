use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::messages::Event;
use crate::pipeline::MessageRef;

/// Type-erased event, ready for queueing and fan-out.
///
/// The concrete event lives behind an `Arc<dyn Any>` so the queue and the
/// listener can carry heterogeneous events in one channel. The `Debug`
/// rendering of the event is captured at construction; it identifies the
/// event in retry and dead-letter diagnostics even after erasure.
///
/// Cloning is cheap: the payload and summary are shared.
#[derive(Clone)]
pub struct EventEnvelope {
    type_id: TypeId,
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
    summary: Arc<str>,
}

impl EventEnvelope {
    /// Wraps a concrete event.
    pub fn new<E: Event>(event: E) -> Self {
        let summary: Arc<str> = format!("{event:?}").into();
        Self {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            payload: Arc::new(event),
            summary,
        }
    }

    /// `TypeId` of the wrapped event.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the wrapped event type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `Debug` rendering of the event, captured at construction.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub(crate) fn summary_arc(&self) -> Arc<str> {
        Arc::clone(&self.summary)
    }

    /// Shared handle to the wrapped event, if it is an `E`.
    pub(crate) fn downcast_arc<E: Event>(&self) -> Option<Arc<E>> {
        Arc::clone(&self.payload).downcast::<E>().ok()
    }

    /// Borrowed erased view for the behavior chain.
    pub(crate) fn as_message(&self) -> MessageRef<'_> {
        MessageRef::erased(self.type_id, self.type_name, &*self.payload)
    }
}

impl fmt::Debug for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEnvelope")
            .field("type", &self.type_name)
            .field("event", &self.summary)
            .finish()
    }
}
