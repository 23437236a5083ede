//! Type-keyed registration of handlers and behaviors.
//!
//! The registry is the wiring phase of the runtime: populate it at startup,
//! then hand it (behind an `Arc`) to the [`Sender`](crate::Sender) and
//! [`Publisher`](crate::Publisher). Registration captures the concrete
//! message and handler types in closures, so dispatch later needs no
//! runtime reflection beyond a `TypeId` lookup.
//!
//! Misconfiguration is a programming error: resolving a request type with
//! zero or more than one handler panics at dispatch time.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::messages::{Event, EventEnvelope, Handler, Request};
use crate::pipeline::{chain, AnyNext, AnyOutput, Behavior, BehaviorFor, ClosedBehavior};
use crate::responses::{DispatchResult, Success};

type EventInvoker = Arc<
    dyn Fn(
            EventEnvelope,
            Vec<Arc<dyn Behavior>>,
            CancellationToken,
        ) -> BoxFuture<'static, DispatchResult<Success>>
        + Send
        + Sync,
>;

/// One event subscription: the handler's name plus an erased entry point
/// that runs the behavior chain and the handler for a queued envelope.
#[derive(Clone)]
pub(crate) struct EventRegistration {
    pub(crate) name: &'static str,
    invoke: EventInvoker,
}

impl EventRegistration {
    pub(crate) fn run(
        &self,
        envelope: EventEnvelope,
        behaviors: Vec<Arc<dyn Behavior>>,
        ctx: CancellationToken,
    ) -> BoxFuture<'static, DispatchResult<Success>> {
        (self.invoke)(envelope, behaviors, ctx)
    }
}

/// Registration surface for handlers and behaviors.
///
/// ```
/// use async_trait::async_trait;
/// use mediary::{DispatchResult, Handler, Registry, Request};
/// use tokio_util::sync::CancellationToken;
///
/// struct Ping;
/// impl Request for Ping {
///     type Output = u32;
/// }
///
/// struct PingHandler;
/// #[async_trait]
/// impl Handler<Ping> for PingHandler {
///     async fn handle(&self, _: &Ping, _: CancellationToken) -> DispatchResult<u32> {
///         Ok(42)
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Ping, _>(PingHandler);
/// ```
#[derive(Default)]
pub struct Registry {
    requests: HashMap<TypeId, Vec<Box<dyn Any + Send + Sync>>>,
    events: HashMap<TypeId, Vec<EventRegistration>>,
    open: Vec<Arc<dyn Behavior>>,
    closed: HashMap<TypeId, Vec<Arc<dyn Behavior>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for request type `M`.
    ///
    /// Registration itself accepts duplicates; resolution enforces the
    /// exactly-one rule and panics on a conflict so the defect is reported
    /// with the offending message type named.
    pub fn register<M, H>(&mut self, handler: H)
    where
        M: Request,
        H: Handler<M>,
    {
        let handler: Arc<dyn Handler<M>> = Arc::new(handler);
        self.requests
            .entry(TypeId::of::<M>())
            .or_default()
            .push(Box::new(handler));
    }

    /// Subscribes a handler to event type `E`. Any number of handlers may
    /// observe the same event type; they run in subscription order under
    /// the sequential publishing strategy.
    pub fn subscribe<E, H>(&mut self, handler: H)
    where
        E: Event,
        H: Handler<E>,
    {
        let name = std::any::type_name::<H>();
        let handler: Arc<dyn Handler<E>> = Arc::new(handler);
        let invoke: EventInvoker = Arc::new(move |envelope, behaviors, ctx| {
            let handler = Arc::clone(&handler);
            async move {
                let Some(event) = envelope.downcast_arc::<E>() else {
                    panic!(
                        "subscription for {} received envelope of {}",
                        std::any::type_name::<E>(),
                        envelope.type_name()
                    );
                };
                let message = envelope.as_message();
                let event_ref: &E = &event;
                let handler_ctx = ctx.clone();
                let terminal: AnyNext<'_> = Box::new(move || {
                    async move {
                        let out = handler.handle(event_ref, handler_ctx).await?;
                        Ok(Box::new(out) as AnyOutput)
                    }
                    .boxed()
                });
                chain::invoke(&behaviors, message, terminal, ctx).await?;
                Ok(Success)
            }
            .boxed()
        });
        self.events
            .entry(TypeId::of::<E>())
            .or_default()
            .push(EventRegistration { name, invoke });
    }

    /// Appends an open behavior. Open behaviors wrap every dispatch, in
    /// the order they were added, outside all closed behaviors.
    pub fn add_behavior<B: Behavior>(&mut self, behavior: B) {
        self.open.push(Arc::new(behavior));
    }

    /// Appends a behavior bound to message type `M`.
    pub fn add_behavior_for<M, B>(&mut self, behavior: B)
    where
        M: Request,
        B: BehaviorFor<M>,
    {
        self.closed
            .entry(TypeId::of::<M>())
            .or_default()
            .push(Arc::new(ClosedBehavior::new(behavior)));
    }

    /// The one handler for request type `M`.
    ///
    /// # Panics
    ///
    /// Panics when zero or more than one handler is registered for `M`.
    pub(crate) fn request_handler<M: Request>(&self) -> Arc<dyn Handler<M>> {
        let entries = self
            .requests
            .get(&TypeId::of::<M>())
            .map(Vec::as_slice)
            .unwrap_or_default();
        match entries {
            [single] => match single.downcast_ref::<Arc<dyn Handler<M>>>() {
                Some(handler) => Arc::clone(handler),
                None => panic!(
                    "registry entry for {} holds a foreign handler type",
                    std::any::type_name::<M>()
                ),
            },
            [] => panic!(
                "no handler registered for request type {}",
                std::any::type_name::<M>()
            ),
            many => panic!(
                "{} handlers registered for request type {}; exactly one is required",
                many.len(),
                std::any::type_name::<M>()
            ),
        }
    }

    /// All subscriptions for the event type, in subscription order. Empty
    /// when nothing subscribed.
    pub(crate) fn event_registrations(&self, type_id: TypeId) -> Vec<EventRegistration> {
        self.events.get(&type_id).cloned().unwrap_or_default()
    }

    /// Behavior chain for a message type: open behaviors first, then the
    /// behaviors closed over that type, each group in registration order.
    pub(crate) fn behaviors_for(&self, type_id: TypeId) -> Vec<Arc<dyn Behavior>> {
        let closed = self.closed.get(&type_id).map(Vec::as_slice).unwrap_or_default();
        self.open.iter().chain(closed).cloned().collect()
    }

    /// Number of handlers subscribed to event type `E`.
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.events
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or_default()
    }
}
