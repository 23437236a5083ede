use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::messages::Request;
use crate::responses::DispatchResult;

/// Type-erased handler or chain output.
pub type AnyOutput = Box<dyn Any + Send>;

/// Type-erased continuation: runs the rest of the chain once, at most.
pub type AnyNext<'a> =
    Box<dyn FnOnce() -> BoxFuture<'a, DispatchResult<AnyOutput>> + Send + 'a>;

/// Read-only, type-erased view of the message flowing through the chain.
///
/// Open behaviors receive this instead of the concrete message. Behaviors
/// that only log or measure use [`type_name`](Self::type_name); behaviors
/// that inspect specific message types use
/// [`downcast_ref`](Self::downcast_ref).
#[derive(Clone, Copy)]
pub struct MessageRef<'a> {
    type_id: TypeId,
    type_name: &'static str,
    payload: &'a (dyn Any + Send + Sync),
}

impl<'a> MessageRef<'a> {
    /// View over a concrete message.
    pub(crate) fn of<M: Request>(message: &'a M) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            payload: message,
        }
    }

    /// View over an already erased payload.
    pub(crate) fn erased(
        type_id: TypeId,
        type_name: &'static str,
        payload: &'a (dyn Any + Send + Sync),
    ) -> Self {
        Self {
            type_id,
            type_name,
            payload,
        }
    }

    /// `TypeId` of the concrete message.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the concrete message type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The concrete message, if it is an `M`.
    pub fn downcast_ref<M: Request>(&self) -> Option<&'a M> {
        self.payload.downcast_ref::<M>()
    }
}

/// Cross-cutting step that applies to every message type.
///
/// Open behaviors wrap the continuation: work before `next()`, work after
/// it, or return early without calling it to short-circuit the dispatch.
/// The output box must be passed through untouched; only the chain's ends
/// know its concrete type.
#[async_trait]
pub trait Behavior: Send + Sync + 'static {
    async fn handle(
        &self,
        message: MessageRef<'_>,
        next: AnyNext<'_>,
        ctx: CancellationToken,
    ) -> DispatchResult<AnyOutput>;

    /// Name used in chain diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Typed continuation handed to a [`BehaviorFor`].
///
/// Consumed by [`run`](Self::run); dropping it instead short-circuits the
/// rest of the chain.
pub struct Next<'a, T> {
    inner: AnyNext<'a>,
    _output: PhantomData<fn() -> T>,
}

impl<'a, T: Send + 'static> Next<'a, T> {
    pub(crate) fn new(inner: AnyNext<'a>) -> Self {
        Self {
            inner,
            _output: PhantomData,
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self) -> DispatchResult<T> {
        let output = (self.inner)().await?;
        match output.downcast::<T>() {
            Ok(output) => Ok(*output),
            // Outputs are boxed from M::Output at the terminal and unboxed
            // here with the same type parameter, so a mismatch is a defect
            // in the chain itself, not a recoverable condition.
            Err(_) => panic!(
                "behavior chain produced a mismatched output type (expected {})",
                std::any::type_name::<T>()
            ),
        }
    }
}

/// Cross-cutting step bound to one message type.
///
/// Closed behaviors see the concrete message and the typed output of the
/// rest of the chain.
#[async_trait]
pub trait BehaviorFor<M: Request>: Send + Sync + 'static {
    async fn handle(
        &self,
        message: &M,
        next: Next<'_, M::Output>,
        ctx: CancellationToken,
    ) -> DispatchResult<M::Output>;

    /// Name used in chain diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapter presenting a [`BehaviorFor`] as an open [`Behavior`].
///
/// The registry stores the adapted form keyed by the message's `TypeId`, so
/// the downcast below only ever sees messages of the bound type.
pub(crate) struct ClosedBehavior<M: Request> {
    inner: Arc<dyn BehaviorFor<M>>,
}

impl<M: Request> ClosedBehavior<M> {
    pub(crate) fn new(inner: impl BehaviorFor<M>) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<M: Request> Behavior for ClosedBehavior<M> {
    async fn handle(
        &self,
        message: MessageRef<'_>,
        next: AnyNext<'_>,
        ctx: CancellationToken,
    ) -> DispatchResult<AnyOutput> {
        let Some(message) = message.downcast_ref::<M>() else {
            panic!(
                "behavior {} bound to {} consulted for message {}",
                self.inner.name(),
                std::any::type_name::<M>(),
                message.type_name()
            );
        };
        let output = self.inner.handle(message, Next::new(next), ctx).await?;
        Ok(Box::new(output) as AnyOutput)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
