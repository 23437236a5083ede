//! Point-to-point request dispatch.
//!
//! [`Sender::send`] is the request side of the runtime: resolve the one
//! handler for the request type, wrap it in the behavior chain, run it,
//! and hand back the typed output.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::pipeline::{chain, AnyNext, AnyOutput, MessageRef};
use crate::registry::Registry;
use crate::messages::Request;
use crate::responses::DispatchResult;

/// Dispatches requests to their single registered handler.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Sender {
    registry: Arc<Registry>,
}

impl Sender {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Runs the request through its behavior chain and handler.
    ///
    /// # Panics
    ///
    /// Panics when zero or more than one handler is registered for `M`;
    /// that is a wiring defect, not a runtime condition.
    pub async fn send<M: Request>(
        &self,
        request: &M,
        ctx: &CancellationToken,
    ) -> DispatchResult<M::Output> {
        let handler = self.registry.request_handler::<M>();
        let behaviors = self.registry.behaviors_for(std::any::TypeId::of::<M>());
        let message = MessageRef::of(request);

        let handler_ctx = ctx.clone();
        let terminal: AnyNext<'_> = Box::new(move || {
            Box::pin(async move {
                let out = handler.handle(request, handler_ctx).await?;
                Ok(Box::new(out) as AnyOutput)
            })
        });

        let out = chain::invoke(&behaviors, message, terminal, ctx.clone()).await?;
        match out.downcast::<M::Output>() {
            Ok(out) => Ok(*out),
            Err(_) => panic!(
                "request pipeline for {} produced a mismatched output type",
                std::any::type_name::<M>()
            ),
        }
    }
}
