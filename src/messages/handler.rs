use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::messages::Request;
use crate::responses::DispatchResult;

/// Async unit of work bound to one message type.
///
/// Exactly one handler serves each request type; zero or more serve each
/// event type. The cancellation token is the runtime's shutdown signal:
/// long-running handlers should observe it at their own await points.
#[async_trait]
pub trait Handler<M: Request>: Send + Sync + 'static {
    async fn handle(&self, message: &M, ctx: CancellationToken) -> DispatchResult<M::Output>;
}
