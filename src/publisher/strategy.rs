use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::HandlerFailure;
use crate::responses::{DispatchResult, Failure, Success};

type Pipeline = (&'static str, BoxFuture<'static, DispatchResult<Success>>);

/// How a publish runs the handler pipelines for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishStrategy {
    /// Run pipelines one at a time, in subscription order; each must
    /// finish before the next starts.
    #[default]
    AwaitForEach,
    /// Spawn every pipeline and wait for all of them; total latency
    /// approaches the slowest pipeline.
    AwaitInParallel,
}

impl PublishStrategy {
    /// Stable short label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishStrategy::AwaitForEach => "await_for_each",
            PublishStrategy::AwaitInParallel => "await_in_parallel",
        }
    }

    /// Runs the pipelines and collects the failures, panics included.
    pub(crate) async fn execute(&self, pipelines: Vec<Pipeline>) -> Vec<HandlerFailure> {
        let mut failures = Vec::new();
        match self {
            PublishStrategy::AwaitForEach => {
                for (handler, fut) in pipelines {
                    if let Err(failure) = guarded(fut).await {
                        failures.push(HandlerFailure { handler, failure });
                    }
                }
            }
            PublishStrategy::AwaitInParallel => {
                let handles: Vec<_> = pipelines
                    .into_iter()
                    .map(|(handler, fut)| (handler, tokio::spawn(guarded(fut))))
                    .collect();
                for (handler, handle) in handles {
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(join) => Err(Failure::unhandled(join.to_string())),
                    };
                    if let Err(failure) = outcome {
                        failures.push(HandlerFailure { handler, failure });
                    }
                }
            }
        }
        failures
    }
}

/// Converts a pipeline panic into an `UnhandledException` failure so one
/// handler cannot take down the publish or its siblings.
async fn guarded(fut: BoxFuture<'static, DispatchResult<Success>>) -> DispatchResult<Success> {
    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(Failure::unhandled(panic_text(&panic))),
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {text}")
    } else if let Some(text) = panic.downcast_ref::<String>() {
        format!("handler panicked: {text}")
    } else {
        "handler panicked".to_string()
    }
}
