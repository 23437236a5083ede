use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{AnyNext, AnyOutput, Behavior, MessageRef};
use crate::responses::DispatchResult;

/// Runs `behaviors` in slice order around `terminal`.
///
/// The first behavior is outermost; the terminal (the handler call) is
/// innermost. Each behavior receives a continuation for the remainder of
/// the slice, so returning without calling it short-circuits everything
/// further in, including the handler.
pub(crate) fn invoke<'a>(
    behaviors: &'a [Arc<dyn Behavior>],
    message: MessageRef<'a>,
    terminal: AnyNext<'a>,
    ctx: CancellationToken,
) -> BoxFuture<'a, DispatchResult<AnyOutput>> {
    match behaviors.split_first() {
        None => terminal(),
        Some((head, rest)) => {
            let next_ctx = ctx.clone();
            let next: AnyNext<'a> = Box::new(move || invoke(rest, message, terminal, next_ctx));
            head.handle(message, next, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Request;
    use crate::pipeline::{BehaviorFor, ClosedBehavior, Next};
    use crate::responses::{DispatchResult, Failure, FailureKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Probe {
        output: u32,
    }

    impl Request for Probe {
        type Output = u32;
    }

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Tag {
        label: &'static str,
        trace: Trace,
    }

    #[async_trait]
    impl Behavior for Tag {
        async fn handle(
            &self,
            _message: MessageRef<'_>,
            next: AnyNext<'_>,
            _ctx: CancellationToken,
        ) -> DispatchResult<AnyOutput> {
            self.trace.lock().unwrap().push(format!("{}:open", self.label));
            let out = next().await;
            self.trace.lock().unwrap().push(format!("{}:closed", self.label));
            out
        }
    }

    struct Reject {
        trace: Trace,
    }

    #[async_trait]
    impl Behavior for Reject {
        async fn handle(
            &self,
            _message: MessageRef<'_>,
            _next: AnyNext<'_>,
            _ctx: CancellationToken,
        ) -> DispatchResult<AnyOutput> {
            self.trace.lock().unwrap().push("reject".into());
            Err(Failure::of(FailureKind::NotAllowed))
        }
    }

    struct Doubler;

    #[async_trait]
    impl BehaviorFor<Probe> for Doubler {
        async fn handle(
            &self,
            _message: &Probe,
            next: Next<'_, u32>,
            _ctx: CancellationToken,
        ) -> DispatchResult<u32> {
            Ok(next.run().await? * 2)
        }
    }

    fn run_chain(
        behaviors: &[Arc<dyn Behavior>],
        probe: &Probe,
        trace: &Trace,
    ) -> DispatchResult<u32> {
        let message = MessageRef::of(probe);
        let output = probe.output;
        let trace = Arc::clone(trace);
        let terminal: AnyNext<'_> = Box::new(move || {
            Box::pin(async move {
                trace.lock().unwrap().push("handler".into());
                Ok(Box::new(output) as AnyOutput)
            })
        });
        let fut = invoke(behaviors, message, terminal, CancellationToken::new());
        futures::executor::block_on(async move {
            let out = fut.await?;
            Ok(*out.downcast::<u32>().unwrap())
        })
    }

    #[test]
    fn behaviors_open_in_order_and_close_in_reverse() {
        let trace: Trace = Arc::default();
        let behaviors: Vec<Arc<dyn Behavior>> = vec![
            Arc::new(Tag { label: "a", trace: Arc::clone(&trace) }),
            Arc::new(Tag { label: "b", trace: Arc::clone(&trace) }),
        ];

        let out = run_chain(&behaviors, &Probe { output: 21 }, &trace);

        assert_eq!(out.unwrap(), 21);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a:open", "b:open", "handler", "b:closed", "a:closed"]
        );
    }

    #[test]
    fn short_circuit_skips_handler_and_inner_behaviors() {
        let trace: Trace = Arc::default();
        let behaviors: Vec<Arc<dyn Behavior>> = vec![
            Arc::new(Tag { label: "a", trace: Arc::clone(&trace) }),
            Arc::new(Reject { trace: Arc::clone(&trace) }),
            Arc::new(Tag { label: "b", trace: Arc::clone(&trace) }),
        ];

        let out = run_chain(&behaviors, &Probe { output: 1 }, &trace);

        assert_eq!(out.unwrap_err().kind, FailureKind::NotAllowed);
        assert_eq!(*trace.lock().unwrap(), vec!["a:open", "reject", "a:closed"]);
    }

    #[test]
    fn short_circuit_repeats_identically() {
        let trace: Trace = Arc::default();
        let behaviors: Vec<Arc<dyn Behavior>> = vec![
            Arc::new(Tag { label: "a", trace: Arc::clone(&trace) }),
            Arc::new(Reject { trace: Arc::clone(&trace) }),
        ];
        let probe = Probe { output: 1 };

        let first = run_chain(&behaviors, &probe, &trace);
        let after_first = trace.lock().unwrap().clone();
        let second = run_chain(&behaviors, &probe, &trace);

        assert_eq!(first.unwrap_err().kind, FailureKind::NotAllowed);
        assert_eq!(second.unwrap_err().kind, FailureKind::NotAllowed);
        assert_eq!(after_first, vec!["a:open", "reject", "a:closed"]);
        let full = trace.lock().unwrap().clone();
        assert_eq!(full[after_first.len()..], after_first[..]);
    }

    #[test]
    fn closed_behavior_sees_the_typed_output() {
        let trace: Trace = Arc::default();
        let behaviors: Vec<Arc<dyn Behavior>> = vec![Arc::new(ClosedBehavior::new(Doubler))];

        let out = run_chain(&behaviors, &Probe { output: 10 }, &trace);

        assert_eq!(out.unwrap(), 20);
    }

    #[test]
    fn empty_chain_runs_the_terminal_alone() {
        let trace: Trace = Arc::default();
        let out = run_chain(&[], &Probe { output: 5 }, &trace);

        assert_eq!(out.unwrap(), 5);
        assert_eq!(*trace.lock().unwrap(), vec!["handler"]);
    }
}
