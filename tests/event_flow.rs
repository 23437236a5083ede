//! End-to-end delivery scenarios against a running runtime: queueing before
//! and after listener start, bounded retry, and dead-letter diagnostics.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediary::{
    Config, DeliveryHook, DispatchResult, EventEnvelope, Failure, FailureKind, Handler,
    PublishError, Request, Runtime, RuntimeBuilder, Success,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct OrderShipped {
    order_id: u32,
}

impl Request for OrderShipped {
    type Output = Success;
}

/// Fails the first `fail_first` deliveries, succeeds afterwards.
struct Flaky {
    fail_first: u32,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl Handler<OrderShipped> for Flaky {
    async fn handle(&self, _: &OrderShipped, _: CancellationToken) -> DispatchResult<Success> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            Err(Failure::of(FailureKind::ConcurrencyError))
        } else {
            Ok(Success)
        }
    }
}

#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<String>>,
}

impl Recorder {
    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl DeliveryHook for Recorder {
    fn on_delivered(&self, _: &EventEnvelope, attempt: u32) {
        self.log.lock().unwrap().push(format!("delivered@{attempt}"));
    }

    fn on_retry(&self, _: &EventEnvelope, attempt: u32, _: &PublishError) {
        self.log.lock().unwrap().push(format!("retry@{attempt}"));
    }

    fn on_dead_letter(&self, _: &EventEnvelope, attempts: u32, _: &PublishError) {
        self.log.lock().unwrap().push(format!("dead@{attempts}"));
    }
}

fn flaky_runtime(fail_first: u32) -> (RuntimeBuilder, Arc<AtomicU32>, Arc<Recorder>) {
    let calls = Arc::new(AtomicU32::new(0));
    let hook = Arc::new(Recorder::default());
    let recorder: Arc<dyn DeliveryHook> = hook.clone();
    let mut builder = Runtime::builder(Config::default()).with_hook(recorder);
    builder.registry().subscribe::<OrderShipped, _>(Flaky {
        fail_first,
        calls: Arc::clone(&calls),
    });
    (builder, calls, hook)
}

async fn wait_for(calls: &AtomicU32, expected: u32) {
    for _ in 0..400 {
        if calls.load(Ordering::SeqCst) >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn event_enqueued_before_start_is_delivered_after_start() {
    let (builder, calls, hook) = flaky_runtime(0);
    let mut runtime = builder.build();
    let token = runtime.cancellation_token();

    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 1 }, &token)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    runtime.start();
    wait_for(&calls, 1).await;
    runtime.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(hook.entries(), vec!["delivered@1"]);
}

#[tokio::test]
async fn event_enqueued_while_running_is_delivered() {
    let (builder, calls, hook) = flaky_runtime(0);
    let mut runtime = builder.build();
    runtime.start();

    let token = runtime.cancellation_token();
    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 2 }, &token)
        .await
        .unwrap();

    wait_for(&calls, 1).await;
    runtime.shutdown().await;

    assert_eq!(hook.entries(), vec!["delivered@1"]);
}

#[tokio::test]
async fn failing_event_succeeds_on_the_third_attempt() {
    let (builder, calls, hook) = flaky_runtime(2);
    let mut runtime = builder.build();
    runtime.start();

    let token = runtime.cancellation_token();
    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 3 }, &token)
        .await
        .unwrap();

    wait_for(&calls, 3).await;
    runtime.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(hook.entries(), vec!["retry@1", "retry@2", "delivered@3"]);
}

#[tokio::test]
async fn exhausted_event_is_dropped_and_the_queue_keeps_flowing() {
    let (builder, calls, hook) = flaky_runtime(3);
    let mut runtime = builder.build();
    runtime.start();

    let token = runtime.cancellation_token();
    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 4 }, &token)
        .await
        .unwrap();
    wait_for(&calls, 3).await;

    // The handler's budget is spent, so the next event delivers cleanly.
    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 5 }, &token)
        .await
        .unwrap();
    wait_for(&calls, 4).await;
    runtime.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        hook.entries(),
        vec!["retry@1", "retry@2", "dead@3", "delivered@1"]
    );
}

/// `io::Write` into a shared buffer, for capturing subscriber output.
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn exhaustion_emits_exactly_one_error_level_log_line() {
    let buffer: Arc<Mutex<Vec<u8>>> = Arc::default();
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .without_time()
        .with_writer(move || SharedBuffer(Arc::clone(&writer)))
        .finish();
    // Thread-local default: the current-thread runtime polls the listener
    // task on this thread, so its diagnostics land in the buffer.
    let _guard = tracing::subscriber::set_default(subscriber);

    let (builder, calls, hook) = flaky_runtime(u32::MAX);
    let mut runtime = builder.build();
    runtime.start();

    let token = runtime.cancellation_token();
    runtime
        .queue()
        .enqueue(OrderShipped { order_id: 9 }, &token)
        .await
        .unwrap();
    wait_for(&calls, 3).await;
    runtime.shutdown().await;

    assert_eq!(hook.entries(), vec!["retry@1", "retry@2", "dead@3"]);

    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    let expected = "Max retries 3 reached for OrderShipped { order_id: 9 }.";
    assert_eq!(output.matches(expected).count(), 1, "log output: {output}");
    let line = output
        .lines()
        .find(|line| line.contains(expected))
        .unwrap_or_default();
    assert!(line.contains("ERROR"), "not error-level: {line}");
}
