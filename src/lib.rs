//! # mediary
//!
//! **Mediary** is an in-process request/event dispatch runtime for Rust.
//!
//! It provides primitives to register async handlers per message type,
//! wrap dispatches in ordered cross-cutting behaviors, and deliver queued
//! events in the background with bounded retry. The crate is designed as a
//! building block for vertically sliced applications.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐        ┌──────────────┐
//!     │   Request    │        │    Event     │
//!     │ (one handler)│        │ (0..n hdlrs) │
//!     └──────┬───────┘        └──────┬───────┘
//!            ▼                       ▼
//!      ┌──────────┐     ┌────────────────────────────┐
//!      │  Sender  │     │ QueueWriter ──► mpsc queue │
//!      └────┬─────┘     │     (capacity: Config::    │
//!           │           │      queue_capacity)       │
//!           │           └─────────────┬──────────────┘
//!           │                         ▼
//!           │               ┌──────────────────┐
//!           │               │  EventListener   │
//!           │               │   (retry loop)   │
//!           │               └────────┬─────────┘
//!           │                        ▼
//!           │               ┌──────────────────┐
//!           │               │    Publisher     │
//!           │               │ (AwaitForEach /  │
//!           │               │ AwaitInParallel) │
//!           │               └────────┬─────────┘
//!           ▼                        ▼
//! ┌───────────────────────────────────────────────────┐
//! │  behavior chain (per handler, registration order) │
//! │    open #1 ─► open #2 ─► closed #1 ─► handler     │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ### Delivery lifecycle
//! ```text
//! QueueWriter::enqueue ──► queue (FIFO) ──► EventListener::run()
//!
//! loop {
//!   ├─► dequeue item (cancellable)
//!   ├─► Publisher::publish_envelope
//!   │       │
//!   │       ├─ Ok  ──► next item
//!   │       │
//!   │       └─ Err ──► attempt < max_retries:
//!   │                    ├─ RetryAction::MoveLast      ─► re-enqueue at tail
//!   │                    └─ RetryAction::ImmediateRetry ─► retry in place
//!   │                  attempt = max_retries:
//!   │                    └─ log "Max retries {N} reached for {event}."
//!   │                       drop item, next item
//!   │
//!   └─ exit conditions:
//!        - cancellation token fired
//!        - all queue writers dropped and queue drained
//! }
//! ```
//!
//! ## Features
//! | Area           | Description                                               | Key types / traits                    |
//! |----------------|-----------------------------------------------------------|---------------------------------------|
//! | **Messages**   | Declare requests and events as plain data types.          | [`Request`], [`Event`], [`Handler`]   |
//! | **Behaviors**  | Wrap dispatches in ordered cross-cutting steps.           | [`Behavior`], [`BehaviorFor`]         |
//! | **Dispatch**   | Send requests to their single handler.                    | [`Sender`]                            |
//! | **Fan-out**    | Publish events to all subscribers, two strategies.        | [`Publisher`], [`PublishStrategy`]    |
//! | **Queueing**   | Buffer events for background delivery with retry.         | [`QueueWriter`], [`EventListener`]    |
//! | **Outcomes**   | Expected failures as values, not panics.                  | [`Failure`], [`DispatchResult`]       |
//! | **Configuration** | Centralize runtime settings.                           | [`Config`]                            |
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use mediary::{Config, DispatchResult, Handler, Request, Runtime, Success};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! struct OrderPlaced {
//!     order_id: u64,
//! }
//!
//! impl Request for OrderPlaced {
//!     type Output = Success;
//! }
//!
//! struct SendReceipt;
//!
//! #[async_trait]
//! impl Handler<OrderPlaced> for SendReceipt {
//!     async fn handle(&self, event: &OrderPlaced, _ctx: CancellationToken) -> DispatchResult<Success> {
//!         println!("receipt for order {}", event.order_id);
//!         Ok(Success)
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = Runtime::builder(Config::default());
//!     builder.registry().subscribe::<OrderPlaced, _>(SendReceipt);
//!
//!     let mut runtime = builder.build();
//!     runtime.start();
//!
//!     let token = runtime.cancellation_token();
//!     runtime.queue().enqueue(OrderPlaced { order_id: 42 }, &token).await?;
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod listener;
mod messages;
mod pipeline;
mod publisher;
mod queue;
mod registry;
mod responses;
mod runtime;
mod sender;

// ---- Public re-exports ----

pub use config::{Config, RetryAction};
pub use error::{EnqueueError, HandlerFailure, PublishError};
pub use listener::{DeliveryHook, EventListener};
pub use messages::{Event, EventEnvelope, Handler, Request};
pub use pipeline::{AnyNext, AnyOutput, Behavior, BehaviorFor, MessageRef, Next};
pub use publisher::{PublishStrategy, Publisher};
pub use queue::{event_queue, QueueItem, QueueReader, QueueWriter};
pub use registry::Registry;
pub use responses::{DispatchResult, Failure, FailureKind, Success, ValidationError};
pub use runtime::{wait_for_shutdown_signal, Runtime, RuntimeBuilder};
pub use sender::Sender;
