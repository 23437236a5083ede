//! Message contracts and their type-erased transport form.
//!
//! ## Contents
//! - [`Request`] / [`Event`] marker traits for dispatchable messages
//! - [`Handler`] the async unit of work bound to one message type
//! - [`EventEnvelope`] type-erased event for queueing and fan-out

mod envelope;
mod handler;
mod request;

pub use envelope::EventEnvelope;
pub use handler::Handler;
pub use request::{Event, Request};
