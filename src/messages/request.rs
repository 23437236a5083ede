use std::fmt::Debug;

use crate::responses::Success;

/// A dispatchable message with a declared output type.
///
/// Implement this on plain data types and register a [`Handler`] for them
/// in the [`Registry`]. The output is what a successful dispatch through
/// [`Sender::send`] yields.
///
/// [`Handler`]: crate::Handler
/// [`Registry`]: crate::Registry
/// [`Sender::send`]: crate::Sender::send
pub trait Request: Send + Sync + 'static {
    /// Value produced by the handler on success.
    type Output: Send + 'static;
}

/// A request whose only meaningful outcome is [`Success`].
///
/// Events are published rather than sent: zero or more handlers observe
/// them, and the `Debug` rendering identifies the event in queue and
/// dead-letter diagnostics.
pub trait Event: Request<Output = Success> + Debug {}

impl<E> Event for E where E: Request<Output = Success> + Debug {}
