//! Dispatch outcomes: success marker, failure descriptor, result alias.
//!
//! Every handler and behavior call in the runtime produces a
//! [`DispatchResult`]: either the expected output or a [`Failure`] describing
//! a business-level problem. Failures are plain values that travel back
//! through the pipeline; they are never panics.
//!
//! ## Contents
//! - [`Success`] zero-sized marker for operations with no meaningful output
//! - [`Failure`], [`FailureKind`], [`ValidationError`] failure descriptor
//! - [`DispatchResult`] the `Result<T, Failure>` alias used at every seam

mod failure;

pub use failure::{Failure, FailureKind, ValidationError};

/// Outcome of a handler or behavior invocation.
pub type DispatchResult<T> = Result<T, Failure>;

/// Marker for a successful operation with no payload.
///
/// Event handlers produce `Success`: the caller of a publish only ever
/// observes success or failure per handler, never a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Success;
