//! Behavior chain: ordered cross-cutting steps around a handler.
//!
//! A dispatch runs through the behaviors registered for its message type in
//! registration order, then reaches the handler:
//!
//! ```text
//!   open #1 -> open #2 -> closed #1 -> ... -> handler
//!   <------- registration order, outermost first -------
//! ```
//!
//! Open behaviors ([`Behavior`]) see every message through a type-erased
//! [`MessageRef`]; closed behaviors ([`BehaviorFor`]) are bound to one
//! message type and see it concretely. A behavior short-circuits by
//! returning without invoking its continuation.
//!
//! ## Contents
//! - [`Behavior`] / [`BehaviorFor`] the two behavior contracts
//! - [`MessageRef`] erased read-only view of the in-flight message
//! - [`Next`] / [`AnyNext`] continuations handed to behaviors
//! - `chain` composition of a behavior slice over a terminal

mod behavior;
pub(crate) mod chain;

pub use behavior::{AnyNext, AnyOutput, Behavior, BehaviorFor, MessageRef, Next};
pub(crate) use behavior::ClosedBehavior;
