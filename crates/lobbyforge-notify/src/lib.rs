//! Completion fan-out for Lobbyforge.
//!
//! The lifecycle core finishes every operation by publishing its outcome
//! on a typed multicast channel. This crate provides:
//!
//! 1. **[`NotifyChannel<T>`]** — an insertion-ordered subscriber list with
//!    snapshot-at-publish semantics and per-listener panic isolation.
//! 2. **[`NotificationBus`]** — the five channels, one per operation kind,
//!    bundled for the manager and its listeners.
//!
//! Listeners are decoupled from the publisher: the manager never knows who
//! subscribed, and a failing listener cannot starve the ones after it.

mod bus;
mod channel;

pub use bus::NotificationBus;
pub use channel::{NotifyChannel, SubscriptionId};
