//! # Lobbyforge
//!
//! Session lifecycle coordination for multiplayer lobbies.
//!
//! The host application (a menu, a matchmaking screen, a test harness)
//! drives five operations: create, find, join, destroy, and start a named
//! multiplayer session. [`SessionLifecycleManager`] serializes those
//! operations against a pluggable
//! [`SessionProvider`](lobbyforge_provider::SessionProvider) backend,
//! remembers enough to safely recreate a session after a forced teardown,
//! and reports every outcome on the
//! [`NotificationBus`](lobbyforge_notify::NotificationBus) so arbitrarily
//! many decoupled listeners can react.
//!
//! ```text
//! Caller / UI (above)  ← invokes operations, subscribes to outcomes
//!     ↕
//! Lifecycle Layer (this crate)  ← pending-call bookkeeping, destroy-then-recreate
//!     ↕
//! Provider Layer (below)  ← the actual session backend
//! ```
//!
//! Operations never block and never return errors: failures that prevent a
//! call from even starting are published on the same channel as async
//! failures, so a caller has exactly one place to observe each result.

mod config;
mod error;
mod manager;

pub use config::LifecycleConfig;
pub use error::OperationFailure;
pub use manager::{RecreateIntent, SessionLifecycleManager};
