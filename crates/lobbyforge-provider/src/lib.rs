//! Session-backend abstraction for Lobbyforge.
//!
//! This crate defines the boundary between the lifecycle core and whatever
//! online-service backend actually performs session networking:
//!
//! 1. **The [`SessionProvider`] trait** — create, find, join, destroy, and
//!    start primitives, each with a synchronous accept/reject signal and a
//!    one-shot completion handler for the eventual async result.
//! 2. **The data types that cross that boundary** — session settings,
//!    search queries, search results, and outcome codes.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle Layer (above)  ← serializes calls, chains destroy-then-recreate
//!     ↕
//! Provider Layer (this crate)  ← defines the backend contract
//!     ↕
//! Online Service (external)  ← Steam, EOS, a loopback stub, a test mock
//! ```
//!
//! Nothing in this crate performs I/O. Concrete providers live with the
//! host application (or in tests); the lifecycle core only ever sees the
//! trait.

mod provider;
mod types;

pub use provider::{CompleteOnce, SessionProvider};
pub use types::{
    BackendKind, FindOutcome, JoinOutcome, OperationKind, SessionHandle,
    SessionSearchQuery, SessionSearchResult, SessionSettings, UserId,
    GAME_SESSION_NAME, MATCH_TYPE_KEY,
};
