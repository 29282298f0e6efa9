//! The provider trait: the contract every session backend fulfills.
//!
//! Lobbyforge doesn't implement session networking itself. Instead it
//! defines [`SessionProvider`]: five single-shot primitives, each returning
//! a synchronous accept/reject signal for the call itself and delivering
//! the eventual result through a one-shot completion handler. The host
//! application implements this trait over its online service; tests
//! implement it with a scripted mock.

use crate::{
    BackendKind, FindOutcome, JoinOutcome, SessionHandle,
    SessionSearchQuery, SessionSearchResult, SessionSettings, UserId,
};

/// A one-shot completion handler for a single provider call.
///
/// `FnOnce` makes the "exactly one firing" half of the contract structural:
/// a handler cannot be invoked twice. The cleanup half lives with the
/// caller, which pairs every handler with a registration it clears on
/// synchronous rejection so a late firing is discarded rather than
/// delivered.
///
/// `Send` because completion may arrive on whatever thread the backend's
/// I/O runs on.
pub type CompleteOnce<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The session-backend abstraction.
///
/// # Call contract
///
/// Every mutating primitive returns `bool`: `true` means the backend
/// accepted the call and will invoke `on_complete` exactly once, out of
/// band; `false` means the call was rejected outright and `on_complete`
/// must never fire. The two signals are distinct: an accepted call can
/// still complete unsuccessfully.
///
/// There is no cancellation. Once a call is accepted the caller waits for
/// its single completion; a backend that never completes leaves that call
/// pending forever, which is part of the upstream contract rather than
/// something this layer compensates for.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` so a provider can be shared behind an `Arc`
/// across the caller's thread and the backend's completion context.
pub trait SessionProvider: Send + Sync + 'static {
    /// Identifies the backend this provider talks to. Decides local-only
    /// behavior for sessions created and searched through it.
    fn backend(&self) -> BackendKind;

    /// Synchronously looks up a session by its well-known name.
    ///
    /// Returns the handle if such a session currently exists. Used by the
    /// lifecycle core to detect that a create must be preceded by a
    /// destroy.
    fn get_named_session(&self, session_name: &str) -> Option<SessionHandle>;

    /// Creates a named session with the given settings.
    fn create_session(
        &self,
        user: UserId,
        session_name: &str,
        settings: &SessionSettings,
        on_complete: CompleteOnce<bool>,
    ) -> bool;

    /// Searches for joinable sessions. Results arrive only through the
    /// completion handler, never through the return value.
    fn find_sessions(
        &self,
        user: UserId,
        query: &SessionSearchQuery,
        on_complete: CompleteOnce<FindOutcome>,
    ) -> bool;

    /// Joins a session previously returned by a find call.
    fn join_session(
        &self,
        user: UserId,
        session_name: &str,
        result: &SessionSearchResult,
        on_complete: CompleteOnce<JoinOutcome>,
    ) -> bool;

    /// Destroys the named session.
    fn destroy_session(
        &self,
        session_name: &str,
        on_complete: CompleteOnce<bool>,
    ) -> bool;

    /// Transitions the named session from lobby to in-progress.
    fn start_session(
        &self,
        session_name: &str,
        on_complete: CompleteOnce<bool>,
    ) -> bool;
}
