//! Failure taxonomy for lifecycle operations.

use lobbyforge_provider::OperationKind;

/// Why a lifecycle operation failed.
///
/// Public operations never return this; every failure ends in a
/// notification publish on the operation's channel. The taxonomy exists so
/// the internal begin phase can report precisely what went wrong, and so
/// logs name the failure instead of a bare `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OperationFailure {
    /// No backend is configured. The call is never attempted and the
    /// failure is published synchronously.
    #[error("no session provider is configured")]
    ProviderUnavailable,

    /// The provider's synchronous accept/reject signal was false. The
    /// completion handler is deregistered without waiting; it must never
    /// fire for this call.
    #[error("provider rejected the {0} call")]
    CallRejected(OperationKind),

    /// The provider accepted the call but its completion reported failure.
    #[error("provider reported failure completing the {0} call")]
    AsyncFailure(OperationKind),

    /// A find completed with zero results. Normalized to an unsuccessful
    /// empty publish regardless of the provider's own success flag.
    #[error("session search returned no results")]
    EmptyResultSet,
}
