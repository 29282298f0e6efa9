//! Data types that cross the provider boundary.
//!
//! Everything here is either handed TO the backend (settings, queries) or
//! comes back FROM it (search results, outcome codes). The lifecycle core
//! builds and forwards these; it never mutates what the backend returned.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The well-known name under which the local session is created, looked up,
/// and destroyed. One of the two bit-exact contractual strings of the core.
pub const GAME_SESSION_NAME: &str = "GameSession";

/// The attribute key that advertises a session's match type. The other
/// contractual string: listeners filter search results on this key.
pub const MATCH_TYPE_KEY: &str = "MatchType";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a local user on this machine.
///
/// Newtype over `u64` so a user can't be confused with a session handle in
/// a call signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// An opaque handle to a session tracked by the provider.
///
/// The core never looks inside a handle; it only receives them from lookups
/// and search results and passes them back to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Backend identity
// ---------------------------------------------------------------------------

/// Which kind of backend the provider is talking to.
///
/// The lifecycle core inspects this exactly once per create/find call, to
/// decide whether the session is visible only on the local network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// The offline loopback backend. No online service is present, so
    /// sessions are LAN-only and nothing is advertised externally.
    Null,

    /// A real online service (Steam, EOS, ...). Sessions are
    /// internet-visible and presence-advertised.
    OnlineService,
}

impl BackendKind {
    /// Returns `true` if sessions on this backend can only be local.
    pub fn is_local_only(&self) -> bool {
        matches!(self, Self::Null)
    }
}

// ---------------------------------------------------------------------------
// SessionSettings
// ---------------------------------------------------------------------------

/// Settings for a session create call.
///
/// Built once per create, owned by that in-flight call, and never mutated
/// afterwards. A later create call gets a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// How many players can join the session.
    pub max_public_connections: u32,

    /// Advertised string attributes. Always carries at least the
    /// [`MATCH_TYPE_KEY`] entry.
    pub attributes: HashMap<String, String>,

    /// LAN-only session. Decided by the backend kind, not by the caller.
    pub is_local_only: bool,

    /// Whether the online service should advertise the session.
    pub advertise: bool,

    /// Whether players may join while the match is already running.
    pub allow_join_in_progress: bool,

    /// Build identifier, so separately launched builds can host and find
    /// each other.
    pub build_id: i32,
}

impl SessionSettings {
    /// Builds the settings for a create call against the given backend.
    ///
    /// A `Null` backend yields a local-only session; any other backend
    /// yields an internet-visible, presence-advertised session that allows
    /// join-in-progress.
    pub fn for_backend(
        backend: BackendKind,
        num_public_connections: u32,
        match_type: String,
        build_id: i32,
    ) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(MATCH_TYPE_KEY.to_string(), match_type);

        Self {
            max_public_connections: num_public_connections,
            attributes,
            is_local_only: backend.is_local_only(),
            advertise: true,
            allow_join_in_progress: true,
            build_id,
        }
    }

    /// Returns the advertised match type, if one was set.
    pub fn match_type(&self) -> Option<&str> {
        self.attributes.get(MATCH_TYPE_KEY).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// SessionSearchQuery
// ---------------------------------------------------------------------------

/// Parameters for a find call.
///
/// Created fresh per find; a later find call supersedes (never merges with)
/// an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSearchQuery {
    /// Cap on the number of results the backend should return.
    pub max_results: u32,

    /// Restrict the search to the local network.
    pub is_local_only: bool,

    /// Only match sessions advertised with presence.
    pub presence_required: bool,
}

// ---------------------------------------------------------------------------
// SessionSearchResult
// ---------------------------------------------------------------------------

/// A single session found by the backend.
///
/// Read-only from the core's point of view: the handle and attributes come
/// straight from the provider and are only filtered and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSearchResult {
    handle: SessionHandle,
    attributes: HashMap<String, String>,
}

impl SessionSearchResult {
    /// Wraps a backend result. Called by provider implementations, not by
    /// the lifecycle core.
    pub fn new(
        handle: SessionHandle,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self { handle, attributes }
    }

    /// The opaque handle to pass back to a join call.
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// Looks up a single advertised attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns `true` if this result advertises the wanted match type.
    ///
    /// Compares against the attribute value actually stored on the result.
    /// A result with no match-type attribute matches nothing.
    pub fn matches_match_type(&self, want: &str) -> bool {
        self.attribute(MATCH_TYPE_KEY) == Some(want)
    }
}

// ---------------------------------------------------------------------------
// Completion payloads
// ---------------------------------------------------------------------------

/// The payload of a find completion: the result list plus the backend's
/// success flag.
///
/// The lifecycle core normalizes an empty list to `success: false` before
/// publishing, regardless of what the backend reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOutcome {
    /// Every session the backend found, unfiltered.
    pub results: Vec<SessionSearchResult>,

    /// The backend's own verdict on the search.
    pub success: bool,
}

impl FindOutcome {
    /// An empty, unsuccessful outcome. Used for every find failure path.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            success: false,
        }
    }
}

/// The outcome of a join call, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// Joined; the caller may now resolve a connect address and travel.
    Success,
    /// The session has no free player slots.
    SessionIsFull,
    /// The session disappeared between find and join.
    SessionDoesNotExist,
    /// Joined, but the backend could not resolve a connect address.
    CouldNotRetrieveAddress,
    /// The local user is already in a session.
    AlreadyInSession,
    /// Anything else, including calls that could not even start.
    UnknownError,
}

impl JoinOutcome {
    /// Returns `true` only for [`JoinOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::SessionIsFull => "SessionIsFull",
            Self::SessionDoesNotExist => "SessionDoesNotExist",
            Self::CouldNotRetrieveAddress => "CouldNotRetrieveAddress",
            Self::AlreadyInSession => "AlreadyInSession",
            Self::UnknownError => "UnknownError",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// The five provider primitives the lifecycle core drives.
///
/// Used for pending-call bookkeeping and in failure reports; at most one
/// call per kind is considered current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Find,
    Join,
    Destroy,
    Start,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Find => "find",
            Self::Join => "join",
            Self::Destroy => "destroy",
            Self::Start => "start",
        };
        write!(f, "{name}")
    }
}
