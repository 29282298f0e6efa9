//! Lifecycle manager configuration.

use lobbyforge_provider::{UserId, GAME_SESSION_NAME};
use serde::{Deserialize, Serialize};

/// Configuration for a [`SessionLifecycleManager`](crate::SessionLifecycleManager).
///
/// Host applications can override these when wiring the manager up;
/// the defaults match the contractual values the rest of the stack
/// expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// The well-known name for the one session this manager owns. Every
    /// create, lookup, join, and destroy uses this name.
    pub session_name: String,

    /// The local user on whose behalf provider calls are made.
    pub local_user: UserId,

    /// Build identifier stamped into session settings so independently
    /// launched builds can host and find each other.
    pub build_id: i32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            session_name: GAME_SESSION_NAME.to_string(),
            local_user: UserId(0),
            build_id: 1,
        }
    }
}
