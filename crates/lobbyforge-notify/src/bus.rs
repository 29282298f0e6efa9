//! The five-channel notification bus.

use lobbyforge_provider::{FindOutcome, JoinOutcome};

use crate::NotifyChannel;

/// One multicast channel per lifecycle operation.
///
/// The manager publishes exactly one payload per issued call on the
/// matching channel; listeners subscribe to whichever outcomes they care
/// about. Channels are independent: subscribing to `create_complete` says
/// nothing about `destroy_complete`, even when a destroy was issued on the
/// manager's own initiative to make room for a create.
///
/// Cloning the bus clones the channels, which share their subscriber
/// lists, so any clone can be used to subscribe or publish.
#[derive(Clone, Default)]
pub struct NotificationBus {
    /// Create finished; `true` on success.
    pub create_complete: NotifyChannel<bool>,

    /// Find finished; carries the unfiltered result list and the
    /// normalized success flag (empty results are always unsuccessful).
    pub find_complete: NotifyChannel<FindOutcome>,

    /// Join finished; carries the backend's outcome code.
    pub join_complete: NotifyChannel<JoinOutcome>,

    /// Destroy finished; `true` on success. Published even when the
    /// destroy was issued to make room for a deferred create.
    pub destroy_complete: NotifyChannel<bool>,

    /// Start finished; `true` on success. Present for interface
    /// completeness; nothing publishes here yet.
    pub start_complete: NotifyChannel<bool>,
}

impl NotificationBus {
    /// Creates a bus with empty channels.
    pub fn new() -> Self {
        Self::default()
    }
}
