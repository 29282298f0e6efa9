//! The session lifecycle manager.
//!
//! This is the central piece of the crate. It is responsible for:
//! - Issuing create/find/join/destroy calls to the [`SessionProvider`]
//! - Pairing every accepted call with a one-shot, generation-tagged
//!   completion registration
//! - Deferring a create behind a destroy when a session already exists
//! - Publishing exactly one outcome per issued call on the
//!   [`NotificationBus`]
//!
//! # Concurrency note
//!
//! Public operations are non-blocking and may be called from any thread.
//! Completions may arrive on a different thread than the one that issued
//! the call (the backend's I/O context), so all bookkeeping lives behind a
//! mutex that is held only across short state mutations. It is never held
//! across a provider call or a bus publish, which keeps re-entrant
//! completion callbacks (the destroy-then-recreate chain) deadlock-free.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use lobbyforge_notify::NotificationBus;
use lobbyforge_provider::{
    CompleteOnce, FindOutcome, JoinOutcome, OperationKind, SessionProvider,
    SessionSearchQuery, SessionSearchResult, SessionSettings,
};

use crate::{LifecycleConfig, OperationFailure};

// ---------------------------------------------------------------------------
// Bookkeeping types
// ---------------------------------------------------------------------------

/// Generation tag for one registered completion handler.
///
/// Tokens are never reused. A completion whose token no longer matches the
/// current registration for its kind is stale (deregistered after a
/// synchronous rejection, or superseded by a newer same-kind call) and is
/// discarded without publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HandlerToken(u64);

/// Deferred parameters for a create that must wait for a destroy.
///
/// Captured when a create call finds an existing session; consumed by the
/// destroy completion. Non-empty only while that destroy is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecreateIntent {
    /// Player slots for the deferred create.
    pub num_connections: u32,
    /// Match type for the deferred create.
    pub match_type: String,
}

/// One registration slot per operation kind.
#[derive(Debug, Default)]
struct PendingSlots {
    create: Option<HandlerToken>,
    find: Option<HandlerToken>,
    join: Option<HandlerToken>,
    destroy: Option<HandlerToken>,
    start: Option<HandlerToken>,
}

impl PendingSlots {
    fn slot_mut(&mut self, kind: OperationKind) -> &mut Option<HandlerToken> {
        match kind {
            OperationKind::Create => &mut self.create,
            OperationKind::Find => &mut self.find,
            OperationKind::Join => &mut self.join,
            OperationKind::Destroy => &mut self.destroy,
            OperationKind::Start => &mut self.start,
        }
    }

    fn slot(&self, kind: OperationKind) -> Option<HandlerToken> {
        match kind {
            OperationKind::Create => self.create,
            OperationKind::Find => self.find,
            OperationKind::Join => self.join,
            OperationKind::Destroy => self.destroy,
            OperationKind::Start => self.start,
        }
    }
}

/// Mutable manager state, guarded by one mutex.
#[derive(Debug, Default)]
struct LifecycleState {
    pending: PendingSlots,
    recreate_intent: Option<RecreateIntent>,
    last_settings: Option<SessionSettings>,
    last_query: Option<SessionSearchQuery>,
    next_token: u64,
}

impl LifecycleState {
    /// Registers a new in-flight call of `kind`, superseding any earlier
    /// one of the same kind.
    fn register(&mut self, kind: OperationKind) -> HandlerToken {
        self.next_token += 1;
        let token = HandlerToken(self.next_token);
        if self.pending.slot_mut(kind).replace(token).is_some() {
            tracing::debug!(
                %kind,
                "superseding in-flight call; its completion will be discarded"
            );
        }
        token
    }
}

// ---------------------------------------------------------------------------
// SessionLifecycleManager
// ---------------------------------------------------------------------------

/// Coordinates single-shot session operations against a provider backend.
///
/// ## Lifecycle of one operation
///
/// ```text
/// operation() ──→ register handler ──→ provider call
///                                          │
///                 ┌── rejected synchronously: deregister, publish failure
///                 │
///                 └── accepted: completion fires once, out of band
///                         │
///                         └──→ deregister, publish outcome
/// ```
///
/// The one sanctioned chain: a create that finds an existing session
/// records a [`RecreateIntent`] and issues a destroy instead; the destroy's
/// successful completion consumes the intent and re-enters create.
pub struct SessionLifecycleManager {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Option<Arc<dyn SessionProvider>>,
    bus: NotificationBus,
    config: LifecycleConfig,
    state: Mutex<LifecycleState>,
}

impl SessionLifecycleManager {
    /// Creates a manager driving the given provider.
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider: Some(provider),
                bus: NotificationBus::new(),
                config,
                state: Mutex::new(LifecycleState::default()),
            }),
        }
    }

    /// Creates a manager with no backend at all.
    ///
    /// Every operation short-circuits to its failure notification. Mirrors
    /// a host running without any online service available.
    pub fn without_provider(config: LifecycleConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider: None,
                bus: NotificationBus::new(),
                config,
                state: Mutex::new(LifecycleState::default()),
            }),
        }
    }

    /// The bus on which this manager publishes every outcome.
    pub fn notifications(&self) -> &NotificationBus {
        &self.inner.bus
    }

    /// Creates the named session with `num_public_connections` player
    /// slots, advertising `match_type`.
    ///
    /// If a session already exists, a destroy is issued instead and the
    /// create re-runs with these parameters once the destroy succeeds; the
    /// destroy and the eventual create each publish their own completion.
    /// The result arrives on
    /// [`create_complete`](NotificationBus::create_complete).
    pub fn create_session(
        &self,
        num_public_connections: u32,
        match_type: impl Into<String>,
    ) {
        Inner::create_session(
            &self.inner,
            num_public_connections,
            match_type.into(),
        );
    }

    /// Searches for joinable sessions, presence-filtered, returning at
    /// most `max_results`.
    ///
    /// The unfiltered result list arrives on
    /// [`find_complete`](NotificationBus::find_complete); an empty list is
    /// always reported as unsuccessful. Filtering by match type is the
    /// listener's job, via
    /// [`SessionSearchResult::matches_match_type`].
    pub fn find_sessions(&self, max_results: u32) {
        Inner::find_sessions(&self.inner, max_results);
    }

    /// Joins the session described by a search result. The outcome code
    /// arrives on [`join_complete`](NotificationBus::join_complete).
    pub fn join_session(&self, result: &SessionSearchResult) {
        Inner::join_session(&self.inner, result);
    }

    /// Destroys the named session. The outcome arrives on
    /// [`destroy_complete`](NotificationBus::destroy_complete).
    pub fn destroy_session(&self) {
        Inner::destroy_session(&self.inner);
    }

    /// Starts the session.
    ///
    /// Currently a deliberate no-op: nothing drives session start yet, so
    /// this neither calls the provider nor publishes on
    /// [`start_complete`](NotificationBus::start_complete). The signature
    /// and channel are kept for interface completeness.
    pub fn start_session(&self) {
        tracing::debug!("start session requested; start is currently a no-op");
    }

    /// Returns `true` if a call of `kind` is currently in flight.
    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.inner.lock_state().pending.slot(kind).is_some()
    }

    /// Returns `true` while a destroy issued on behalf of a deferred
    /// create is outstanding.
    pub fn has_recreate_intent(&self) -> bool {
        self.inner.lock_state().recreate_intent.is_some()
    }

    /// The settings of the most recently issued create call.
    pub fn last_settings(&self) -> Option<SessionSettings> {
        self.inner.lock_state().last_settings.clone()
    }

    /// The query of the most recently issued find call.
    pub fn last_query(&self) -> Option<SessionSearchQuery> {
        self.inner.lock_state().last_query.clone()
    }
}

// ---------------------------------------------------------------------------
// Inner: operations and completion handlers
// ---------------------------------------------------------------------------

impl Inner {
    // Poisoning can only come from a panic inside one of these short
    // bookkeeping sections; the state is still coherent, so recover it.
    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the registration for `kind` if `token` is still current.
    ///
    /// Returns `false` when the token is stale, meaning this path lost the
    /// race: either the completion already claimed the call, or a newer
    /// same-kind call superseded it. Whoever gets `false` must not
    /// publish.
    fn deregister(&self, kind: OperationKind, token: HandlerToken) -> bool {
        let mut state = self.lock_state();
        let slot = state.pending.slot_mut(kind);
        if *slot == Some(token) {
            *slot = None;
            true
        } else {
            tracing::debug!(%kind, "stale completion, discarding");
            false
        }
    }

    /// Wraps a completion handler for the provider: weakly tied to the
    /// manager so a completion that outlives it is silently dropped.
    fn completion<T, F>(self_: &Arc<Self>, handle: F) -> CompleteOnce<T>
    where
        T: Send + 'static,
        F: FnOnce(&Arc<Inner>, T) + Send + 'static,
    {
        let weak: Weak<Inner> = Arc::downgrade(self_);
        Box::new(move |payload| {
            if let Some(inner) = weak.upgrade() {
                handle(&inner, payload);
            }
        })
    }

    // -- create -----------------------------------------------------------

    fn create_session(
        self_: &Arc<Self>,
        num_public_connections: u32,
        match_type: String,
    ) {
        if let Err(e) =
            Self::begin_create(self_, num_public_connections, match_type)
        {
            tracing::warn!(error = %e, "create session did not start");
            self_.bus.create_complete.publish(&false);
        }
    }

    fn begin_create(
        self_: &Arc<Self>,
        num_public_connections: u32,
        match_type: String,
    ) -> Result<(), OperationFailure> {
        let provider = self_
            .provider
            .clone()
            .ok_or(OperationFailure::ProviderUnavailable)?;

        // An existing session forces a teardown first. Creation is
        // deferred: the destroy completion re-enters create with these
        // parameters.
        if provider
            .get_named_session(&self_.config.session_name)
            .is_some()
        {
            self_.lock_state().recreate_intent = Some(RecreateIntent {
                num_connections: num_public_connections,
                match_type,
            });
            tracing::info!(
                session = %self_.config.session_name,
                "existing session found, destroying before recreate"
            );
            Self::destroy_session(self_);
            return Ok(());
        }

        let settings = SessionSettings::for_backend(
            provider.backend(),
            num_public_connections,
            match_type,
            self_.config.build_id,
        );
        let token = {
            let mut state = self_.lock_state();
            state.last_settings = Some(settings.clone());
            state.register(OperationKind::Create)
        };

        let on_complete = Self::completion(self_, move |inner, success| {
            Self::on_create_complete(inner, token, success);
        });
        let accepted = provider.create_session(
            self_.config.local_user,
            &self_.config.session_name,
            &settings,
            on_complete,
        );
        if !accepted && self_.deregister(OperationKind::Create, token) {
            return Err(OperationFailure::CallRejected(OperationKind::Create));
        }
        Ok(())
    }

    fn on_create_complete(
        self_: &Arc<Self>,
        token: HandlerToken,
        success: bool,
    ) {
        if !self_.deregister(OperationKind::Create, token) {
            return;
        }
        if success {
            tracing::info!(
                session = %self_.config.session_name,
                "session created"
            );
        } else {
            tracing::warn!(
                error = %OperationFailure::AsyncFailure(OperationKind::Create),
                "create session failed"
            );
        }
        self_.bus.create_complete.publish(&success);
    }

    // -- find -------------------------------------------------------------

    fn find_sessions(self_: &Arc<Self>, max_results: u32) {
        if let Err(e) = Self::begin_find(self_, max_results) {
            tracing::warn!(error = %e, "find sessions did not start");
            self_.bus.find_complete.publish(&FindOutcome::empty());
        }
    }

    fn begin_find(
        self_: &Arc<Self>,
        max_results: u32,
    ) -> Result<(), OperationFailure> {
        let provider = self_
            .provider
            .clone()
            .ok_or(OperationFailure::ProviderUnavailable)?;

        let query = SessionSearchQuery {
            max_results,
            is_local_only: provider.backend().is_local_only(),
            presence_required: true,
        };
        let token = {
            let mut state = self_.lock_state();
            state.last_query = Some(query.clone());
            state.register(OperationKind::Find)
        };

        let on_complete = Self::completion(self_, move |inner, outcome| {
            Self::on_find_complete(inner, token, outcome);
        });
        let accepted = provider.find_sessions(
            self_.config.local_user,
            &query,
            on_complete,
        );
        if !accepted && self_.deregister(OperationKind::Find, token) {
            return Err(OperationFailure::CallRejected(OperationKind::Find));
        }
        Ok(())
    }

    fn on_find_complete(
        self_: &Arc<Self>,
        token: HandlerToken,
        outcome: FindOutcome,
    ) {
        if !self_.deregister(OperationKind::Find, token) {
            return;
        }
        // Zero results is a failure for listeners, whatever the backend's
        // own flag said.
        if outcome.results.is_empty() {
            tracing::debug!(
                error = %OperationFailure::EmptyResultSet,
                "find sessions completed empty"
            );
            self_.bus.find_complete.publish(&FindOutcome::empty());
            return;
        }
        tracing::info!(
            count = outcome.results.len(),
            success = outcome.success,
            "find sessions completed"
        );
        self_.bus.find_complete.publish(&outcome);
    }

    // -- join -------------------------------------------------------------

    fn join_session(self_: &Arc<Self>, result: &SessionSearchResult) {
        if let Err(e) = Self::begin_join(self_, result) {
            tracing::warn!(error = %e, "join session did not start");
            self_.bus.join_complete.publish(&JoinOutcome::UnknownError);
        }
    }

    fn begin_join(
        self_: &Arc<Self>,
        result: &SessionSearchResult,
    ) -> Result<(), OperationFailure> {
        let provider = self_
            .provider
            .clone()
            .ok_or(OperationFailure::ProviderUnavailable)?;

        let token = self_.lock_state().register(OperationKind::Join);
        let on_complete = Self::completion(self_, move |inner, outcome| {
            Self::on_join_complete(inner, token, outcome);
        });
        let accepted = provider.join_session(
            self_.config.local_user,
            &self_.config.session_name,
            result,
            on_complete,
        );
        if !accepted && self_.deregister(OperationKind::Join, token) {
            return Err(OperationFailure::CallRejected(OperationKind::Join));
        }
        Ok(())
    }

    fn on_join_complete(
        self_: &Arc<Self>,
        token: HandlerToken,
        outcome: JoinOutcome,
    ) {
        if !self_.deregister(OperationKind::Join, token) {
            return;
        }
        if outcome.is_success() {
            tracing::info!(
                session = %self_.config.session_name,
                "session joined"
            );
        } else {
            tracing::warn!(%outcome, "join session failed");
        }
        self_.bus.join_complete.publish(&outcome);
    }

    // -- destroy ----------------------------------------------------------

    fn destroy_session(self_: &Arc<Self>) {
        if let Err(e) = Self::begin_destroy(self_) {
            // A destroy that never started cannot satisfy a pending
            // recreate; drop the intent so it doesn't leak into an
            // unrelated later destroy.
            if self_.lock_state().recreate_intent.take().is_some() {
                tracing::warn!("destroy did not start, dropping recreate intent");
            }
            tracing::warn!(error = %e, "destroy session did not start");
            self_.bus.destroy_complete.publish(&false);
        }
    }

    fn begin_destroy(self_: &Arc<Self>) -> Result<(), OperationFailure> {
        let provider = self_
            .provider
            .clone()
            .ok_or(OperationFailure::ProviderUnavailable)?;

        let token = self_.lock_state().register(OperationKind::Destroy);
        let on_complete = Self::completion(self_, move |inner, success| {
            Self::on_destroy_complete(inner, token, success);
        });
        let accepted = provider
            .destroy_session(&self_.config.session_name, on_complete);
        if !accepted && self_.deregister(OperationKind::Destroy, token) {
            return Err(OperationFailure::CallRejected(OperationKind::Destroy));
        }
        Ok(())
    }

    fn on_destroy_complete(
        self_: &Arc<Self>,
        token: HandlerToken,
        success: bool,
    ) {
        if !self_.deregister(OperationKind::Destroy, token) {
            return;
        }

        // The only place one operation triggers another: a successful
        // destroy with a pending intent re-enters create. The intent is
        // consumed either way; a failed destroy must not leave it armed.
        let intent = self_.lock_state().recreate_intent.take();
        match intent {
            Some(intent) if success => {
                tracing::info!(
                    num_connections = intent.num_connections,
                    match_type = %intent.match_type,
                    "session destroyed, recreating"
                );
                Self::create_session(
                    self_,
                    intent.num_connections,
                    intent.match_type,
                );
            }
            Some(_) => {
                tracing::warn!("destroy failed, dropping recreate intent");
            }
            None => {}
        }

        // Listeners hear about the destroy even when a recreate was
        // chained; the create publishes its own completion separately.
        self_.bus.destroy_complete.publish(&success);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Collects payloads published on a bool channel.
    fn capture_bool(
        channel: &lobbyforge_notify::NotifyChannel<bool>,
    ) -> Arc<Mutex<Vec<bool>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        channel.subscribe(move |ok| sink.lock().unwrap().push(*ok));
        log
    }

    #[test]
    fn test_without_provider_create_publishes_failure() {
        let manager =
            SessionLifecycleManager::without_provider(LifecycleConfig::default());
        let log = capture_bool(&manager.notifications().create_complete);

        manager.create_session(4, "FreeForAll");

        assert_eq!(*log.lock().unwrap(), vec![false]);
        assert!(!manager.is_pending(OperationKind::Create));
    }

    #[test]
    fn test_without_provider_find_publishes_empty_failure() {
        let manager =
            SessionLifecycleManager::without_provider(LifecycleConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        manager
            .notifications()
            .find_complete
            .subscribe(move |outcome| sink.lock().unwrap().push(outcome.clone()));

        manager.find_sessions(100);

        let published = log.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert!(published[0].results.is_empty());
        assert!(!published[0].success);
    }

    #[test]
    fn test_start_session_is_noop() {
        let manager =
            SessionLifecycleManager::without_provider(LifecycleConfig::default());
        let log = capture_bool(&manager.notifications().start_complete);

        manager.start_session();

        assert!(log.lock().unwrap().is_empty());
        assert!(!manager.is_pending(OperationKind::Start));
    }

    #[test]
    fn test_fresh_manager_has_nothing_pending() {
        let manager =
            SessionLifecycleManager::without_provider(LifecycleConfig::default());
        for kind in [
            OperationKind::Create,
            OperationKind::Find,
            OperationKind::Join,
            OperationKind::Destroy,
            OperationKind::Start,
        ] {
            assert!(!manager.is_pending(kind), "{kind} should not be pending");
        }
        assert!(!manager.has_recreate_intent());
        assert!(manager.last_settings().is_none());
        assert!(manager.last_query().is_none());
    }
}
