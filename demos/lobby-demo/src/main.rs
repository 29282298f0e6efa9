//! A complete lobby flow against an in-process loopback provider.
//!
//! The loopback backend completes every call synchronously, which makes
//! the whole lifecycle observable from a plain `main`: create, forced
//! destroy-then-recreate, find, filter by match type, join, destroy.
//!
//! Run with `RUST_LOG=debug cargo run -p lobby-demo` for the manager's
//! internal tracing alongside the listener output.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lobbyforge::{LifecycleConfig, SessionLifecycleManager};
use lobbyforge_provider::{
    BackendKind, CompleteOnce, FindOutcome, JoinOutcome, SessionHandle,
    SessionProvider, SessionSearchQuery, SessionSearchResult,
    SessionSettings, UserId, MATCH_TYPE_KEY,
};

/// An offline backend that tracks one named session in memory and
/// completes every call before returning.
struct LoopbackProvider {
    next_handle: AtomicU64,
    /// The one session this host may own, plus its advertised match type.
    hosted: Mutex<Option<(SessionHandle, String)>>,
}

impl LoopbackProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            hosted: Mutex::new(None),
        })
    }

    fn result_for(&self, handle: SessionHandle, match_type: &str) -> SessionSearchResult {
        let mut attributes = HashMap::new();
        attributes.insert(MATCH_TYPE_KEY.to_string(), match_type.to_string());
        SessionSearchResult::new(handle, attributes)
    }
}

impl SessionProvider for LoopbackProvider {
    fn backend(&self) -> BackendKind {
        BackendKind::Null
    }

    fn get_named_session(&self, _session_name: &str) -> Option<SessionHandle> {
        self.hosted.lock().unwrap().as_ref().map(|(h, _)| *h)
    }

    fn create_session(
        &self,
        _user: UserId,
        _session_name: &str,
        settings: &SessionSettings,
        on_complete: CompleteOnce<bool>,
    ) -> bool {
        let handle =
            SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let match_type = settings.match_type().unwrap_or("").to_string();
        *self.hosted.lock().unwrap() = Some((handle, match_type));
        on_complete(true);
        true
    }

    fn find_sessions(
        &self,
        _user: UserId,
        query: &SessionSearchQuery,
        on_complete: CompleteOnce<FindOutcome>,
    ) -> bool {
        let mut results = Vec::new();
        if let Some((handle, match_type)) = self.hosted.lock().unwrap().clone() {
            results.push(self.result_for(handle, &match_type));
        }
        // A couple of neighbors on the LAN, so filtering has something to do.
        results.push(self.result_for(SessionHandle(100), "TeamMatch"));
        results.push(self.result_for(SessionHandle(101), "FreeForAll"));
        results.truncate(query.max_results as usize);
        on_complete(FindOutcome {
            results,
            success: true,
        });
        true
    }

    fn join_session(
        &self,
        _user: UserId,
        _session_name: &str,
        _result: &SessionSearchResult,
        on_complete: CompleteOnce<JoinOutcome>,
    ) -> bool {
        on_complete(JoinOutcome::Success);
        true
    }

    fn destroy_session(
        &self,
        _session_name: &str,
        on_complete: CompleteOnce<bool>,
    ) -> bool {
        let existed = self.hosted.lock().unwrap().take().is_some();
        on_complete(existed);
        true
    }

    fn start_session(
        &self,
        _session_name: &str,
        on_complete: CompleteOnce<bool>,
    ) -> bool {
        on_complete(true);
        true
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let provider = LoopbackProvider::new();
    tracing::info!("loopback provider ready, driving the lobby flow");
    let manager = SessionLifecycleManager::new(
        Arc::clone(&provider) as Arc<dyn SessionProvider>,
        LifecycleConfig::default(),
    );

    let bus = manager.notifications();
    bus.create_complete.subscribe(|ok| {
        println!("[listener] create complete: success={ok}");
    });
    bus.destroy_complete.subscribe(|ok| {
        println!("[listener] destroy complete: success={ok}");
    });
    bus.join_complete.subscribe(|outcome| {
        println!("[listener] join complete: {outcome}");
        if outcome.is_success() {
            // Resolving a connect address and travelling is the caller's
            // job, outside the lifecycle core.
            println!("[listener] (caller would resolve address and travel)");
        }
    });
    bus.find_complete.subscribe(|outcome| {
        println!(
            "[listener] find complete: success={} results={}",
            outcome.success,
            outcome.results.len()
        );
        for wanted in outcome
            .results
            .iter()
            .filter(|r| r.matches_match_type("FreeForAll"))
        {
            println!("[listener]   FreeForAll candidate: {}", wanted.handle());
        }
    });

    println!("--- create a fresh session ---");
    manager.create_session(4, "FreeForAll");

    println!("--- create again: forces destroy-then-recreate ---");
    manager.create_session(2, "Duel");

    println!("--- search the lobby list ---");
    manager.find_sessions(10);

    println!("--- join a found session ---");
    let candidate = SessionSearchResult::new(SessionHandle(101), {
        let mut attributes = HashMap::new();
        attributes
            .insert(MATCH_TYPE_KEY.to_string(), "FreeForAll".to_string());
        attributes
    });
    manager.join_session(&candidate);

    println!("--- tear down ---");
    manager.destroy_session();
}
