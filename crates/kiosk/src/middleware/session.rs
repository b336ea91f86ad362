//! Session middleware configuration.
//!
//! The session is the kiosk's only store of per-visit customer state: the
//! basket, the order hand-off slot and the payment in progress. In production
//! it is backed by `SQLite` so a restart between "order sent" and
//! "confirmation shown" does not lose the snapshot.
//!
//! Requests that change the session are serialized per session id by
//! [`session_lock_middleware`], which sits outside the session layer. The
//! session layer writes the whole record back when the response is ready, so
//! two overlapping requests on the same session would otherwise overwrite each
//! other's changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Cookie, SameSite, time::Duration},
};

use crate::config::KioskConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pc_session";

/// Session expiry after inactivity, in seconds (1 day).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer over the given store.
///
/// Production passes a migrated `SqliteStore`; tests pass a `MemoryStore`.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &KioskConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Value of the named cookie on a request, if present.
pub(crate) fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

/// Per-session locks, keyed by session cookie value.
///
/// Entries are dropped again once nobody holds or waits for them.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Exclusive access to one session until dropped.
pub struct SessionGuard {
    key: String,
    locks: SessionLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
    /// Wait for exclusive access to the session `key`.
    pub async fn acquire(&self, key: &str) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_owned()).or_default())
        };

        SessionGuard {
            key: key.to_owned(),
            locks: self.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of sessions with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no session currently holds or waits for a lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Whether a request may write to the session.
///
/// Every form and JSON post does; of the page loads only the confirmation
/// does, since it empties the hand-off slot.
fn writes_session(request: &Request) -> bool {
    let method = request.method();
    (method != Method::GET && method != Method::HEAD) || request.uri().path() == "/confirmation"
}

/// Serialize session-writing requests of the same browser.
///
/// The lock is held until the inner session layer has saved the record, so
/// the next request on that session loads the result of this one. Requests
/// without a session cookie start a fresh session and need no lock.
pub async fn session_lock_middleware(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    if !writes_session(&request) {
        return next.run(request).await;
    }
    let Some(session_id) = request_cookie(request.headers(), SESSION_COOKIE_NAME) else {
        return next.run(request).await;
    };

    let _guard = locks.acquire(&session_id).await;
    next.run(request).await
}
