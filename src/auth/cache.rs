//! Single-flight session cache
//!
//! Maps each [`SessionKey`] to either a resolved [`SessionRecord`] or the
//! shared handle of an authentication attempt that is still running. The
//! attempt is installed under the map lock *before* anyone awaits it, so every
//! caller arriving while it runs joins the same attempt instead of starting
//! its own. The lock only guards the map; it is never held across I/O.

use super::key::SessionKey;
use super::types::SessionRecord;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type SessionOutcome = std::result::Result<Option<SessionRecord>, Arc<Error>>;

/// Shared handle of a running authentication attempt
type PendingSession = Shared<BoxFuture<'static, SessionOutcome>>;

#[derive(Clone)]
enum CacheEntry {
    /// Authentication in flight, or finished but not yet re-inspected
    Pending(PendingSession),
    /// Record installed directly (explicit session or rotated cookie)
    Ready(SessionRecord),
}

impl CacheEntry {
    /// Whether a lookup at `now` may use this entry instead of re-authenticating
    fn is_reusable_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            CacheEntry::Ready(record) => record.is_valid_at(now),
            CacheEntry::Pending(pending) => match pending.peek() {
                None => true,
                Some(Ok(Some(record))) => record.is_valid_at(now),
                Some(Ok(None) | Err(_)) => false,
            },
        }
    }
}

/// Session cache shared by every connection created from one pool
#[derive(Default)]
pub struct SessionCache {
    entries: Mutex<HashMap<SessionKey, CacheEntry>>,
}

impl SessionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a usable session for `key`, authenticating at most once per key
    ///
    /// `authenticate` is only invoked when the cached entry is missing,
    /// expired, resolved to "no session", or resolved to an error. The attempt
    /// runs as its own task and completes even if every waiter goes away.
    ///
    /// Must be polled inside a Tokio runtime: the attempt is started with
    /// [`tokio::spawn`], which panics without one.
    pub async fn get_valid_session<F, Fut>(
        &self,
        key: &SessionKey,
        authenticate: F,
    ) -> Result<Option<SessionRecord>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<SessionRecord>>> + Send + 'static,
    {
        let now = Utc::now();
        let pending = {
            let mut entries = self.lock();
            let reusable = entries
                .get(key)
                .filter(|entry| entry.is_reusable_at(now))
                .cloned();

            match reusable {
                Some(CacheEntry::Ready(record)) => {
                    debug!(key = %key, "Reusing cached session");
                    return Ok(Some(record));
                }
                Some(CacheEntry::Pending(pending)) => {
                    debug!(key = %key, "Joining session attempt");
                    pending
                }
                None => {
                    debug!(key = %key, "Starting session attempt");
                    let pending = spawn_attempt(authenticate());
                    entries.insert(key.clone(), CacheEntry::Pending(pending.clone()));
                    pending
                }
            }
        };

        pending.await.map_err(Error::SessionRequest)
    }

    /// Install a resolved record, replacing whatever was cached
    pub fn set_session(&self, key: &SessionKey, record: SessionRecord) {
        self.lock().insert(key.clone(), CacheEntry::Ready(record));
    }

    /// Drop the entry for `key`; returns whether one was present
    pub fn invalidate(&self, key: &SessionKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop the entry for `key` only if it still holds the session `token`
    ///
    /// Entries holding a different token, or a login still in flight, are
    /// left alone. Returns whether the entry was removed.
    pub fn invalidate_token(&self, key: &SessionKey, token: &str) -> bool {
        let mut entries = self.lock();
        let stale = match entries.get(key) {
            Some(CacheEntry::Ready(record)) => record.token == token,
            Some(CacheEntry::Pending(pending)) => {
                matches!(pending.peek(), Some(Ok(Some(record))) if record.token == token)
            }
            None => false,
        };

        if stale {
            entries.remove(key);
        }
        stale
    }

    /// Check whether an entry exists for `key`
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("entries", &self.len())
            .finish()
    }
}

/// Run an authentication attempt as its own task and share its outcome
fn spawn_attempt<Fut>(attempt: Fut) -> PendingSession
where
    Fut: Future<Output = Result<Option<SessionRecord>>> + Send + 'static,
{
    let handle = tokio::spawn(attempt);
    async move {
        match handle.await {
            Ok(outcome) => outcome.map_err(Arc::new),
            Err(e) => Err(Arc::new(Error::auth(format!(
                "Session task did not complete: {e}"
            )))),
        }
    }
    .boxed()
    .shared()
}
