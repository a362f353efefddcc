//! Authenticating transport
//!
//! Wraps another [`Transport`] and, for every request:
//!
//! 1. fetches a valid session from the shared cache (logging in if needed)
//! 2. attaches it as `Cookie: <name>=<token>`
//! 3. performs the request on the wrapped transport
//! 4. on a 401 for a request that carried a session, drops that session from
//!    the cache and replays the request, at most `max_auth_retries` times
//!    (connections without credentials keep their explicit session instead)
//! 5. stores any rotated session cookie from the final response

use super::transport::{Request, Transport};
use crate::auth::{session_from_headers, Authenticator, SessionCache, SessionKey, SessionRecord};
use crate::config::SessionConfig;
use crate::connection::Connection;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transport decorator adding cookie session handling
pub struct SessionTransport {
    inner: Arc<dyn Transport>,
    cache: Arc<SessionCache>,
    authenticator: Authenticator,
    connection: Arc<Connection>,
    key: SessionKey,
    cookie_name: String,
    max_auth_retries: u32,
}

impl SessionTransport {
    /// Decorate `inner` for `connection`, sharing sessions through `cache`
    pub fn new(
        inner: Arc<dyn Transport>,
        cache: Arc<SessionCache>,
        connection: Arc<Connection>,
        config: &SessionConfig,
    ) -> Self {
        let authenticator = Authenticator::with_config(Arc::clone(&inner), config);
        let key = SessionKey::for_connection(&connection);

        Self {
            inner,
            cache,
            authenticator,
            connection,
            key,
            cookie_name: config.cookie_name.clone(),
            max_auth_retries: config.max_auth_retries,
        }
    }

    /// Cache key this transport's sessions live under
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Current valid session, logging in if none is cached
    pub async fn session(&self) -> Result<Option<SessionRecord>> {
        let authenticator = self.authenticator.clone();
        let connection = Arc::clone(&self.connection);

        self.cache
            .get_valid_session(&self.key, move || async move {
                authenticator.authenticate(&connection).await
            })
            .await
    }

    /// Drop the cached session; returns whether one was cached
    pub fn invalidate(&self) -> bool {
        self.cache.invalidate(&self.key)
    }

    /// Install the explicit session token of the connection, if it has one
    pub fn seed(&self) {
        if let Some(record) = self.connection.session_seed() {
            debug!(key = %self.key, "Seeding explicit session");
            self.cache.set_session(&self.key, record);
        }
    }
}

#[async_trait]
impl Transport for SessionTransport {
    async fn call(&self, request: Request) -> Result<Response> {
        let mut retries = 0;

        loop {
            let session = self.session().await?;

            let mut attempt = request.clone();
            let cookie = session
                .as_ref()
                .and_then(|record| record.cookie_header(&self.cookie_name));
            let attached = match cookie {
                Some(value) => {
                    attempt.headers.insert(COOKIE, value);
                    true
                }
                None => false,
            };

            let response = self.inner.call(attempt).await?;

            let rejected = match &session {
                Some(record) if attached && response.status() == StatusCode::UNAUTHORIZED => {
                    Some(record)
                }
                _ => None,
            };

            if let Some(record) = rejected {
                if self.connection.credentials().is_none() {
                    // Nothing to log in with; keep the explicit session for later calls
                    warn!(key = %self.key, "Session rejected (401), no credentials to renew it");
                } else {
                    self.cache.invalidate_token(&self.key, &record.token);
                    if retries < self.max_auth_retries {
                        retries += 1;
                        warn!(
                            key = %self.key,
                            "Session rejected (401), re-authenticating, attempt {}/{}",
                            retries,
                            self.max_auth_retries
                        );
                        continue;
                    }
                    warn!(key = %self.key, "Session rejected (401) after {} retries", retries);
                }
            }

            if let Some(rotated) = session_from_headers(response.headers(), &self.cookie_name) {
                debug!(key = %self.key, "Storing rotated session cookie");
                self.cache.set_session(&self.key, rotated);
            }

            return Ok(response);
        }
    }
}

impl std::fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTransport")
            .field("key", &self.key)
            .field("cookie_name", &self.cookie_name)
            .field("max_auth_retries", &self.max_auth_retries)
            .finish_non_exhaustive()
    }
}
