//! Session pool and per-connection clients
//!
//! A [`SessionPool`] owns the session cache. Every [`SessionClient`] created
//! from it shares that cache, so connections to the same server with the same
//! credentials reuse one session, while separate pools stay isolated.

use super::session::SessionTransport;
use super::transport::{ReqwestTransport, Request, Transport};
use crate::auth::{SessionCache, SessionRecord};
use crate::config::{ConnectionConfig, SessionConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Factory for session-aware clients sharing one cache
#[derive(Clone)]
pub struct SessionPool {
    cache: Arc<SessionCache>,
    transport: Arc<dyn Transport>,
    config: SessionConfig,
}

impl SessionPool {
    /// Create a pool over the default reqwest transport
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    /// Create a pool over a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a pool with custom session settings
    pub fn with_config(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            cache: Arc::new(SessionCache::new()),
            transport,
            config,
        }
    }

    /// The cache shared by this pool's clients
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Session settings applied to new clients
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a client over the pool's transport
    pub fn connect(&self, config: &ConnectionConfig) -> Result<SessionClient> {
        self.connect_with_transport(config, Arc::clone(&self.transport))
    }

    /// Open a client over its own transport, still sharing the pool's cache
    pub fn connect_with_transport(
        &self,
        config: &ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<SessionClient> {
        let connection = Arc::new(Connection::with_session_path(
            config,
            &self.config.session_path,
        )?);

        if !connection.manages_session() {
            debug!(url = %connection.url(), "No credentials or session, using plain transport");
            return Ok(SessionClient {
                connection,
                transport,
                session: None,
            });
        }

        let session = Arc::new(SessionTransport::new(
            transport,
            Arc::clone(&self.cache),
            Arc::clone(&connection),
            &self.config,
        ));
        session.seed();

        Ok(SessionClient {
            connection,
            transport: Arc::clone(&session) as Arc<dyn Transport>,
            session: Some(session),
        })
    }
}

impl std::fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Client for one logical connection
#[derive(Clone)]
pub struct SessionClient {
    connection: Arc<Connection>,
    /// Either the session transport or, without credentials, the plain one
    transport: Arc<dyn Transport>,
    session: Option<Arc<SessionTransport>>,
}

impl SessionClient {
    /// Normalized connection this client talks to
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Base URL of the connection, without userinfo
    pub fn url(&self) -> &Url {
        self.connection.url()
    }

    /// Whether requests go through the session layer
    pub fn is_authenticating(&self) -> bool {
        self.session.is_some()
    }

    /// The installed transport, decorated or not
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Resolve `path` against the connection URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.connection.url().as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(self.connection.url().clone());
        }
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send a prepared request
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.transport.call(request).await
    }

    /// Make a request with an optional JSON body
    pub async fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<Response> {
        let mut request = Request::new(method, self.endpoint(path)?)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.json(body)?;
        }
        self.send(request).await
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request::<()>(Method::GET, path, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request::<()>(Method::DELETE, path, None).await
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }
        Ok(response.json().await?)
    }

    /// Current valid session, logging in if needed
    ///
    /// Always `None` for connections without credentials or session token.
    pub async fn session(&self) -> Result<Option<SessionRecord>> {
        match &self.session {
            Some(session) => session.session().await,
            None => Ok(None),
        }
    }

    /// Forget the cached session for this connection
    ///
    /// Only the local cache entry is dropped; the next request logs in again.
    pub fn logout(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.invalidate())
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("url", &self.connection.url().as_str())
            .field("is_authenticating", &self.is_authenticating())
            .finish_non_exhaustive()
    }
}
