//! Authenticator implementation
//!
//! Logs in against the session endpoint and turns the response cookie into a
//! [`SessionRecord`]. Always talks to the undecorated transport so that a
//! login never re-enters the session layer.

use super::cookie::session_from_headers;
use super::types::SessionRecord;
use crate::config::SessionConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::http::{Request, Transport};
use reqwest::header::{HeaderValue, ACCEPT};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Body of the session request
#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    name: &'a str,
    password: &'a str,
}

/// Obtains session cookies from the server
#[derive(Clone)]
pub struct Authenticator {
    /// Undecorated transport for login requests
    transport: Arc<dyn Transport>,
    /// Name of the session cookie
    cookie_name: String,
}

impl Authenticator {
    /// Create an authenticator using the default session settings
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, &SessionConfig::default())
    }

    /// Create an authenticator with custom session settings
    pub fn with_config(transport: Arc<dyn Transport>, config: &SessionConfig) -> Self {
        Self {
            transport,
            cookie_name: config.cookie_name.clone(),
        }
    }

    /// Request a new session for `connection`
    ///
    /// Returns `Ok(None)` without touching the network when the connection
    /// has no credentials. A rejected login or a response without a usable
    /// session cookie also yields `Ok(None)`: the caller's request then goes
    /// out bare and the server's own answer reaches the caller. Only transport
    /// failures are errors.
    pub async fn authenticate(&self, connection: &Connection) -> Result<Option<SessionRecord>> {
        let Some(credentials) = connection.credentials() else {
            return Ok(None);
        };

        let endpoint = connection.session_endpoint();
        let request = Request::post(endpoint.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&LoginBody {
                name: &credentials.username,
                password: &credentials.password,
            })?;

        info!(username = %credentials.username, endpoint = %endpoint, "Requesting session");
        let response = self.transport.call(request).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint = %endpoint, "Session request rejected");
            return Ok(None);
        }

        let record = session_from_headers(response.headers(), &self.cookie_name);
        if record.is_none() {
            warn!(
                endpoint = %endpoint,
                cookie = %self.cookie_name,
                "Session response carried no session cookie"
            );
        }

        Ok(record)
    }

    /// Name of the session cookie this authenticator looks for
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}
