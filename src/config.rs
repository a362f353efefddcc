//! Configuration types
//!
//! - [`ConnectionConfig`]: one logical connection (URL plus optional
//!   credentials or session token), loadable from JSON or YAML
//! - [`SessionConfig`]: cookie name, session path and retry ceiling
//! - [`TransportConfig`]: settings for the default reqwest transport

use crate::error::{Error, Result, ResultExt};
use crate::types::{Credentials, DEFAULT_MAX_AUTH_RETRIES, SESSION_COOKIE_NAME, SESSION_PATH};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Connection Config
// ============================================================================

/// Description of one logical connection, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server or database URL, optionally with `user:password@` userinfo
    pub name: String,

    /// Explicit credentials (also accepted as `auth`)
    #[serde(default, alias = "auth", skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Pre-obtained session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl ConnectionConfig {
    /// Create a config for the given URL
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set explicit credentials
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Set a pre-obtained session token
    #[must_use]
    pub fn session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }
}

/// Load a connection config from a JSON or YAML file
///
/// The format is picked from the extension; anything other than `.json` is
/// read as YAML (which also accepts JSON).
pub fn load_connection_config(path: impl AsRef<Path>) -> Result<ConnectionConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ConnectionConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(Error::from),
        _ => serde_yaml::from_str(&contents).map_err(Error::from),
    }
    .with_context(|| format!("Invalid connection file {}", path.display()))?;

    if config.name.trim().is_empty() {
        return Err(Error::missing_field("name"));
    }

    Ok(config)
}

// ============================================================================
// Session Config
// ============================================================================

/// Settings for cookie session handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Path of the session endpoint on the server
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// How many times a request is replayed after a 401
    #[serde(default = "default_max_auth_retries")]
    pub max_auth_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            session_path: default_session_path(),
            max_auth_retries: default_max_auth_retries(),
        }
    }
}

fn default_cookie_name() -> String {
    SESSION_COOKIE_NAME.to_string()
}

fn default_session_path() -> String {
    SESSION_PATH.to_string()
}

fn default_max_auth_retries() -> u32 {
    DEFAULT_MAX_AUTH_RETRIES
}

impl SessionConfig {
    /// Create a new config builder
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for session config
#[derive(Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the session cookie name
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.config.cookie_name = name.into();
        self
    }

    /// Set the session endpoint path
    pub fn session_path(mut self, path: impl Into<String>) -> Self {
        self.config.session_path = path.into();
        self
    }

    /// Set the retry ceiling after a 401
    pub fn max_auth_retries(mut self, retries: u32) -> Self {
        self.config.max_auth_retries = retries;
        self
    }

    /// Build the config
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

// ============================================================================
// Transport Config
// ============================================================================

/// Configuration for the default HTTP transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("couch-session/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Create a new config builder
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for transport config
#[derive(Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> TransportConfig {
        self.config
    }
}
