//! Common types used throughout couch-session
//!
//! Credentials and the wire constants shared by the cookie parser, the
//! authenticator and the authenticating transport.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Wire Constants
// ============================================================================

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "AuthSession";

/// Path of the session endpoint, relative to the server root
pub const SESSION_PATH: &str = "/_session";

/// Upper bound on re-authentication attempts after a 401
pub const DEFAULT_MAX_AUTH_RETRIES: u32 = 1;

// ============================================================================
// Credentials
// ============================================================================

/// Username/password pair for one logical connection
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
