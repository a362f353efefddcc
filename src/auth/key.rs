//! Session cache keys
//!
//! A key identifies one authentication context: who is logging in, with which
//! password, with which caller-supplied token, against which session endpoint.
//! Keys are structured so that no combination of field values can collide.

use crate::connection::Connection;
use std::fmt;

/// Cache key for one (credentials, explicit session, server) combination
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    username: String,
    password: String,
    session: String,
    endpoint: String,
}

impl SessionKey {
    /// Build a key from its raw parts
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        session: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            session: session.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Derive the key for a normalized connection
    pub fn for_connection(connection: &Connection) -> Self {
        let (username, password) = connection
            .credentials()
            .map(|c| (c.username.as_str(), c.password.as_str()))
            .unwrap_or_default();

        Self::new(
            username,
            password,
            connection.explicit_session().unwrap_or_default(),
            connection.session_endpoint().as_str(),
        )
    }

    /// Username part of the key (empty when anonymous)
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Session endpoint this key authenticates against
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session", &!self.session.is_empty())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.username.is_empty() {
            write!(f, "{}", self.endpoint)
        } else {
            write!(f, "{}@{}", self.username, self.endpoint)
        }
    }
}
