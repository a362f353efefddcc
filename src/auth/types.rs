//! Session record types

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;

/// A session token together with its absolute expiry
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// The cookie value issued by the server
    pub token: String,
    /// When the token stops being usable
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new session record
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Create a record for a caller-supplied token; it never self-expires
    pub fn explicit(token: impl Into<String>) -> Self {
        Self::new(token, DateTime::<Utc>::MAX_UTC)
    }

    /// Create a record that expires N seconds from now
    pub fn expires_in(token: impl Into<String>, seconds: i64) -> Self {
        Self::new(token, Utc::now() + chrono::Duration::seconds(seconds))
    }

    /// Check whether the record is still usable at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Check whether the record is still usable
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether this record was supplied by the caller rather than the server
    pub fn is_explicit(&self) -> bool {
        self.expires_at == DateTime::<Utc>::MAX_UTC
    }

    /// Render the `Cookie` request header for this record
    pub fn cookie_header(&self, cookie_name: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("{cookie_name}={}", self.token)).ok()
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
