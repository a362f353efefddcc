//! Session authentication
//!
//! - `cookie`: parse the session cookie out of `Set-Cookie`
//! - `key`: derive cache keys per (credentials, session, server)
//! - `cache`: single-flight cache of session records
//! - `authenticator`: log in against the session endpoint

mod authenticator;
mod cache;
mod cookie;
mod key;
mod types;

pub use authenticator::Authenticator;
pub use cache::SessionCache;
pub use cookie::{parse_cookie_date, parse_set_cookie, session_from_headers};
pub use key::SessionKey;
pub use types::SessionRecord;
