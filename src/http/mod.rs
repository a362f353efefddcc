//! HTTP layer
//!
//! - **Transport**: the `Transport` trait, `Request`, and the reqwest-backed default
//! - **Session transport**: decorator that attaches, refreshes and retries sessions
//! - **Client**: `SessionPool` (owns the cache) and per-connection `SessionClient`

mod client;
mod session;
mod transport;

pub use client::{SessionClient, SessionPool};
pub use session::SessionTransport;
pub use transport::{ReqwestTransport, Request, Transport};
