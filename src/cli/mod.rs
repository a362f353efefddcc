//! CLI module
//!
//! # Commands
//!
//! - `login` - Obtain a session and report its expiry
//! - `request` - Send requests through the session layer

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
