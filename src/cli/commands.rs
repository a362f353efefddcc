//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cookie session client for CouchDB-style servers
#[derive(Parser, Debug)]
#[command(name = "couch-session")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Server or database URL (may embed user:password@)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Username (requires --password)
    #[arg(long, global = true, requires = "password")]
    pub username: Option<String>,

    /// Password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Pre-obtained session token
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain a session and print its expiry
    Login,

    /// Send a request through the session layer
    Request {
        /// Path relative to the connection URL
        #[arg(default_value = "")]
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,

        /// Send the request this many times (sessions are reused)
        #[arg(long, default_value = "1")]
        repeat: u32,
    },
}
