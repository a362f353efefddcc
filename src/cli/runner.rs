//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_connection_config, ConnectionConfig};
use crate::auth::SessionRecord;
use crate::error::{Error, Result, ResultExt};
use crate::http::{SessionClient, SessionPool};
use crate::types::Credentials;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = self.connect()?;

        match &self.cli.command {
            Commands::Login => self.login(&client).await,
            Commands::Request {
                path,
                method,
                data,
                repeat,
            } => {
                self.request(&client, path, method, data.as_deref(), *repeat)
                    .await
            }
        }
    }

    /// Merge the connection file with command-line flags (flags win)
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config = match &self.cli.config {
            Some(path) => load_connection_config(path)?,
            None => ConnectionConfig::default(),
        };

        if let Some(url) = &self.cli.url {
            config.name.clone_from(url);
        }
        if let (Some(username), Some(password)) = (&self.cli.username, &self.cli.password) {
            config.credentials = Some(Credentials::new(username, password));
        }
        if let Some(session) = &self.cli.session {
            config.session = Some(session.clone());
        }

        if config.name.is_empty() {
            return Err(Error::config(
                "Connection URL not specified (use --url or --config)",
            ));
        }

        Ok(config)
    }

    fn connect(&self) -> Result<SessionClient> {
        let pool = SessionPool::new()?;
        pool.connect(&self.connection_config()?)
    }

    async fn login(&self, client: &SessionClient) -> Result<()> {
        let session = client.session().await?;
        let output = login_report(client, session.as_ref());
        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }

    async fn request(
        &self,
        client: &SessionClient,
        path: &str,
        method: &str,
        data: Option<&str>,
        repeat: u32,
    ) -> Result<()> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| Error::config(format!("Invalid HTTP method: {method}")))?;
        let body: Option<Value> = data
            .map(|d| serde_json::from_str::<Value>(d).context("Invalid --data"))
            .transpose()?;

        for attempt in 1..=repeat.max(1) {
            let started = Instant::now();
            let response = client.request(method.clone(), path, body.as_ref()).await?;
            let status = response.status().as_u16();
            let text = response.text().await?;

            info!(
                "{} {} -> {} in {:?} ({}/{})",
                method,
                path,
                status,
                started.elapsed(),
                attempt,
                repeat.max(1)
            );

            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
            let output = json!({ "status": status, "body": body });
            println!("{}", serde_json::to_string(&output)?);
        }

        Ok(())
    }
}

/// Summary printed by `login`; never includes the password or token
fn login_report(client: &SessionClient, session: Option<&SessionRecord>) -> Value {
    json!({
        "url": client.url().as_str(),
        "username": client.connection().credentials().map(|c| c.username.as_str()),
        "authenticated": session.is_some(),
        "explicit": session.is_some_and(SessionRecord::is_explicit),
        "expires_at": session
            .filter(|s| !s.is_explicit())
            .map(|s| s.expires_at.to_rfc3339()),
    })
}
