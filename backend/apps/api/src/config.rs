//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded).

use std::net::SocketAddr;
use std::time::Duration;

use accounts::AccountsConfig;
use accounts::application::config::{MAX_SESSION_TTL, SameSite};
use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs the server on the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub frontend_origins: Vec<String>,
    pub accounts: AccountsConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let frontend_origins = get("FRONTEND_ORIGINS")
            .as_deref()
            .unwrap_or(DEFAULT_FRONTEND_ORIGINS)
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mut accounts = if cfg!(debug_assertions) {
            AccountsConfig::development()
        } else {
            AccountsConfig::default()
        };

        match get("SESSION_SECRET") {
            Some(secret_b64) => {
                accounts.session_secret = decode_secret(&secret_b64)?;
            }
            None if cfg!(debug_assertions) => {
                tracing::warn!("SESSION_SECRET not set, using a random secret for this process");
            }
            None => bail!("SESSION_SECRET must be set in production"),
        }

        if let Some(ttl) = get("SESSION_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .context("SESSION_TTL_SECS must be a number of seconds")?;
            if secs == 0 || secs > MAX_SESSION_TTL.as_secs() {
                bail!(
                    "SESSION_TTL_SECS must be between 1 and {}, got {secs}",
                    MAX_SESSION_TTL.as_secs()
                );
            }
            accounts.session_ttl = Duration::from_secs(secs);
        }

        if let Some(secure) = get("COOKIE_SECURE") {
            accounts.cookie_secure = parse_bool(&secure).context("COOKIE_SECURE must be a boolean")?;
        }

        if let Some(same_site) = get("COOKIE_SAMESITE") {
            accounts.cookie_same_site = same_site
                .parse::<SameSite>()
                .map_err(anyhow::Error::msg)?;
        }

        accounts.password_pepper = get("PASSWORD_PEPPER").map(String::into_bytes);

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            frontend_origins,
            accounts,
        })
    }
}

fn decode_secret(secret_b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .context("SESSION_SECRET must be base64")?;

    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("SESSION_SECRET must decode to 32 bytes, got {}", bytes.len()))
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: {other}"),
    }
}
