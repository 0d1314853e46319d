use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

use crate::crypto::token::SECRET_SIZE;

/// Default lifetime of an issued access token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
/// Default retention window of a live session, in seconds.
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 4 * 3600;
/// Upper bound for the access token lifetime, in seconds.
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;
/// Upper bound for the session retention window, in seconds.
pub const MAX_SESSION_RETENTION_SECS: u64 = 7 * 24 * 3600;

/// Credentials shared with the external media-session provider.
#[derive(Clone)]
pub struct MediaConfig {
    /// The provider application id.
    pub app_id: u32,
    /// The 32-byte shared secret used as the AES-256 key.
    pub app_secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Token signing configuration. `None` runs live sessions in demo mode.
    pub media: Option<MediaConfig>,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
    /// How long a session lives before it is evicted.
    pub session_retention: Duration,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            media: None,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            session_retention: Duration::from_secs(DEFAULT_SESSION_RETENTION_SECS),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let media = media_from_parts(
            env::var("LIVE_APP_ID").ok(),
            env::var("LIVE_APP_SECRET").ok().map(Zeroizing::new),
        )?;

        let token_ttl: u64 = env::var("LIVE_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse()
            .context("Invalid LIVE_TOKEN_TTL_SECS")?;
        let token_ttl = seconds_in_range("LIVE_TOKEN_TTL_SECS", token_ttl, MAX_TOKEN_TTL_SECS)?;

        let session_retention: u64 = env::var("LIVE_SESSION_RETENTION_SECS")
            .unwrap_or_else(|_| DEFAULT_SESSION_RETENTION_SECS.to_string())
            .parse()
            .context("Invalid LIVE_SESSION_RETENTION_SECS")?;
        let session_retention = seconds_in_range(
            "LIVE_SESSION_RETENTION_SECS",
            session_retention,
            MAX_SESSION_RETENTION_SECS,
        )?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            media,
            token_ttl,
            session_retention,
            cors_origins,
        })
    }
}

/// Rejects durations of zero or above `max` seconds.
fn seconds_in_range(name: &str, secs: u64, max: u64) -> Result<Duration> {
    if secs == 0 || secs > max {
        anyhow::bail!("{} must be between 1 and {} seconds", name, max);
    }
    Ok(Duration::from_secs(secs))
}

/// Builds the signing configuration. Both parts must be present; a
/// partially or wrongly configured provider is a startup error.
fn media_from_parts(
    app_id: Option<String>,
    app_secret: Option<Zeroizing<String>>,
) -> Result<Option<MediaConfig>> {
    let (app_id, app_secret) = match (app_id, app_secret) {
        (None, None) => return Ok(None),
        (Some(id), Some(secret)) => (id, secret),
        _ => anyhow::bail!("LIVE_APP_ID and LIVE_APP_SECRET must be set together"),
    };

    let app_id: u32 = app_id
        .trim()
        .parse()
        .context("LIVE_APP_ID must be a positive integer")?;
    if app_id == 0 {
        anyhow::bail!("LIVE_APP_ID must be a positive integer");
    }

    if app_secret.len() != SECRET_SIZE {
        anyhow::bail!("LIVE_APP_SECRET must be exactly {} bytes", SECRET_SIZE);
    }

    Ok(Some(MediaConfig {
        app_id,
        app_secret: Zeroizing::new(app_secret.as_bytes().to_vec()),
    }))
}
