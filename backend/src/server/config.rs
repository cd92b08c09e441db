//! Server settings loaded via OrthoConfig, plus session key loading.
//!
//! Every field can be set on the command line, through `FIELDOPS_*`
//! environment variables or in a configuration file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::cookie::Key;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;

use fieldops::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_CHEF_FONCTION: &str = "chef";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CHECKOUT_TIMEOUT_SECS: u64 = 30;
/// `Key::try_from` needs at least this many bytes of key material.
const SESSION_KEY_MIN_LEN: usize = 64;

/// Errors raised while turning settings into runtime configuration.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid value for {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Configuration values controlling the HTTP server and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FIELDOPS")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum number of pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection before answering 503.
    pub checkout_timeout_secs: Option<u64>,
    /// File holding at least 64 bytes of session key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// Fall back to a random session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_key: bool,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
    /// Agent function required to act as chef; empty disables the check.
    pub chef_fonction: Option<String>,
}

impl ServerSettings {
    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "bind_addr",
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Pool configuration; the database URL is mandatory.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::Missing {
                name: "database_url",
            })?;
        Ok(PoolConfig::new(url)
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
            .with_connection_timeout(Duration::from_secs(
                self.checkout_timeout_secs
                    .unwrap_or(DEFAULT_CHECKOUT_TIMEOUT_SECS),
            )))
    }

    /// Function an agent must hold to become a responsable, if any.
    pub fn chef_fonction(&self) -> Option<String> {
        match self.chef_fonction.as_deref().map(str::trim) {
            None => Some(DEFAULT_CHEF_FONCTION.to_owned()),
            Some("") => None,
            Some(fonction) => Some(fonction.to_owned()),
        }
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Load the session key, generating a temporary one when permitted.
    pub fn session_key(&self) -> Result<Key, SettingsError> {
        let path = self.session_key_file();
        match read_session_key(&path) {
            Ok(key) => Ok(key),
            Err(err) if self.allow_ephemeral_key => {
                warn!(path = %path.display(), error = %err, "using temporary session key");
                Ok(Key::generate())
            }
            Err(err) => Err(err),
        }
    }
}

fn read_session_key(path: &Path) -> Result<Key, SettingsError> {
    let bytes = std::fs::read(path).map_err(|source| SettingsError::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    Key::try_from(bytes.as_slice()).map_err(|_| SettingsError::KeyTooShort {
        path: path.to_path_buf(),
        length: bytes.len(),
        min_len: SESSION_KEY_MIN_LEN,
    })
}
