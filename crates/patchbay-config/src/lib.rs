//! Configuration and credential storage for patchbay.
//!
//! TOML config merged with `PATCHBAY_`-prefixed environment variables,
//! platform-convention paths for the config file and the site cache, and
//! a keyring-backed implementation of the credential cache contract.

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use patchbay_api::{CredentialCache, CREDENTIAL_KEYS};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Provider assumed when a command omits `--provider`.
    pub default_provider: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Override for the site cache database path.
    pub cache_db: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "patchbay", "patchbay").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Resolve the site cache database path, honoring a config override.
pub fn cache_db_path(config: &Config) -> PathBuf {
    if let Some(ref path) = config.cache_db {
        return path.clone();
    }
    ProjectDirs::from("com", "patchbay", "patchbay").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("sites.sqlite");
            p
        },
        |dirs| dirs.data_dir().join("sites.sqlite"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("patchbay");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("PATCHBAY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Keyring-backed credential cache ─────────────────────────────────

/// Service name used for all patchbay keyring entries.
const SERVICE: &str = "patchbay";

/// Build the keyring "user" field from a credential namespace and key.
fn entry_user(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}

/// Credential cache backed by the OS keyring.
///
/// The keyring is best-effort: if it is unavailable (headless session,
/// locked keychain) reads answer `None` and writes are dropped with a
/// warning, so commands still run and simply re-prompt or go
/// unauthenticated.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentials;

impl KeyringCredentials {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialCache for KeyringCredentials {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        let entry = keyring::Entry::new(SERVICE, &entry_user(namespace, key)).ok()?;
        entry.get_password().ok()
    }

    fn set(&self, namespace: &str, key: &str, value: &str) {
        match keyring::Entry::new(SERVICE, &entry_user(namespace, key)) {
            Ok(entry) => {
                if let Err(error) = entry.set_password(value) {
                    warn!(namespace, key, %error, "failed to store credential in keyring");
                }
            }
            Err(error) => {
                warn!(namespace, key, %error, "keyring unavailable");
            }
        }
    }

    fn clear(&self, namespace: &str) {
        for key in CREDENTIAL_KEYS {
            if let Ok(entry) = keyring::Entry::new(SERVICE, &entry_user(namespace, key)) {
                // missing entries are fine
                let _ = entry.delete_credential();
            }
        }
    }
}
