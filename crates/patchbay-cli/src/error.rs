//! CLI error types with miette diagnostics.
//!
//! Maps core and API errors into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use patchbay_api::LoginError;
use patchbay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Providers ────────────────────────────────────────────────────
    #[error("Unknown provider '{name}'")]
    #[diagnostic(
        code(patchbay::unknown_provider),
        help("Run: patchbay providers to see what is available.")
    )]
    UnknownProvider { name: String },

    #[error("No provider selected")]
    #[diagnostic(
        code(patchbay::no_provider),
        help(
            "Pass --provider (-p), set PATCHBAY_PROVIDER, or configure\n\
             default_provider in the config file."
        )
    )]
    NoProvider,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authenticated with {provider}")]
    #[diagnostic(
        code(patchbay::auth_required),
        help("Run: patchbay auth login --provider {provider}")
    )]
    AuthRequired { provider: String },

    #[error(transparent)]
    #[diagnostic(
        code(patchbay::login_failed),
        help("Check your email and password, then retry the login.")
    )]
    Login(#[from] LoginError),

    // ── Remote API ───────────────────────────────────────────────────
    #[error("Could not reach the provider API")]
    #[diagnostic(
        code(patchbay::connection_failed),
        help("Check your network connection and the provider's status page.")
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Provider API error: {message}")]
    #[diagnostic(code(patchbay::api_error))]
    ApiError { message: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("Site cache error: {message}")]
    #[diagnostic(
        code(patchbay::cache),
        help("If the cache file is corrupt, delete it; it will be rebuilt.")
    )]
    Cache { message: String },

    #[error(transparent)]
    #[diagnostic(code(patchbay::config))]
    Config(#[from] patchbay_config::ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(patchbay::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthRequired { .. } | Self::Login(_) => exit_code::AUTH,
            Self::UnknownProvider { .. } => exit_code::NOT_FOUND,
            Self::NoProvider => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownProvider(name) => Self::UnknownProvider { name },
            CoreError::Api(api) => api.into(),
            CoreError::Persistence(source) => Self::Cache {
                message: source.to_string(),
            },
            CoreError::StorePoisoned => Self::Cache {
                message: "store lock poisoned".into(),
            },
        }
    }
}

impl From<patchbay_api::Error> for CliError {
    fn from(err: patchbay_api::Error) -> Self {
        match err {
            patchbay_api::Error::NotAuthenticated { provider } => Self::AuthRequired { provider },
            patchbay_api::Error::Transport(source) => Self::ConnectionFailed {
                source: source.into(),
            },
            other => Self::ApiError {
                message: other.to_string(),
            },
        }
    }
}
