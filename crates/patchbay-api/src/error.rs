use thiserror::Error;

/// Top-level error type for the `patchbay-api` crate.
///
/// Covers transport failures, malformed URLs, non-2xx provider responses,
/// and unexpected response shapes. `patchbay-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The provider API answered with a non-success status.
    #[error("{provider} API returned HTTP {status}")]
    Api { provider: String, status: u16 },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("unexpected response shape: {message}")]
    Deserialization { message: String, body: String },

    /// An operation needed cached credentials that are not present.
    #[error("not authenticated with {provider}")]
    NotAuthenticated { provider: String },
}

/// Terminal failure causes of the session login flow.
///
/// `login()` never panics and never returns a transport error directly --
/// every failure is folded into one of these tagged causes so callers can
/// branch and present a specific message.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The login endpoint could not be reached at all.
    #[error("login endpoint unavailable: {0}")]
    EndpointUnavailable(String),

    /// The login page did not contain the expected form (or form token).
    #[error("login form not found on the login page")]
    FormUnavailable,

    /// The credential POST itself failed at the transport level.
    #[error("login request failed: {0}")]
    LoginFailed(String),

    /// No session cookie came back -- usually wrong credentials.
    #[error("no session cookie in the login response; check your credentials")]
    NoSession,

    /// The redirect target did not end in a user id.
    #[error("no user id in the login redirect; check your credentials")]
    NoUserId,
}
