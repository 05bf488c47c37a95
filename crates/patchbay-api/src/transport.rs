//! Shared transport configuration for building reqwest::Client instances.
//!
//! The dispatcher needs two clients -- one that follows redirects and one
//! that does not (the login flow inspects the redirect target itself) --
//! built from the same timeout settings through this module.

use std::time::Duration;

use reqwest::redirect;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// `follow_redirects: false` pins the redirect policy to none; the
    /// policy is fixed at construction time, which is why the dispatcher
    /// keeps one client of each kind.
    pub fn build_client(&self, follow_redirects: bool) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("patchbay/", env!("CARGO_PKG_VERSION")));

        if !follow_redirects {
            builder = builder.redirect(redirect::Policy::none());
        }

        builder.build().map_err(Error::Transport)
    }
}
