//! The provider capability contract.
//!
//! Every hosting vendor integration implements [`Provider`]; vendors with
//! an interactive session login additionally implement [`Authenticator`],
//! which callers discover through [`Provider::authenticator`] rather than
//! assuming it exists.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::dispatch::AuthOptions;
use crate::error::{Error, LoginError};

/// A site as the provider's list endpoint reports it, before it becomes a
/// persistent entity. `id` is the vendor's own identifier where the wire
/// format carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSite {
    pub id: Option<String>,
    pub name: String,
    pub realm: Option<String>,
}

/// Uniform capability set over incompatible hosting-vendor APIs.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Machine name, unique across the registry (e.g. `"acquia"`).
    fn name(&self) -> &str;

    /// Human-readable vendor label.
    fn label(&self) -> &str;

    /// Vendor homepage, for display only.
    fn homepage(&self) -> &str;

    /// API endpoint root.
    fn endpoint(&self) -> &Url;

    /// Transport parameters merged into every outbound call.
    ///
    /// Computed from the credential cache on each call; missing
    /// credentials yield [`AuthOptions::None`] and the request proceeds
    /// unauthenticated.
    fn auth_options(&self) -> AuthOptions;

    /// Issue one list request and parse the provider-specific shape.
    ///
    /// Transport and parse errors surface to the caller, who aborts the
    /// current sync; the process continues.
    async fn list_sites(&self) -> Result<Vec<RemoteSite>, Error>;

    /// Fetch a single field of a single site.
    ///
    /// A field that is simply unavailable remotely is `Ok(None)`, never
    /// an error.
    async fn fetch_site_field(&self, site: &str, field: &str) -> Result<Option<String>, Error>;

    /// Fetch a single deployment attribute of one environment of a site.
    ///
    /// Same contract as [`fetch_site_field`](Self::fetch_site_field); the
    /// default answers `Ok(None)` for vendors without per-environment
    /// detail endpoints.
    async fn fetch_environment_field(
        &self,
        _site: &str,
        _environment: &str,
        _field: &str,
    ) -> Result<Option<String>, Error> {
        Ok(None)
    }

    /// Probe for the optional login capability.
    fn authenticator(&self) -> Option<&dyn Authenticator> {
        None
    }
}

/// Optional capability: interactive session login.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Run the vendor's login flow and persist the session wholesale.
    ///
    /// Returns a tagged terminal cause on failure; never panics, and
    /// never leaves partial session state in the credential cache.
    async fn login(&self, email: &str, password: &SecretString) -> Result<(), LoginError>;

    /// Whether a session token is cached. Purely local -- does not
    /// re-validate against the remote service.
    fn is_logged_in(&self) -> bool;
}
