//! Async clients for the provider APIs behind `patchbay`.
//!
//! A [`Provider`] exposes a uniform capability set over incompatible
//! hosting-vendor APIs: list the sites an account can see, fetch a single
//! field of a single site, and compute the transport parameters each
//! outbound request needs. Session-based vendors additionally implement
//! [`Authenticator`], discovered at runtime through
//! [`Provider::authenticator`].
//!
//! Requests are composed and executed by the [`Dispatcher`], which knows
//! nothing about response shapes -- each provider parses its own wire
//! format. Credentials at rest live behind the [`CredentialCache`]
//! contract; this crate ships an in-memory implementation, the OS-keyring
//! one lives in `patchbay-config`.

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod providers;
pub mod transport;

pub use credentials::{auth_namespace, CredentialCache, MemoryCredentials, CREDENTIAL_KEYS};
pub use dispatch::{AuthOptions, Dispatcher, RawResponse, ResourceSpec};
pub use error::{Error, LoginError};
pub use provider::{Authenticator, Provider, RemoteSite};
pub use providers::{Acquia, Pantheon};
pub use transport::TransportConfig;
