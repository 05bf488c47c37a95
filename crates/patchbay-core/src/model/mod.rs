//! Cache-backed domain entities.
//!
//! A [`Site`] and its [`Environment`]s hold whatever the local cache
//! knows; anything else is pulled from the owning provider on first
//! access through the explicit `get` accessors, then written back. Each
//! field is attempted at most once per process unless the caller forces
//! a refresh.

mod environment;
mod site;

pub use environment::{Environment, ENVIRONMENT_FIELDS};
pub use site::{Site, SITE_FIELDS};

use patchbay_api::Provider;

use crate::store::Store;

/// Everything a lazy field fetch needs, passed explicitly at each call.
///
/// `provider` is optional so cache-only reads (no network, e.g. when the
/// provider is not registered or the caller wants offline behavior) go
/// through the same accessor.
pub struct FetchContext<'a> {
    pub store: &'a Store,
    pub provider: Option<&'a dyn Provider>,
    pub refresh: bool,
}
