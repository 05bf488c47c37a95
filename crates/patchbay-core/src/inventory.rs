//! The per-invocation context: store, providers, and their sites.
//!
//! Constructed once near the entry point and passed explicitly to
//! whatever needs it. Registering the same provider name twice replaces
//! the earlier registration.

use std::collections::{btree_map::Entry, BTreeMap};
use std::sync::Arc;

use patchbay_api::Provider;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{FetchContext, Site, SITE_FIELDS};
use crate::store::Store;

pub struct Inventory {
    store: Store,
    refresh: bool,
    providers: BTreeMap<String, Arc<dyn Provider>>,
    sites: BTreeMap<String, BTreeMap<String, Site>>,
}

impl Inventory {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            refresh: false,
            providers: BTreeMap::new(),
            sites: BTreeMap::new(),
        }
    }

    /// Force provider fetches even for fields the cache already has.
    #[must_use]
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        debug!(provider = provider.name(), "registering provider");
        self.providers.insert(provider.name().to_owned(), provider);
    }

    pub fn provider(&self, name: &str) -> Result<&Arc<dyn Provider>, CoreError> {
        self.providers
            .get(name)
            .ok_or_else(|| CoreError::UnknownProvider(name.to_owned()))
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.values()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Pull the provider's site list and reconcile it into the cache.
    ///
    /// Listed sites are created or updated; sites the provider no longer
    /// lists are left in the cache untouched. Returns the listed names,
    /// sorted.
    pub async fn sync_sites(&mut self, provider_name: &str) -> Result<Vec<String>, CoreError> {
        let provider = Arc::clone(self.provider(provider_name)?);
        let remote_sites = provider.list_sites().await?;
        info!(
            provider = provider_name,
            count = remote_sites.len(),
            "synchronizing site list"
        );

        let bucket = self.sites.entry(provider_name.to_owned()).or_default();
        let mut names = Vec::with_capacity(remote_sites.len());
        for remote in remote_sites {
            let mut site = Site::new(provider_name, &remote.name);
            site.read(&self.store)?;
            if let Some(id) = remote.id {
                site.set_field("uuid", Some(id));
            }
            if let Some(realm) = remote.realm {
                site.set_field("realm", Some(realm));
            }
            site.save(&self.store)?;
            names.push(remote.name.clone());
            bucket.insert(remote.name, site);
        }
        names.sort();
        Ok(names)
    }

    /// The cached site, loading it from the store on first access.
    pub fn site(&mut self, provider_name: &str, name: &str) -> Result<&mut Site, CoreError> {
        if !self.providers.contains_key(provider_name) {
            return Err(CoreError::UnknownProvider(provider_name.to_owned()));
        }
        site_slot(&self.store, &mut self.sites, provider_name, name)
    }

    /// Resolve one field of one site, fetching lazily.
    pub async fn site_field(
        &mut self,
        provider_name: &str,
        name: &str,
        field: &str,
    ) -> Result<Option<String>, CoreError> {
        let provider = Arc::clone(self.provider(provider_name)?);
        let site = site_slot(&self.store, &mut self.sites, provider_name, name)?;
        let ctx = FetchContext {
            store: &self.store,
            provider: Some(provider.as_ref()),
            refresh: self.refresh,
        };
        Ok(site.get(field, &ctx).await)
    }

    /// Resolve every declared field of a site and report them all.
    pub async fn site_details(
        &mut self,
        provider_name: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        let provider = Arc::clone(self.provider(provider_name)?);
        let site = site_slot(&self.store, &mut self.sites, provider_name, name)?;
        let ctx = FetchContext {
            store: &self.store,
            provider: Some(provider.as_ref()),
            refresh: self.refresh,
        };
        for field in SITE_FIELDS {
            site.get(field, &ctx).await;
        }
        Ok(site.attributes())
    }

    /// Connection URL for a site's code repository, resolving the VCS
    /// fields first.
    pub async fn site_vcs_url(
        &mut self,
        provider_name: &str,
        name: &str,
    ) -> Result<Option<String>, CoreError> {
        let provider = Arc::clone(self.provider(provider_name)?);
        let site = site_slot(&self.store, &mut self.sites, provider_name, name)?;
        let ctx = FetchContext {
            store: &self.store,
            provider: Some(provider.as_ref()),
            refresh: self.refresh,
        };
        site.get("vcs_url", &ctx).await;
        site.get("vcs_protocol", &ctx).await;
        Ok(site.vcs_connection_url())
    }

    /// Resolve every deployment attribute of one environment.
    pub async fn environment_details(
        &mut self,
        provider_name: &str,
        site_name: &str,
        environment: &str,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        let provider = Arc::clone(self.provider(provider_name)?);
        let site = site_slot(&self.store, &mut self.sites, provider_name, site_name)?;
        let ctx = FetchContext {
            store: &self.store,
            provider: Some(provider.as_ref()),
            refresh: self.refresh,
        };
        site.environment_details(environment, &ctx).await
    }
}

/// Get-or-load a site entry without borrowing the whole inventory.
fn site_slot<'a>(
    store: &Store,
    sites: &'a mut BTreeMap<String, BTreeMap<String, Site>>,
    provider_name: &str,
    name: &str,
) -> Result<&'a mut Site, CoreError> {
    let bucket = sites.entry(provider_name.to_owned()).or_default();
    match bucket.entry(name.to_owned()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let mut site = Site::new(provider_name, name);
            site.read(store)?;
            Ok(entry.insert(site))
        }
    }
}
