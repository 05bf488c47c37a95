use std::collections::{btree_map::Entry, BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::environment::{Environment, ENVIRONMENT_FIELDS};
use crate::model::FetchContext;
use crate::record::Record;
use crate::store::Store;

/// Declared scalar fields of a site, in cache column order.
pub const SITE_FIELDS: &[&str] = &[
    "uuid",
    "realm",
    "title",
    "unix_username",
    "vcs_url",
    "vcs_type",
    "vcs_protocol",
    "ssh_port",
];

/// A hosted site, identified by `(provider, name)`.
///
/// Field values live in the local cache and are filled in lazily from
/// the owning provider via [`get`](Site::get). The `fetched` set records
/// which fields have already been attempted this process, so a field the
/// provider does not report costs exactly one round trip.
pub struct Site {
    provider: String,
    name: String,
    id: Option<i64>,
    fields: BTreeMap<String, String>,
    environments: BTreeMap<String, Environment>,
    fetched: HashSet<String>,
}

impl Record for Site {
    const TABLE: &'static str = "sites";
    const SCOPE_FIELD: &'static str = "provider";

    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> String {
        self.provider.clone()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns() -> &'static [&'static str] {
        SITE_FIELDS
    }

    fn values(&self) -> Vec<Option<String>> {
        SITE_FIELDS
            .iter()
            .map(|field| self.fields.get(*field).cloned())
            .collect()
    }

    fn hydrate(&mut self, column: &str, value: Option<String>) {
        if !SITE_FIELDS.contains(&column) {
            return;
        }
        match value {
            Some(value) => {
                self.fields.insert(column.to_owned(), value);
            }
            None => {
                self.fields.remove(column);
            }
        }
    }
}

impl Site {
    pub fn new(provider: &str, name: &str) -> Self {
        Self {
            provider: provider.to_owned(),
            name: name.to_owned(),
            id: None,
            fields: BTreeMap::new(),
            environments: BTreeMap::new(),
            fetched: HashSet::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Load this site and all of its cached environments.
    pub fn read(&mut self, store: &Store) -> Result<bool, CoreError> {
        let found = store.load(self)?;
        if let Some(id) = self.id {
            for name in store.names_in_scope::<Environment>(&id.to_string())? {
                let mut environment = Environment::new(&name, id);
                store.load(&mut environment)?;
                self.environments.insert(name, environment);
            }
        }
        Ok(found)
    }

    pub fn save(&mut self, store: &Store) -> Result<(), CoreError> {
        store.save(self)?;
        Ok(())
    }

    /// Cached value of a field, without triggering a fetch.
    pub fn peek(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Overwrite a field locally. `None` clears it.
    pub fn set_field(&mut self, field: &str, value: Option<String>) {
        self.hydrate(field, value);
    }

    /// Resolve a field: cache first, then at most one provider fetch.
    ///
    /// A fetch outcome of "not reported" is remembered so the field is
    /// not re-requested this process. Fetch and persistence errors are
    /// logged and the cached value (possibly none) is returned; the
    /// entity stays usable.
    pub async fn get(&mut self, field: &str, ctx: &FetchContext<'_>) -> Option<String> {
        if !ctx.refresh {
            if let Some(value) = self.fields.get(field) {
                return Some(value.clone());
            }
            if self.fetched.contains(field) {
                return None;
            }
        }

        let Some(provider) = ctx.provider else {
            return self.fields.get(field).cloned();
        };
        self.fetched.insert(field.to_owned());

        debug!(site = %self.name, field, "fetching site field");
        match provider.fetch_site_field(&self.name, field).await {
            Ok(value) => {
                self.hydrate(field, value);
                if let Err(error) = self.save(ctx.store) {
                    warn!(site = %self.name, %error, "failed to persist site");
                }
                self.fields.get(field).cloned()
            }
            Err(error) => {
                warn!(site = %self.name, field, %error, "site field fetch failed");
                self.fields.get(field).cloned()
            }
        }
    }

    /// Name, provider, and every set field, for display. Surrogate ids
    /// and environments are deliberately excluded.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("name".to_owned(), self.name.clone());
        map.insert("provider".to_owned(), self.provider.clone());
        for (field, value) in &self.fields {
            map.insert(field.clone(), value.clone());
        }
        map
    }

    /// Clone-away connection URL for the site's code repository.
    ///
    /// SSH-protocol repositories get the scheme prefixed
    /// unconditionally; anything else is passed through as the provider
    /// reported it.
    pub fn vcs_connection_url(&self) -> Option<String> {
        let url = self.fields.get("vcs_url")?;
        if self.fields.get("vcs_protocol").map(String::as_str) == Some("ssh") {
            Some(format!("ssh://{url}"))
        } else {
            Some(url.clone())
        }
    }

    pub fn environments(&self) -> impl Iterator<Item = &Environment> {
        self.environments.values()
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.get(name)
    }

    /// Register an environment under this site, picking up any cached
    /// row. The environment persists itself when its fields resolve.
    pub fn environment_add(&mut self, name: &str, store: &Store) -> Result<(), CoreError> {
        let site_id = self.ensure_id(store)?;
        let mut environment = Environment::new(name, site_id);
        store.load(&mut environment)?;
        self.environments.insert(name.to_owned(), environment);
        Ok(())
    }

    /// Drop an environment from the in-memory map. Cached rows are left
    /// alone; this layer never deletes entities.
    pub fn environment_remove(&mut self, name: &str) {
        self.environments.remove(name);
    }

    /// Resolve one deployment attribute of one environment, creating the
    /// environment record on first touch.
    pub async fn environment_field(
        &mut self,
        environment: &str,
        field: &str,
        ctx: &FetchContext<'_>,
    ) -> Result<Option<String>, CoreError> {
        let site_id = self.ensure_id(ctx.store)?;
        let site_name = self.name.clone();
        let slot = match self.environments.entry(environment.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut environment = Environment::new(environment, site_id);
                ctx.store.load(&mut environment)?;
                entry.insert(environment)
            }
        };
        Ok(slot.get(field, &site_name, ctx).await)
    }

    /// Resolve every declared attribute of one environment, then report
    /// them all for display.
    pub async fn environment_details(
        &mut self,
        environment: &str,
        ctx: &FetchContext<'_>,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        for field in ENVIRONMENT_FIELDS {
            self.environment_field(environment, field, ctx).await?;
        }
        Ok(self
            .environments
            .get(environment)
            .map(Environment::attributes)
            .unwrap_or_default())
    }

    fn ensure_id(&mut self, store: &Store) -> Result<i64, CoreError> {
        match self.id {
            Some(id) => Ok(id),
            None => store.save(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn vcs_connection_url_prefixes_ssh() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("vcs_url", Some("mysite@git.example:mysite.git".to_owned()));
        site.set_field("vcs_protocol", Some("ssh".to_owned()));
        assert_eq!(
            site.vcs_connection_url().as_deref(),
            Some("ssh://mysite@git.example:mysite.git")
        );
    }

    #[test]
    fn vcs_connection_url_prefixes_ssh_even_when_already_schemed() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("vcs_url", Some("ssh://git.example/mysite.git".to_owned()));
        site.set_field("vcs_protocol", Some("ssh".to_owned()));
        assert_eq!(
            site.vcs_connection_url().as_deref(),
            Some("ssh://ssh://git.example/mysite.git")
        );
    }

    #[test]
    fn vcs_connection_url_leaves_other_protocols_alone() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("vcs_url", Some("https://git.example/mysite.git".to_owned()));
        site.set_field("vcs_protocol", Some("git".to_owned()));
        assert_eq!(
            site.vcs_connection_url().as_deref(),
            Some("https://git.example/mysite.git")
        );
    }

    #[test]
    fn vcs_connection_url_without_url_is_none() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("vcs_protocol", Some("ssh".to_owned()));
        assert_eq!(site.vcs_connection_url(), None);
    }

    #[test]
    fn attributes_report_name_provider_and_set_fields_only() {
        let mut site = Site::new("pantheon", "mysite");
        site.set_id(42);
        site.set_field("uuid", Some("abc".to_owned()));
        let attributes = site.attributes();
        assert_eq!(attributes.get("name").map(String::as_str), Some("mysite"));
        assert_eq!(
            attributes.get("provider").map(String::as_str),
            Some("pantheon")
        );
        assert_eq!(attributes.get("uuid").map(String::as_str), Some("abc"));
        assert_eq!(attributes.len(), 3);
    }

    #[test]
    fn hydrate_ignores_undeclared_columns() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("no_such_column", Some("x".to_owned()));
        assert_eq!(site.peek("no_such_column"), None);
    }

    #[test]
    fn environment_add_and_remove_manage_the_map() {
        let store = Store::open_in_memory().unwrap();
        let mut site = Site::new("acquia", "mysite");
        site.environment_add("dev", &store).unwrap();
        assert!(site.environment("dev").is_some());

        site.environment_remove("dev");
        assert!(site.environment("dev").is_none());
        // the remove is in-memory only; a fresh read sees cached rows
        assert!(site.id().is_some());
    }

    #[test]
    fn set_field_none_clears_a_value() {
        let mut site = Site::new("acquia", "mysite");
        site.set_field("title", Some("My Site".to_owned()));
        site.set_field("title", None);
        assert_eq!(site.peek("title"), None);
    }
}
