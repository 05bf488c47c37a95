use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::model::FetchContext;
use crate::record::Record;

/// Declared deployment attributes of an environment.
pub const ENVIRONMENT_FIELDS: &[&str] = &["branch", "host", "unix_username"];

/// One deployment target of a site (dev, test, live, ...), scoped by the
/// owning site's surrogate id so identically-named environments on
/// different sites never collide.
pub struct Environment {
    name: String,
    site_id: i64,
    id: Option<i64>,
    fields: BTreeMap<String, String>,
    fetched: HashSet<String>,
}

impl Record for Environment {
    const TABLE: &'static str = "environments";
    const SCOPE_FIELD: &'static str = "site_id";

    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> String {
        self.site_id.to_string()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns() -> &'static [&'static str] {
        ENVIRONMENT_FIELDS
    }

    fn values(&self) -> Vec<Option<String>> {
        ENVIRONMENT_FIELDS
            .iter()
            .map(|field| self.fields.get(*field).cloned())
            .collect()
    }

    fn hydrate(&mut self, column: &str, value: Option<String>) {
        if !ENVIRONMENT_FIELDS.contains(&column) {
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

impl Environment {
    pub fn new(name: &str, site_id: i64) -> Self {
        Self {
            name: name.to_owned(),
            site_id,
            id: None,
            fields: BTreeMap::new(),
            fetched: HashSet::new(),
        }
    }

    pub fn site_id(&self) -> i64 {
        self.site_id
    }

    /// Cached value of an attribute, without triggering a fetch.
    pub fn peek(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set_field(&mut self, field: &str, value: Option<String>) {
        self.hydrate(field, value);
    }

    /// Resolve an attribute: cache first, then at most one provider
    /// fetch. Same error posture as [`Site::get`](crate::Site::get).
    ///
    /// `site` is the owning site's name, which the provider needs to
    /// address the environment remotely.
    pub async fn get(&mut self, field: &str, site: &str, ctx: &FetchContext<'_>) -> Option<String> {
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

        debug!(site, environment = %self.name, field, "fetching environment field");
        match provider
            .fetch_environment_field(site, &self.name, field)
            .await
        {
            Ok(value) => {
                self.hydrate(field, value);
                if let Err(error) = ctx.store.save(self) {
                    warn!(site, environment = %self.name, %error, "failed to persist environment");
                }
                self.fields.get(field).cloned()
            }
            Err(error) => {
                warn!(site, environment = %self.name, field, %error, "environment field fetch failed");
                self.fields.get(field).cloned()
            }
        }
    }

    /// Name plus every set attribute, for display.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("name".to_owned(), self.name.clone());
        for (field, value) in &self.fields {
            map.insert(field.clone(), value.clone());
        }
        map
    }
}
