#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use patchbay_api::{AuthOptions, Error, Provider, RemoteSite};
use patchbay_core::{
    CoreError, Environment, FetchContext, Inventory, Record, Site, Store, SITE_FIELDS,
};
use pretty_assertions::assert_eq;
use url::Url;

/// In-memory provider that counts field fetches.
struct FakeProvider {
    endpoint: Url,
    sites: Vec<RemoteSite>,
    site_fields: HashMap<(String, String), String>,
    environment_fields: HashMap<(String, String, String), String>,
    failing: bool,
    fetches: AtomicUsize,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            endpoint: Url::parse("https://fake.example/api").unwrap(),
            sites: Vec::new(),
            site_fields: HashMap::new(),
            environment_fields: HashMap::new(),
            failing: false,
            fetches: AtomicUsize::new(0),
        }
    }

    fn with_sites(mut self, sites: Vec<RemoteSite>) -> Self {
        self.sites = sites;
        self
    }

    fn with_site_field(mut self, site: &str, field: &str, value: &str) -> Self {
        self.site_fields
            .insert((site.to_owned(), field.to_owned()), value.to_owned());
        self
    }

    fn with_environment_field(
        mut self,
        site: &str,
        environment: &str,
        field: &str,
        value: &str,
    ) -> Self {
        self.environment_fields.insert(
            (site.to_owned(), environment.to_owned(), field.to_owned()),
            value.to_owned(),
        );
        self
    }

    fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn label(&self) -> &str {
        "Fake Hosting"
    }

    fn homepage(&self) -> &str {
        "https://fake.example"
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn auth_options(&self) -> AuthOptions {
        AuthOptions::None
    }

    async fn list_sites(&self) -> Result<Vec<RemoteSite>, Error> {
        if self.failing {
            return Err(Error::Api {
                provider: "fake".to_owned(),
                status: 500,
            });
        }
        Ok(self.sites.clone())
    }

    async fn fetch_site_field(&self, site: &str, field: &str) -> Result<Option<String>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Api {
                provider: "fake".to_owned(),
                status: 500,
            });
        }
        Ok(self
            .site_fields
            .get(&(site.to_owned(), field.to_owned()))
            .cloned())
    }

    async fn fetch_environment_field(
        &self,
        site: &str,
        environment: &str,
        field: &str,
    ) -> Result<Option<String>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .environment_fields
            .get(&(site.to_owned(), environment.to_owned(), field.to_owned()))
            .cloned())
    }
}

fn inventory_with(fake: &Arc<FakeProvider>) -> Inventory {
    let mut inventory = Inventory::new(Store::open_in_memory().unwrap());
    inventory.register(Arc::clone(fake) as Arc<dyn Provider>);
    inventory
}

#[tokio::test]
async fn sync_sites_reconciles_the_listing_into_the_cache() {
    let fake = Arc::new(FakeProvider::new().with_sites(vec![
        RemoteSite {
            id: Some("uuid-beta".to_owned()),
            name: "beta".to_owned(),
            realm: Some("prod".to_owned()),
        },
        RemoteSite {
            id: None,
            name: "alpha".to_owned(),
            realm: None,
        },
    ]));
    let mut inventory = inventory_with(&fake);

    let names = inventory.sync_sites("fake").await.unwrap();
    assert_eq!(names, vec!["alpha", "beta"]);

    let site = inventory.site("fake", "beta").unwrap();
    assert_eq!(site.peek("uuid"), Some("uuid-beta"));
    assert_eq!(site.peek("realm"), Some("prod"));

    let mut reloaded = Site::new("fake", "beta");
    assert!(inventory.store().load(&mut reloaded).unwrap());
    assert_eq!(reloaded.peek("uuid"), Some("uuid-beta"));
}

#[tokio::test]
async fn sync_sites_surfaces_listing_errors() {
    let fake = Arc::new(FakeProvider::new().failing());
    let mut inventory = inventory_with(&fake);
    let result = inventory.sync_sites("fake").await;
    assert!(matches!(result, Err(CoreError::Api(_))));
}

#[tokio::test]
async fn site_field_is_fetched_at_most_once() {
    let fake = Arc::new(FakeProvider::new().with_site_field("alpha", "title", "Alpha Site"));
    let mut inventory = inventory_with(&fake);

    let value = inventory.site_field("fake", "alpha", "title").await.unwrap();
    assert_eq!(value.as_deref(), Some("Alpha Site"));
    assert_eq!(fake.fetches(), 1);

    let again = inventory.site_field("fake", "alpha", "title").await.unwrap();
    assert_eq!(again.as_deref(), Some("Alpha Site"));
    assert_eq!(fake.fetches(), 1);
}

#[tokio::test]
async fn missing_remote_field_is_attempted_only_once() {
    let fake = Arc::new(FakeProvider::new());
    let mut inventory = inventory_with(&fake);

    assert_eq!(
        inventory.site_field("fake", "alpha", "title").await.unwrap(),
        None
    );
    assert_eq!(
        inventory.site_field("fake", "alpha", "title").await.unwrap(),
        None
    );
    assert_eq!(fake.fetches(), 1);
}

#[tokio::test]
async fn refresh_replaces_a_cached_value() {
    let store = Store::open_in_memory().unwrap();
    let mut seeded = Site::new("fake", "alpha");
    seeded.set_field("title", Some("Stale".to_owned()));
    seeded.save(&store).unwrap();

    let fake = Arc::new(FakeProvider::new().with_site_field("alpha", "title", "Fresh"));
    let mut inventory = Inventory::new(store).with_refresh(true);
    inventory.register(Arc::clone(&fake) as Arc<dyn Provider>);

    let value = inventory.site_field("fake", "alpha", "title").await.unwrap();
    assert_eq!(value.as_deref(), Some("Fresh"));
    assert_eq!(fake.fetches(), 1);
}

#[tokio::test]
async fn refresh_forces_a_second_fetch() {
    let store = Store::open_in_memory().unwrap();
    let fake = Arc::new(FakeProvider::new().with_site_field("alpha", "title", "Alpha Site"));
    let mut site = Site::new("fake", "alpha");

    let ctx = FetchContext {
        store: &store,
        provider: Some(fake.as_ref()),
        refresh: false,
    };
    assert_eq!(site.get("title", &ctx).await.as_deref(), Some("Alpha Site"));
    assert_eq!(site.get("title", &ctx).await.as_deref(), Some("Alpha Site"));
    assert_eq!(fake.fetches(), 1);

    let ctx = FetchContext {
        store: &store,
        provider: Some(fake.as_ref()),
        refresh: true,
    };
    assert_eq!(site.get("title", &ctx).await.as_deref(), Some("Alpha Site"));
    assert_eq!(fake.fetches(), 2);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_the_cached_value() {
    let store = Store::open_in_memory().unwrap();
    let mut seeded = Site::new("fake", "alpha");
    seeded.set_field("title", Some("Stale".to_owned()));
    seeded.save(&store).unwrap();

    let fake = Arc::new(FakeProvider::new().failing());
    let mut inventory = Inventory::new(store).with_refresh(true);
    inventory.register(Arc::clone(&fake) as Arc<dyn Provider>);

    let value = inventory.site_field("fake", "alpha", "title").await.unwrap();
    assert_eq!(value.as_deref(), Some("Stale"));
}

#[tokio::test]
async fn site_details_resolve_every_declared_field() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_site_field("alpha", "title", "Alpha Site")
            .with_site_field("alpha", "realm", "prod"),
    );
    let mut inventory = inventory_with(&fake);

    let details = inventory.site_details("fake", "alpha").await.unwrap();
    assert_eq!(details.get("name").map(String::as_str), Some("alpha"));
    assert_eq!(details.get("provider").map(String::as_str), Some("fake"));
    assert_eq!(details.get("title").map(String::as_str), Some("Alpha Site"));
    assert_eq!(details.get("uuid"), None);
    assert_eq!(fake.fetches(), SITE_FIELDS.len());

    // a second pass costs nothing
    inventory.site_details("fake", "alpha").await.unwrap();
    assert_eq!(fake.fetches(), SITE_FIELDS.len());
}

#[tokio::test]
async fn vcs_url_is_assembled_from_fetched_fields() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_site_field("alpha", "vcs_url", "alpha@git.example:alpha.git")
            .with_site_field("alpha", "vcs_protocol", "ssh"),
    );
    let mut inventory = inventory_with(&fake);

    let url = inventory.site_vcs_url("fake", "alpha").await.unwrap();
    assert_eq!(url.as_deref(), Some("ssh://alpha@git.example:alpha.git"));
}

#[tokio::test]
async fn environment_details_create_and_persist_the_record() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_environment_field("alpha", "dev", "branch", "develop")
            .with_environment_field("alpha", "dev", "host", "dev.alpha.example"),
    );
    let mut inventory = inventory_with(&fake);

    let details = inventory
        .environment_details("fake", "alpha", "dev")
        .await
        .unwrap();
    assert_eq!(details.get("name").map(String::as_str), Some("dev"));
    assert_eq!(details.get("branch").map(String::as_str), Some("develop"));
    assert_eq!(
        details.get("host").map(String::as_str),
        Some("dev.alpha.example")
    );

    let site_id = inventory.site("fake", "alpha").unwrap().id().unwrap();
    let mut reloaded = Environment::new("dev", site_id);
    assert!(inventory.store().load(&mut reloaded).unwrap());
    assert_eq!(reloaded.peek("branch"), Some("develop"));
}

#[tokio::test]
async fn unknown_provider_is_an_error() {
    let fake = Arc::new(FakeProvider::new());
    let mut inventory = inventory_with(&fake);
    let result = inventory.site_field("nope", "alpha", "title").await;
    assert!(matches!(result, Err(CoreError::UnknownProvider(name)) if name == "nope"));
}

#[tokio::test]
async fn reading_a_site_restores_its_cached_environments() {
    let store = Store::open_in_memory().unwrap();
    let mut seeded = Site::new("fake", "alpha");
    let site_id = store.save(&mut seeded).unwrap();
    let mut env = Environment::new("live", site_id);
    env.set_field("branch", Some("master".to_owned()));
    store.save(&mut env).unwrap();

    let fake = Arc::new(FakeProvider::new());
    let mut inventory = Inventory::new(store);
    inventory.register(Arc::clone(&fake) as Arc<dyn Provider>);

    let site = inventory.site("fake", "alpha").unwrap();
    let environment = site.environment("live").unwrap();
    assert_eq!(environment.peek("branch"), Some("master"));
}
