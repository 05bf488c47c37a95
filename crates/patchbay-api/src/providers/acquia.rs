//! Acquia Cloud API v1 provider.
//!
//! Static-credential variant: HTTP basic auth from cached email/password,
//! no interactive login flow. The list endpoint returns a flat array of
//! "realm:name" strings; per-site details come from /sites/{realm}:{name}.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::{auth_namespace, CredentialCache};
use crate::dispatch::{AuthOptions, Dispatcher, ResourceSpec};
use crate::error::Error;
use crate::provider::{Provider, RemoteSite};

const NAME: &str = "acquia";
const LABEL: &str = "Acquia";
const HOMEPAGE: &str = "http://www.acquia.com/";
const DEFAULT_ENDPOINT: &str = "https://cloudapi.acquia.com/v1";

pub struct Acquia {
    endpoint: Url,
    dispatcher: Arc<Dispatcher>,
    credentials: Arc<dyn CredentialCache>,
}

impl Acquia {
    pub fn new(dispatcher: Arc<Dispatcher>, credentials: Arc<dyn CredentialCache>) -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            dispatcher,
            credentials,
        }
    }

    /// Point the provider at a different endpoint (test servers).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Realm of a site, resolved through the listing.
    async fn realm_of(&self, site: &str) -> Result<Option<String>, Error> {
        let sites = self.list_sites().await?;
        Ok(sites
            .into_iter()
            .find(|s| s.name == site)
            .and_then(|s| s.realm))
    }

    /// Detail document for one site, or `None` when the site is unknown.
    async fn site_detail(&self, site: &str) -> Result<Option<Value>, Error> {
        let Some(realm) = self.realm_of(site).await? else {
            return Ok(None);
        };

        let spec = ResourceSpec::get("sites").segment(format!("{realm}:{site}"));
        let response = self
            .dispatcher
            .dispatch(&self.auth_options(), &self.endpoint, &spec)
            .await?;

        if response.status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status.is_success() {
            return Err(Error::Api {
                provider: NAME.into(),
                status: response.status.as_u16(),
            });
        }

        let detail: Value =
            serde_json::from_str(&response.body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: response.body.clone(),
            })?;
        Ok(Some(detail))
    }
}

#[async_trait]
impl Provider for Acquia {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn homepage(&self) -> &str {
        HOMEPAGE
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn auth_options(&self) -> AuthOptions {
        let namespace = auth_namespace(NAME);
        let email = self.credentials.get(&namespace, "email");
        let password = self.credentials.get(&namespace, "password");
        match (email, password) {
            (Some(email), Some(password)) => AuthOptions::Basic {
                email,
                password: SecretString::from(password),
            },
            _ => AuthOptions::None,
        }
    }

    /// `GET /sites` -> JSON array of `"realm:name"` strings.
    async fn list_sites(&self) -> Result<Vec<RemoteSite>, Error> {
        let spec = ResourceSpec::get("sites");
        let response = self
            .dispatcher
            .dispatch(&self.auth_options(), &self.endpoint, &spec)
            .await?;

        if !response.status.is_success() {
            return Err(Error::Api {
                provider: NAME.into(),
                status: response.status.as_u16(),
            });
        }

        let entries: Vec<String> =
            serde_json::from_str(&response.body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: response.body.clone(),
            })?;

        let mut sites = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some((realm, name)) = entry.split_once(':') else {
                warn!(entry, "skipping malformed site entry");
                continue;
            };
            sites.push(RemoteSite {
                id: None,
                name: name.to_owned(),
                realm: Some(realm.to_owned()),
            });
        }

        debug!(count = sites.len(), "listed Acquia sites");
        Ok(sites)
    }

    async fn fetch_site_field(&self, site: &str, field: &str) -> Result<Option<String>, Error> {
        // Fields present in the listing don't need a detail request.
        if field == "realm" {
            return self.realm_of(site).await;
        }

        let Some(detail) = self.site_detail(site).await? else {
            return Ok(None);
        };

        Ok(detail.get(field).and_then(json_scalar))
    }
}

/// Scalar JSON values become field strings; anything else is absent.
fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalar_covers_wire_types() {
        assert_eq!(json_scalar(&Value::from("git")).as_deref(), Some("git"));
        assert_eq!(json_scalar(&Value::from(22)).as_deref(), Some("22"));
        assert_eq!(json_scalar(&Value::Null), None);
    }
}
