//! Pantheon provider.
//!
//! Session-based variant. Login is a Drupal form dance: fetch the login
//! page anonymously, pull the one-time form token out of the markup, POST
//! the credentials with redirects disabled, then harvest the session
//! cookie from `set-cookie` and the user id from the redirect target.
//! Site listing is keyed by the logged-in user's id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::credentials::{auth_namespace, CredentialCache};
use crate::dispatch::{AuthOptions, Dispatcher, ResourceSpec};
use crate::error::{Error, LoginError};
use crate::provider::{Authenticator, Provider, RemoteSite};

const NAME: &str = "pantheon";
const LABEL: &str = "Pantheon";
const HOMEPAGE: &str = "https://www.getpantheon.com/";
const DEFAULT_ENDPOINT: &str = "https://terminus.getpantheon.com";

/// DOM id of the login form container on the login page.
const LOGIN_FORM_ID: &str = "atlas-login-form";
/// Fixed `form_id` value the login form expects.
const LOGIN_FORM_NAME: &str = "atlas_login_form";
/// Fixed `op` value the login form expects.
const LOGIN_OP: &str = "Login";
/// Session cookies start with this prefix.
const SESSION_COOKIE_PREFIX: &str = "SSESS";

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<input\b[^>]*>").expect("static regex"));
static NAME_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="([^"]*)""#).expect("static regex"));
static VALUE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"value="([^"]*)""#).expect("static regex"));

/// Wire shape of one entry in the keyed site map.
#[derive(Debug, Deserialize)]
struct SiteEntry {
    information: SiteInformation,
}

#[derive(Debug, Deserialize)]
struct SiteInformation {
    name: String,
    preferred_zone: Option<String>,
}

pub struct Pantheon {
    endpoint: Url,
    dispatcher: Arc<Dispatcher>,
    credentials: Arc<dyn CredentialCache>,
}

impl Pantheon {
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

    fn namespace(&self) -> String {
        auth_namespace(NAME)
    }
}

#[async_trait]
impl Provider for Pantheon {
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
        match self.credentials.get(&self.namespace(), "session") {
            Some(session) if !session.is_empty() => AuthOptions::Cookie(session),
            _ => AuthOptions::None,
        }
    }

    /// `GET /sites/user/{uuid}` -> map of remote id to site information.
    async fn list_sites(&self) -> Result<Vec<RemoteSite>, Error> {
        let user_uuid = self
            .credentials
            .get(&self.namespace(), "user_uuid")
            .ok_or_else(|| Error::NotAuthenticated {
                provider: NAME.into(),
            })?;

        let spec = ResourceSpec::get("sites").segment("user").segment(user_uuid);
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

        let entries: HashMap<String, SiteEntry> =
            serde_json::from_str(&response.body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: response.body.clone(),
            })?;

        let mut sites: Vec<RemoteSite> = entries
            .into_iter()
            .map(|(id, entry)| RemoteSite {
                id: Some(id),
                name: entry.information.name,
                realm: entry.information.preferred_zone,
            })
            .collect();
        // The wire format is an unordered map; keep output deterministic.
        sites.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(count = sites.len(), "listed Pantheon sites");
        Ok(sites)
    }

    /// Reuses the listing and selects the match; fields the listing does
    /// not carry are simply absent.
    async fn fetch_site_field(&self, site: &str, field: &str) -> Result<Option<String>, Error> {
        let sites = self.list_sites().await?;
        let Some(found) = sites.into_iter().find(|s| s.name == site) else {
            return Ok(None);
        };

        Ok(match field {
            "uuid" => found.id,
            "realm" => found.realm,
            _ => None,
        })
    }

    fn authenticator(&self) -> Option<&dyn Authenticator> {
        Some(self)
    }
}

#[async_trait]
impl Authenticator for Pantheon {
    async fn login(&self, email: &str, password: &SecretString) -> Result<(), LoginError> {
        // Anonymous fetch of the login page to obtain the one-time token.
        let page = self
            .dispatcher
            .dispatch(&AuthOptions::None, &self.endpoint, &ResourceSpec::get("login"))
            .await
            .map_err(|e| LoginError::EndpointUnavailable(e.to_string()))?;

        let form_build_id =
            extract_form_build_id(&page.body).ok_or(LoginError::FormUnavailable)?;
        debug!("retrieved login form token");

        let form = vec![
            ("email".to_owned(), email.to_owned()),
            ("password".to_owned(), password.expose_secret().to_owned()),
            ("form_build_id".to_owned(), form_build_id),
            ("form_id".to_owned(), LOGIN_FORM_NAME.to_owned()),
            ("op".to_owned(), LOGIN_OP.to_owned()),
        ];
        let spec = ResourceSpec::post("login").form(form).no_redirects();
        let response = self
            .dispatcher
            .dispatch(&self.auth_options(), &self.endpoint, &spec)
            .await
            .map_err(|e| LoginError::LoginFailed(e.to_string()))?;

        let session = session_from_headers(&response.headers).ok_or(LoginError::NoSession)?;

        let user_uuid = response
            .header("location")
            .and_then(user_uuid_from_location)
            .ok_or(LoginError::NoUserId)?;

        // All validation passed; replace any previous session wholesale.
        let namespace = self.namespace();
        self.credentials.clear(&namespace);
        self.credentials.set(&namespace, "user_uuid", &user_uuid);
        self.credentials.set(&namespace, "session", &session);
        self.credentials.set(&namespace, "email", email);

        debug!(user_uuid, "session established");
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        self.credentials
            .get(&self.namespace(), "session")
            .is_some_and(|session| !session.is_empty())
    }
}

/// Pull the `form_build_id` value out of the login page markup.
///
/// Scoped to the login form container so tokens from unrelated forms on
/// the page are never picked up.
fn extract_form_build_id(html: &str) -> Option<String> {
    let container = format!(r#"id="{LOGIN_FORM_ID}""#);
    let start = html.find(&container)?;
    let scope = &html[start..];
    let scope = match scope.find("</form>") {
        Some(end) => &scope[..end],
        None => scope,
    };

    for tag in INPUT_TAG.find_iter(scope) {
        let tag = tag.as_str();
        let name = NAME_ATTR
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        if name == Some("form_build_id") {
            return VALUE_ATTR
                .captures(tag)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned());
        }
    }
    None
}

/// Find the session token among the `set-cookie` headers.
///
/// Each header value splits on `"; "`; the winner is the last segment, in
/// header-then-segment order, that starts with the session prefix. The
/// whole `name=value` segment is the token.
fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let mut session = None;
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for cookie in raw.split("; ") {
            if cookie.starts_with(SESSION_COOKIE_PREFIX) {
                session = Some(cookie.to_owned());
            }
        }
    }
    session
}

/// The trailing path segment of the redirect target, iff it looks like a
/// hyphenated UUID (8-4-4-4-12 hex). A target ending in `/` has an empty
/// trailing segment and never matches.
fn user_uuid_from_location(location: &str) -> Option<String> {
    let tail = location.rsplit('/').next()?;
    (tail.len() == 36 && Uuid::try_parse(tail).is_ok()).then(|| tail.to_owned())
}
