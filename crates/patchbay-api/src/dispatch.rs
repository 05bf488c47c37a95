//! Request dispatcher.
//!
//! Composes outbound API calls from an endpoint, a resource spec, and the
//! provider's auth parameters, then executes them exactly once. No parsing,
//! no retries -- the raw response (status, headers, body) goes back to the
//! caller to interpret.

use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Per-request auth parameters, computed by a provider from its cached
/// credentials. `None` means the request goes out unauthenticated (and
/// will fail remotely for protected resources).
#[derive(Debug)]
pub enum AuthOptions {
    None,
    /// HTTP basic auth (static-credential providers).
    Basic {
        email: String,
        password: SecretString,
    },
    /// A raw session cookie (session-based providers).
    Cookie(String),
}

/// What to call: method, resource path, extra path segments, and the
/// transport overrides a caller may need (form body, redirect handling).
#[derive(Debug)]
pub struct ResourceSpec {
    pub method: Method,
    pub resource: String,
    pub segments: Vec<String>,
    pub form: Option<Vec<(String, String)>>,
    pub follow_redirects: bool,
}

impl ResourceSpec {
    pub fn get(resource: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            resource: resource.into(),
            segments: Vec::new(),
            form: None,
            follow_redirects: true,
        }
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(resource)
        }
    }

    /// Append an extra path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Attach a form-encoded body.
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.form = Some(fields);
        self
    }

    /// Do not follow redirects; the caller inspects `Location` itself.
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Full URL for this spec under the given endpoint.
    pub(crate) fn url(&self, endpoint: &Url) -> Result<Url, Error> {
        let mut full = format!(
            "{}/{}",
            endpoint.as_str().trim_end_matches('/'),
            self.resource.trim_matches('/')
        );
        for segment in &self.segments {
            full.push('/');
            full.push_str(segment);
        }
        Ok(Url::parse(&full)?)
    }
}

/// Raw response handed back to providers: they interpret status and shape.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// First value of a header, as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Executes provider API calls.
///
/// Owns two `reqwest::Client`s (redirects followed / not followed) because
/// reqwest fixes the redirect policy at client construction. One request
/// in flight per call; transport failures propagate as [`Error::Transport`]
/// for the caller to abort or continue.
pub struct Dispatcher {
    http: reqwest::Client,
    http_no_redirect: reqwest::Client,
}

impl Dispatcher {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client(true)?,
            http_no_redirect: transport.build_client(false)?,
        })
    }

    /// Compose and execute one call.
    pub async fn dispatch(
        &self,
        auth: &AuthOptions,
        endpoint: &Url,
        spec: &ResourceSpec,
    ) -> Result<RawResponse, Error> {
        let url = spec.url(endpoint)?;
        debug!(method = %spec.method, %url, "dispatching request");

        let client = if spec.follow_redirects {
            &self.http
        } else {
            &self.http_no_redirect
        };

        let mut request = client.request(spec.method.clone(), url);

        match auth {
            AuthOptions::None => {}
            AuthOptions::Basic { email, password } => {
                request = request.basic_auth(email, Some(password.expose_secret()));
            }
            AuthOptions::Cookie(cookie) => {
                request = request.header(header::COOKIE, cookie);
            }
        }

        if let Some(ref fields) = spec.form {
            request = request.form(fields);
        }

        let response = request.send().await.map_err(Error::Transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(Error::Transport)?;

        debug!(%status, bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
