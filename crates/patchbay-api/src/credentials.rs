//! Credential cache contract.
//!
//! Providers read per-request auth parameters from -- and the login flow
//! writes session state to -- a [`CredentialCache`]. Only the
//! get/set/clear contract lives here; where values actually rest (OS
//! keyring, in-memory map) is a backend concern. Backends are expected to
//! treat storage failures as non-fatal: log and carry on, never panic.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

/// Keys a provider namespace may hold. `clear` removes exactly this set.
pub const CREDENTIAL_KEYS: &[&str] = &["email", "password", "session", "user_uuid"];

/// The per-provider namespace credentials are scoped by.
pub fn auth_namespace(provider: &str) -> String {
    format!("auth-{provider}")
}

/// Get/set/clear contract for credentials at rest.
///
/// `set` and `clear` are infallible by contract: implementations swallow
/// and log backend failures so that a locked or absent keyring degrades
/// to "not logged in" rather than an error.
pub trait CredentialCache: Send + Sync {
    /// Look up one value; `None` when absent or the backend is unavailable.
    fn get(&self, namespace: &str, key: &str) -> Option<String>;

    /// Store one value, overwriting any previous one.
    fn set(&self, namespace: &str, key: &str, value: &str);

    /// Remove every known credential key in the namespace.
    fn clear(&self, namespace: &str);
}

/// In-memory credential cache.
///
/// Used by the test suites and by embedders that manage credential
/// lifetime themselves. Values live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialCache for MemoryCredentials {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(&(namespace.to_owned(), key.to_owned())).cloned(),
            Err(_) => {
                warn!(namespace, key, "credential cache lock poisoned");
                None
            }
        }
    }

    fn set(&self, namespace: &str, key: &str, value: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert((namespace.to_owned(), key.to_owned()), value.to_owned());
            }
            Err(_) => warn!(namespace, key, "credential cache lock poisoned"),
        }
    }

    fn clear(&self, namespace: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.retain(|(ns, _), _| ns != namespace);
            }
            Err(_) => warn!(namespace, "credential cache lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_round_trip() {
        let cache = MemoryCredentials::new();
        cache.set("auth-pantheon", "session", "SSESSabc=xyz");
        assert_eq!(
            cache.get("auth-pantheon", "session").as_deref(),
            Some("SSESSabc=xyz")
        );
        assert_eq!(cache.get("auth-acquia", "session"), None);
    }

    #[test]
    fn clear_is_namespace_scoped() {
        let cache = MemoryCredentials::new();
        cache.set("auth-pantheon", "session", "a");
        cache.set("auth-acquia", "email", "b@example.com");
        cache.clear("auth-pantheon");
        assert_eq!(cache.get("auth-pantheon", "session"), None);
        assert_eq!(cache.get("auth-acquia", "email").as_deref(), Some("b@example.com"));
    }
}
