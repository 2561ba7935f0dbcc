//! Cookie-backed storage — a shared jar modeling the browser cookie
//! semantics the engine depends on: per-name values, expiry, and write-time
//! attribute enforcement (secure origin, domain scope, SameSite rules).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{BackendKind, StorageBackend};
use crate::config::{SameSite, TrackerConfig};

/// The origin the current page was served from. Fixed for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    pub host: String,
    /// Whether the page came over a secure transport.
    pub secure: bool,
}

impl PageOrigin {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
        }
    }
}

impl Default for PageOrigin {
    fn default() -> Self {
        Self::new("localhost", true)
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at_ms: i64,
}

/// Shared page-level cookie jar. Every tracker instance on a page holds a
/// clone of the same jar, so the jar is the sole arbiter of the durable
/// value when instances race (last write wins).
#[derive(Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<HashMap<String, StoredCookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cookie value, dropping it if its lifetime has elapsed.
    pub fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now().timestamp_millis();
        let mut jar = self.inner.lock().expect("cookie jar lock poisoned");
        match jar.get(name) {
            Some(cookie) if cookie.expires_at_ms > now => Some(cookie.value.clone()),
            Some(_) => {
                jar.remove(name);
                None
            }
            None => None,
        }
    }

    fn set(&self, name: &str, value: &str, expires_at_ms: i64) {
        let mut jar = self.inner.lock().expect("cookie jar lock poisoned");
        jar.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires_at_ms,
            },
        );
    }

    fn delete(&self, name: &str) {
        let mut jar = self.inner.lock().expect("cookie jar lock poisoned");
        jar.remove(name);
    }

    /// Names of all unexpired cookies. Useful for hosts mirroring the jar
    /// into a real `document.cookie` and for tests.
    pub fn names(&self) -> Vec<String> {
        let now = Utc::now().timestamp_millis();
        let jar = self.inner.lock().expect("cookie jar lock poisoned");
        let mut names: Vec<String> = jar
            .iter()
            .filter(|(_, c)| c.expires_at_ms > now)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Cookie variant of [`StorageBackend`]. Writes are attribute-checked the
/// way a browser would check them; a refused write is an expected outcome
/// reported as `false`, never an error.
pub struct CookieStorage {
    jar: CookieJar,
    origin: PageOrigin,
    domain: Option<String>,
    secure: bool,
    same_site: SameSite,
}

impl CookieStorage {
    pub fn new(jar: CookieJar, origin: PageOrigin, config: &TrackerConfig) -> Self {
        Self {
            jar,
            origin,
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
        }
    }

    fn write_allowed(&self) -> bool {
        if self.secure && !self.origin.secure {
            tracing::debug!(
                host = %self.origin.host,
                "secure cookie refused on insecure origin"
            );
            return false;
        }

        // Browsers reject SameSite=None cookies without the Secure attribute.
        if self.same_site == SameSite::None && !self.secure {
            tracing::debug!("SameSite=None cookie refused without Secure");
            return false;
        }

        // A page may only set cookies for its own host or a parent domain.
        if let Some(domain) = &self.domain {
            let domain = domain.trim_start_matches('.');
            let matches_scope = self.origin.host == domain
                || self.origin.host.ends_with(&format!(".{domain}"));
            if !matches_scope {
                tracing::debug!(
                    host = %self.origin.host,
                    domain = %domain,
                    "cookie refused for foreign domain"
                );
                return false;
            }
        }

        true
    }
}

impl StorageBackend for CookieStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.jar.get(key)
    }

    fn write(&self, key: &str, value: &str, ttl_secs: i64) -> bool {
        if !self.write_allowed() {
            return false;
        }
        let expires_at_ms = Utc::now().timestamp_millis() + ttl_secs * 1000;
        self.jar.set(key, value, expires_at_ms);
        true
    }

    fn remove(&self, key: &str) {
        self.jar.delete(key);
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Cookie
    }
}
